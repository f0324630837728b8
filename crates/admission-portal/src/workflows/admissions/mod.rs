//! Applicant admission wizard, submission, and staff review.
//!
//! An application is created lazily on first access, filled in over three ordered steps
//! (personal information, program information, documents), submitted once every step is
//! complete, and then moved by staff through review to a final decision.

pub mod documents;
pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod review;
pub mod router;
pub mod service;
pub mod steps;
pub mod views;

#[cfg(test)]
mod tests;

pub use documents::{
    generated_name, validate_upload, AcceptedUpload, DocumentError, DocumentUpload,
    StorageCollaborator, StorageError,
};
pub use domain::{
    AdmissionApplication, ApplicationDocuments, ApplicationId, ApplicationStatus, DocumentRef,
    DocumentSlot, Gender, PersonalDetails, ProgramChoice, ProgramDetails, RegistrationNumber,
    StoredDocument,
};
pub use lifecycle::{ReviewDecision, StepError, StepRecord, TransitionRejected, WizardStep};
pub use repository::ApplicationRepository;
pub use review::{ApplicationQuery, BulkAction, ReviewService};
pub use router::{admission_error_response, admissions_router, AdmissionsState};
pub use service::{AdmissionService, AdmissionServiceError, ApplicationUpdate};
pub use steps::{
    AdmissionPolicy, PersonalInfoForm, ProgramInfoForm, StepGuard, StepValidationError,
};
pub use views::{ApplicationDetail, ApplicationSummary, DashboardView};
