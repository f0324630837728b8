use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::workflows::accounts::UserId;

/// Identifier wrapper for admission applications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ApplicationId(pub Uuid);

impl ApplicationId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Human-facing application number, `<year>-<8 uppercase hex>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegistrationNumber(String);

impl RegistrationNumber {
    pub fn generate(now: DateTime<Utc>) -> Self {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(8)
            .collect::<String>()
            .to_uppercase();
        Self(format!("{}-{suffix}", now.year()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Workflow status of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::Draft,
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::UnderReview => "under_review",
            ApplicationStatus::Approved => "approved",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "Draft",
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::UnderReview => "Under Review",
            ApplicationStatus::Approved => "Approved",
            ApplicationStatus::Rejected => "Rejected",
        }
    }

    /// Submitted and under-review applications may receive a decision.
    pub const fn is_reviewable(self) -> bool {
        matches!(
            self,
            ApplicationStatus::Submitted | ApplicationStatus::UnderReview
        )
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    #[serde(rename = "M")]
    Male,
    #[serde(rename = "F")]
    Female,
    #[serde(rename = "O")]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramChoice {
    Undergraduate,
    Postgraduate,
    Diploma,
    Certificate,
}

impl ProgramChoice {
    pub const fn label(self) -> &'static str {
        match self {
            ProgramChoice::Undergraduate => "undergraduate",
            ProgramChoice::Postgraduate => "postgraduate",
            ProgramChoice::Diploma => "diploma",
            ProgramChoice::Certificate => "certificate",
        }
    }
}

/// Validated output of the personal-information step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub nationality: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: Option<String>,
}

/// Validated output of the program-information step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramDetails {
    pub program_choice: ProgramChoice,
    pub course_of_study: String,
}

/// The five document slots an application carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSlot {
    PassportPhoto,
    OlevelResult,
    BirthCertificate,
    AdditionalDocument1,
    AdditionalDocument2,
}

impl DocumentSlot {
    pub const ALL: [DocumentSlot; 5] = [
        DocumentSlot::PassportPhoto,
        DocumentSlot::OlevelResult,
        DocumentSlot::BirthCertificate,
        DocumentSlot::AdditionalDocument1,
        DocumentSlot::AdditionalDocument2,
    ];

    /// Slots that gate the documents step.
    pub const REQUIRED: [DocumentSlot; 3] = [
        DocumentSlot::PassportPhoto,
        DocumentSlot::OlevelResult,
        DocumentSlot::BirthCertificate,
    ];

    pub const fn is_required(self) -> bool {
        matches!(
            self,
            DocumentSlot::PassportPhoto | DocumentSlot::OlevelResult | DocumentSlot::BirthCertificate
        )
    }

    pub const fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            DocumentSlot::PassportPhoto => &["jpg", "jpeg", "png"],
            DocumentSlot::OlevelResult | DocumentSlot::BirthCertificate => {
                &["pdf", "jpg", "jpeg", "png"]
            }
            DocumentSlot::AdditionalDocument1 | DocumentSlot::AdditionalDocument2 => {
                &["pdf", "doc", "docx"]
            }
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            DocumentSlot::PassportPhoto => "Passport photo",
            DocumentSlot::OlevelResult => "O'Level result",
            DocumentSlot::BirthCertificate => "Birth certificate",
            DocumentSlot::AdditionalDocument1 => "Additional document 1",
            DocumentSlot::AdditionalDocument2 => "Additional document 2",
        }
    }

    pub const fn key(self) -> &'static str {
        match self {
            DocumentSlot::PassportPhoto => "passport_photo",
            DocumentSlot::OlevelResult => "olevel_result",
            DocumentSlot::BirthCertificate => "birth_certificate",
            DocumentSlot::AdditionalDocument1 => "additional_document_1",
            DocumentSlot::AdditionalDocument2 => "additional_document_2",
        }
    }
}

/// Storage key returned by the storage collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef(pub String);

/// Metadata kept for a persisted upload; the client-supplied file name is discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDocument {
    pub reference: DocumentRef,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationDocuments {
    pub passport_photo: Option<StoredDocument>,
    pub olevel_result: Option<StoredDocument>,
    pub birth_certificate: Option<StoredDocument>,
    pub additional_document_1: Option<StoredDocument>,
    pub additional_document_2: Option<StoredDocument>,
}

impl ApplicationDocuments {
    pub fn get(&self, slot: DocumentSlot) -> Option<&StoredDocument> {
        match slot {
            DocumentSlot::PassportPhoto => self.passport_photo.as_ref(),
            DocumentSlot::OlevelResult => self.olevel_result.as_ref(),
            DocumentSlot::BirthCertificate => self.birth_certificate.as_ref(),
            DocumentSlot::AdditionalDocument1 => self.additional_document_1.as_ref(),
            DocumentSlot::AdditionalDocument2 => self.additional_document_2.as_ref(),
        }
    }

    /// Put a document in its slot, handing back whatever it displaced.
    pub fn replace(&mut self, slot: DocumentSlot, document: StoredDocument) -> Option<StoredDocument> {
        let target = match slot {
            DocumentSlot::PassportPhoto => &mut self.passport_photo,
            DocumentSlot::OlevelResult => &mut self.olevel_result,
            DocumentSlot::BirthCertificate => &mut self.birth_certificate,
            DocumentSlot::AdditionalDocument1 => &mut self.additional_document_1,
            DocumentSlot::AdditionalDocument2 => &mut self.additional_document_2,
        };
        target.replace(document)
    }

    pub fn has_required(&self) -> bool {
        DocumentSlot::REQUIRED
            .iter()
            .all(|slot| self.get(*slot).is_some())
    }

    pub fn missing_required(&self) -> Vec<DocumentSlot> {
        DocumentSlot::REQUIRED
            .into_iter()
            .filter(|slot| self.get(*slot).is_none())
            .collect()
    }
}

/// One applicant's admission application.
///
/// Workflow fields are crate-private: status, flags, and review metadata only change through
/// the transition methods in `lifecycle`, and the registration number is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdmissionApplication {
    pub(crate) id: ApplicationId,
    pub(crate) user_id: UserId,
    pub(crate) registration_number: RegistrationNumber,
    pub(crate) status: ApplicationStatus,
    pub(crate) personal: Option<PersonalDetails>,
    pub(crate) program: Option<ProgramDetails>,
    pub(crate) documents: ApplicationDocuments,
    pub(crate) personal_info_completed: bool,
    pub(crate) program_info_completed: bool,
    pub(crate) documents_uploaded: bool,
    pub(crate) reviewed_by: Option<UserId>,
    pub(crate) review_notes: String,
    pub(crate) reviewed_at: Option<DateTime<Utc>>,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    pub(crate) submitted_at: Option<DateTime<Utc>>,
}

impl AdmissionApplication {
    /// A fresh draft with no data and every completion flag down.
    pub fn draft(user_id: UserId, registration_number: RegistrationNumber, now: DateTime<Utc>) -> Self {
        Self {
            id: ApplicationId::random(),
            user_id,
            registration_number,
            status: ApplicationStatus::Draft,
            personal: None,
            program: None,
            documents: ApplicationDocuments::default(),
            personal_info_completed: false,
            program_info_completed: false,
            documents_uploaded: false,
            reviewed_by: None,
            review_notes: String::new(),
            reviewed_at: None,
            created_at: now,
            updated_at: now,
            submitted_at: None,
        }
    }

    pub fn id(&self) -> ApplicationId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn registration_number(&self) -> &RegistrationNumber {
        &self.registration_number
    }

    pub fn status(&self) -> ApplicationStatus {
        self.status
    }

    pub fn personal(&self) -> Option<&PersonalDetails> {
        self.personal.as_ref()
    }

    pub fn program(&self) -> Option<&ProgramDetails> {
        self.program.as_ref()
    }

    pub fn program_choice(&self) -> Option<ProgramChoice> {
        self.program.as_ref().map(|program| program.program_choice)
    }

    pub fn documents(&self) -> &ApplicationDocuments {
        &self.documents
    }

    pub fn personal_info_completed(&self) -> bool {
        self.personal_info_completed
    }

    pub fn program_info_completed(&self) -> bool {
        self.program_info_completed
    }

    pub fn documents_uploaded(&self) -> bool {
        self.documents_uploaded
    }

    pub fn reviewed_by(&self) -> Option<UserId> {
        self.reviewed_by
    }

    pub fn review_notes(&self) -> &str {
        &self.review_notes
    }

    pub fn reviewed_at(&self) -> Option<DateTime<Utc>> {
        self.reviewed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn submitted_at(&self) -> Option<DateTime<Utc>> {
        self.submitted_at
    }
}
