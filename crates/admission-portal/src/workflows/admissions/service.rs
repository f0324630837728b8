use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::documents::{
    generated_name, validate_upload, DocumentError, DocumentUpload, StorageCollaborator,
    StorageError,
};
use super::domain::{AdmissionApplication, RegistrationNumber, StoredDocument};
use super::lifecycle::{StepError, StepRecord, TransitionRejected, WizardStep};
use super::repository::ApplicationRepository;
use super::steps::{
    AdmissionPolicy, PersonalInfoForm, ProgramInfoForm, StepGuard, StepValidationError,
};
use super::views::{ApplicationDetail, DashboardView};
use crate::workflows::accounts::UserAccount;
use crate::workflows::outcome::ActionOutcome;
use crate::workflows::persistence::RepositoryError;

pub const PERSONAL_INFO_SAVED_MESSAGE: &str = "Personal information saved successfully!";
pub const PROGRAM_INFO_SAVED_MESSAGE: &str = "Program information saved successfully!";
pub const DOCUMENTS_UPLOADED_MESSAGE: &str = "Documents uploaded successfully!";
pub const DOCUMENTS_PENDING_MESSAGE: &str =
    "Documents saved. Upload the passport photo, O'Level result and birth certificate to finish this step.";
pub const CANNOT_SUBMIT_MESSAGE: &str =
    "Cannot submit application. Please ensure all steps are completed.";

/// Fresh registration numbers tried before giving up on a draft insert.
const REGISTRATION_ATTEMPTS: usize = 5;

/// Application state after a step, paired with the message for the applicant.
#[derive(Debug, Clone)]
pub struct ApplicationUpdate {
    pub application: AdmissionApplication,
    pub outcome: ActionOutcome,
}

/// Service driving one applicant through the wizard and final submission.
pub struct AdmissionService<R, S> {
    repository: Arc<R>,
    storage: Arc<S>,
    guard: StepGuard,
}

impl<R, S> AdmissionService<R, S>
where
    R: ApplicationRepository + 'static,
    S: StorageCollaborator + 'static,
{
    pub fn new(repository: Arc<R>, storage: Arc<S>, policy: AdmissionPolicy) -> Self {
        Self {
            repository,
            storage,
            guard: StepGuard::with_policy(policy),
        }
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        self.guard.policy()
    }

    /// Fetch the applicant's application, creating an empty draft on first access.
    ///
    /// A concurrent create for the same user resolves to the stored row. A clashing
    /// registration number is regenerated a bounded number of times.
    pub fn application_for(
        &self,
        applicant: &UserAccount,
    ) -> Result<AdmissionApplication, AdmissionServiceError> {
        if let Some(existing) = self.repository.fetch_by_user(&applicant.id)? {
            return Ok(existing);
        }

        let now = Utc::now();
        for attempt in 1..=REGISTRATION_ATTEMPTS {
            let draft =
                AdmissionApplication::draft(applicant.id, RegistrationNumber::generate(now), now);
            match self.repository.insert(draft) {
                Ok(stored) => {
                    info!(
                        user_id = %applicant.id,
                        registration_number = %stored.registration_number(),
                        "created draft application"
                    );
                    return Ok(stored);
                }
                Err(error) if error.conflict_on("user_id") => {
                    debug!(user_id = %applicant.id, "draft created concurrently; reusing stored row");
                    return self
                        .repository
                        .fetch_by_user(&applicant.id)?
                        .ok_or_else(|| RepositoryError::NotFound.into());
                }
                Err(error) if error.conflict_on("registration_number") => {
                    warn!(attempt, "registration number collision; regenerating");
                }
                Err(error) => return Err(error.into()),
            }
        }

        Err(AdmissionServiceError::RegistrationNumbersExhausted {
            attempts: REGISTRATION_ATTEMPTS,
        })
    }

    pub fn dashboard(
        &self,
        applicant: &UserAccount,
    ) -> Result<DashboardView, AdmissionServiceError> {
        let application = self.application_for(applicant)?;
        Ok(DashboardView::build(&application, applicant))
    }

    /// The applicant's existing application; never creates one.
    pub fn detail(
        &self,
        applicant: &UserAccount,
    ) -> Result<ApplicationDetail, AdmissionServiceError> {
        let application = self
            .repository
            .fetch_by_user(&applicant.id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(ApplicationDetail::from(application))
    }

    pub fn record_personal_info(
        &self,
        applicant: &UserAccount,
        form: PersonalInfoForm,
    ) -> Result<ApplicationUpdate, AdmissionServiceError> {
        let mut application = self.editable_at(applicant, WizardStep::PersonalInfo)?;
        let now = Utc::now();
        let details = self.guard.personal_info(form, now.date_naive())?;

        application.record_step(StepRecord::PersonalInfo(details), now)?;
        self.repository.update(application.clone())?;
        info!(
            registration_number = %application.registration_number(),
            "personal information recorded"
        );

        Ok(ApplicationUpdate {
            application,
            outcome: ActionOutcome::success(PERSONAL_INFO_SAVED_MESSAGE),
        })
    }

    pub fn record_program_info(
        &self,
        applicant: &UserAccount,
        form: ProgramInfoForm,
    ) -> Result<ApplicationUpdate, AdmissionServiceError> {
        let mut application = self.editable_at(applicant, WizardStep::ProgramInfo)?;
        let details = self.guard.program_info(form)?;

        application.record_step(StepRecord::ProgramInfo(details), Utc::now())?;
        self.repository.update(application.clone())?;
        info!(
            registration_number = %application.registration_number(),
            "program information recorded"
        );

        Ok(ApplicationUpdate {
            application,
            outcome: ActionOutcome::success(PROGRAM_INFO_SAVED_MESSAGE),
        })
    }

    /// Validate every upload, store them under generated names, then attach them.
    ///
    /// Nothing is attached unless all uploads pass validation. Documents displaced from
    /// their slots are deleted from storage once the application is saved.
    pub fn upload_documents(
        &self,
        applicant: &UserAccount,
        uploads: Vec<DocumentUpload>,
    ) -> Result<ApplicationUpdate, AdmissionServiceError> {
        let mut application = self.editable_at(applicant, WizardStep::Documents)?;
        let accepted = uploads
            .into_iter()
            .map(|upload| validate_upload(upload, self.guard.policy()))
            .collect::<Result<Vec<_>, _>>()?;

        let now = Utc::now();
        let mut stored = Vec::with_capacity(accepted.len());
        for upload in accepted {
            let name = generated_name(&applicant.id, &upload.extension);
            match self.storage.store(&upload.bytes, &name) {
                Ok(reference) => {
                    let slot = upload.slot;
                    stored.push((slot, upload.into_stored(reference, now)));
                }
                Err(error) => {
                    self.release(stored.iter().map(|(_, document)| document));
                    return Err(error.into());
                }
            }
        }

        let fresh: Vec<StoredDocument> = stored
            .iter()
            .map(|(_, document)| document.clone())
            .collect();
        let displaced = match application.record_step(StepRecord::Documents(stored), now) {
            Ok(displaced) => displaced,
            Err(error) => {
                self.release(&fresh);
                return Err(error.into());
            }
        };
        if let Err(error) = self.repository.update(application.clone()) {
            self.release(&fresh);
            return Err(error.into());
        }
        self.release(&displaced);

        info!(
            registration_number = %application.registration_number(),
            stored = fresh.len(),
            replaced = displaced.len(),
            complete = application.documents_uploaded(),
            "documents recorded"
        );

        let message = if application.documents_uploaded() {
            DOCUMENTS_UPLOADED_MESSAGE
        } else {
            DOCUMENTS_PENDING_MESSAGE
        };
        Ok(ApplicationUpdate {
            application,
            outcome: ActionOutcome::success(message),
        })
    }

    /// Submit a complete draft. An incomplete or already-submitted application yields a
    /// failure outcome and is left unchanged.
    pub fn submit(
        &self,
        applicant: &UserAccount,
    ) -> Result<ApplicationUpdate, AdmissionServiceError> {
        let mut application = self
            .repository
            .fetch_by_user(&applicant.id)?
            .ok_or(RepositoryError::NotFound)?;

        if !application.submit(Utc::now()) {
            debug!(
                registration_number = %application.registration_number(),
                status = application.status().label(),
                "submission refused"
            );
            return Ok(ApplicationUpdate {
                application,
                outcome: ActionOutcome::failure(CANNOT_SUBMIT_MESSAGE),
            });
        }

        self.repository.update(application.clone())?;
        info!(
            registration_number = %application.registration_number(),
            "application submitted"
        );

        let message = format!(
            "Application {} submitted successfully! You will be notified once it has been reviewed.",
            application.registration_number()
        );
        Ok(ApplicationUpdate {
            application,
            outcome: ActionOutcome::success(message),
        })
    }

    fn editable_at(
        &self,
        applicant: &UserAccount,
        step: WizardStep,
    ) -> Result<AdmissionApplication, AdmissionServiceError> {
        let application = self.application_for(applicant)?;
        application.ensure_editable()?;
        step.ensure_reachable(&application)?;
        Ok(application)
    }

    fn release<'a>(&self, documents: impl IntoIterator<Item = &'a StoredDocument>) {
        for document in documents {
            if let Err(error) = self.storage.delete(&document.reference) {
                warn!(
                    reference = %document.reference.0,
                    error = %error,
                    "failed to delete stored document"
                );
            }
        }
    }
}

/// Error raised by the admission and review services.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionServiceError {
    #[error(transparent)]
    Validation(#[from] StepValidationError),
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error(transparent)]
    Step(#[from] StepError),
    #[error(transparent)]
    Transition(#[from] TransitionRejected),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("could not allocate a unique registration number after {attempts} attempts")]
    RegistrationNumbersExhausted { attempts: usize },
    #[error("staff access required")]
    Forbidden,
    #[error(transparent)]
    Export(#[from] csv::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
