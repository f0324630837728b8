use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc};

use crate::workflows::accounts::{UserAccount, UserId};
use crate::workflows::admissions::documents::DocumentUpload;
use crate::workflows::admissions::domain::{
    AdmissionApplication, ApplicationId, ApplicationStatus, DocumentSlot, Gender, ProgramChoice,
    RegistrationNumber,
};
use crate::workflows::admissions::repository::ApplicationRepository;
use crate::workflows::admissions::service::AdmissionService;
use crate::workflows::admissions::steps::{AdmissionPolicy, PersonalInfoForm, ProgramInfoForm};
use crate::workflows::persistence::RepositoryError;
use crate::workflows::test_support::{account, fixed_now, MemoryApplications, MemoryStorage};

pub(super) fn applicant() -> UserAccount {
    account("ada@example.com", "Ada", "Obi")
}

pub(super) fn personal_form() -> PersonalInfoForm {
    let today = Utc::now().date_naive();
    PersonalInfoForm {
        date_of_birth: NaiveDate::from_ymd_opt(today.year() - 20, 1, 15),
        gender: Some(Gender::Female),
        nationality: "Nigerian".to_string(),
        address: "12 Marina Road".to_string(),
        city: "Lagos".to_string(),
        state: "Lagos".to_string(),
        postal_code: None,
    }
}

pub(super) fn program_form() -> ProgramInfoForm {
    ProgramInfoForm {
        program_choice: Some(ProgramChoice::Undergraduate),
        course_of_study: "Computer Science".to_string(),
    }
}

pub(super) fn upload(slot: DocumentSlot, file_name: &str, size: usize) -> DocumentUpload {
    DocumentUpload {
        slot,
        file_name: file_name.to_string(),
        bytes: vec![7u8; size],
    }
}

pub(super) fn required_uploads() -> Vec<DocumentUpload> {
    vec![
        upload(DocumentSlot::PassportPhoto, "passport.jpg", 2048),
        upload(DocumentSlot::OlevelResult, "waec.pdf", 4096),
        upload(DocumentSlot::BirthCertificate, "birth.png", 1024),
    ]
}

pub(super) fn build_service() -> (
    AdmissionService<MemoryApplications, MemoryStorage>,
    Arc<MemoryApplications>,
    Arc<MemoryStorage>,
) {
    let repository = Arc::new(MemoryApplications::default());
    let storage = Arc::new(MemoryStorage::default());
    let service = AdmissionService::new(
        repository.clone(),
        storage.clone(),
        AdmissionPolicy::default(),
    );
    (service, repository, storage)
}

pub(super) fn draft_for(user_id: UserId, created_at: DateTime<Utc>) -> AdmissionApplication {
    AdmissionApplication::draft(user_id, RegistrationNumber::generate(created_at), created_at)
}

/// Application forced into an arbitrary workflow position.
pub(super) fn application_with(
    status: ApplicationStatus,
    personal: bool,
    program: bool,
    documents: bool,
) -> AdmissionApplication {
    let mut application = draft_for(UserId::random(), fixed_now());
    application.status = status;
    application.personal_info_completed = personal;
    application.program_info_completed = program;
    application.documents_uploaded = documents;
    application
}

/// Run an applicant through every step and submit.
pub(super) fn submitted_application(
    service: &AdmissionService<MemoryApplications, MemoryStorage>,
    user: &UserAccount,
) -> ApplicationId {
    service
        .record_personal_info(user, personal_form())
        .expect("personal info recorded");
    service
        .record_program_info(user, program_form())
        .expect("program info recorded");
    service
        .upload_documents(user, required_uploads())
        .expect("documents recorded");
    let update = service.submit(user).expect("submit succeeds");
    assert!(update.outcome.success, "{}", update.outcome.message);
    update.application.id()
}

/// Repository whose first inserts clash on the registration number.
#[derive(Default)]
pub(super) struct CollidingApplications {
    pub(super) inner: MemoryApplications,
    pub(super) collisions: AtomicUsize,
}

impl CollidingApplications {
    pub(super) fn with_collisions(collisions: usize) -> Self {
        Self {
            inner: MemoryApplications::default(),
            collisions: AtomicUsize::new(collisions),
        }
    }
}

impl ApplicationRepository for CollidingApplications {
    fn insert(
        &self,
        application: AdmissionApplication,
    ) -> Result<AdmissionApplication, RepositoryError> {
        let remaining = self.collisions.load(Ordering::SeqCst);
        if remaining > 0 {
            self.collisions.store(remaining - 1, Ordering::SeqCst);
            return Err(RepositoryError::Conflict {
                field: "registration_number",
            });
        }
        self.inner.insert(application)
    }

    fn update(&self, application: AdmissionApplication) -> Result<(), RepositoryError> {
        self.inner.update(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<AdmissionApplication>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn fetch_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AdmissionApplication>, RepositoryError> {
        self.inner.fetch_by_user(user_id)
    }

    fn all(&self) -> Result<Vec<AdmissionApplication>, RepositoryError> {
        self.inner.all()
    }
}

/// Repository where another request creates the user's draft just before ours lands.
#[derive(Default)]
pub(super) struct RacingApplications {
    pub(super) inner: MemoryApplications,
}

impl ApplicationRepository for RacingApplications {
    fn insert(
        &self,
        application: AdmissionApplication,
    ) -> Result<AdmissionApplication, RepositoryError> {
        if self.inner.fetch_by_user(&application.user_id)?.is_none() {
            self.inner
                .insert(draft_for(application.user_id, fixed_now()))?;
        }
        self.inner.insert(application)
    }

    fn update(&self, application: AdmissionApplication) -> Result<(), RepositoryError> {
        self.inner.update(application)
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<AdmissionApplication>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn fetch_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AdmissionApplication>, RepositoryError> {
        self.inner.fetch_by_user(user_id)
    }

    fn all(&self) -> Result<Vec<AdmissionApplication>, RepositoryError> {
        self.inner.all()
    }
}
