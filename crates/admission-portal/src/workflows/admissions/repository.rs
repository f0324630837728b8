use super::domain::{AdmissionApplication, ApplicationId};
use crate::workflows::accounts::UserId;
use crate::workflows::persistence::RepositoryError;

/// Storage abstraction for applications. Implementations enforce one application per user
/// and unique registration numbers, naming the column in [`RepositoryError::Conflict`].
pub trait ApplicationRepository: Send + Sync {
    fn insert(
        &self,
        application: AdmissionApplication,
    ) -> Result<AdmissionApplication, RepositoryError>;
    fn update(&self, application: AdmissionApplication) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<AdmissionApplication>, RepositoryError>;
    fn fetch_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<AdmissionApplication>, RepositoryError>;
    fn all(&self) -> Result<Vec<AdmissionApplication>, RepositoryError>;
}
