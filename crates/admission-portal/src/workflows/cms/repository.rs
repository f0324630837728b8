use super::domain::Page;
use crate::workflows::persistence::RepositoryError;

/// Page storage. Implementations reject a second page with the same slug as
/// `RepositoryError::Conflict { field: "slug" }`.
pub trait PageRepository: Send + Sync {
    fn insert(&self, page: Page) -> Result<Page, RepositoryError>;
    fn update(&self, page: Page) -> Result<(), RepositoryError>;
    fn find_by_slug(&self, slug: &str) -> Result<Option<Page>, RepositoryError>;
    fn all(&self) -> Result<Vec<Page>, RepositoryError>;
}
