/// Error enumeration for repository failures shared by every workflow store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// A unique constraint rejected the write; `field` names the constrained column.
    #[error("record already exists ({field} must be unique)")]
    Conflict { field: &'static str },
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    pub fn conflict_on(&self, field: &str) -> bool {
        matches!(self, RepositoryError::Conflict { field: constrained } if *constrained == field)
    }
}
