use super::domain::{SessionToken, UserAccount, UserId};
use crate::workflows::persistence::RepositoryError;

/// Storage abstraction for accounts. Implementations enforce unique `email` and `username`,
/// reporting violations as [`RepositoryError::Conflict`] naming the column.
pub trait UserRepository: Send + Sync {
    fn insert(&self, user: UserAccount) -> Result<UserAccount, RepositoryError>;
    fn update(&self, user: UserAccount) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError>;
    /// Lookup by an already-lowercased email address.
    fn find_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError>;
    fn find_by_username(&self, username: &str) -> Result<Option<UserAccount>, RepositoryError>;
    /// Drop an account whose registration could not be completed.
    fn remove(&self, id: &UserId) -> Result<(), RepositoryError>;
    fn all(&self) -> Result<Vec<UserAccount>, RepositoryError>;
}

/// Credential storage, verification, and session issuance owned outside the portal.
pub trait AuthCollaborator: Send + Sync {
    fn store_credentials(&self, user: &UserAccount, password: &str) -> Result<(), AuthFailure>;
    fn authenticate(&self, username: &str, password: &str) -> Result<UserId, AuthFailure>;
    fn create_session(&self, user: &UserAccount) -> Result<SessionToken, AuthFailure>;
    fn destroy_session(&self, token: &SessionToken) -> Result<(), AuthFailure>;
    /// `Ok(None)` for unknown tokens; `Err` only when the session store itself fails.
    fn current_user(&self, token: &SessionToken) -> Result<Option<UserId>, AuthFailure>;
}

/// Failures reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("Please enter a correct username and password.")]
    InvalidCredentials,
    #[error("session is not recognised")]
    UnknownSession,
    #[error("auth backend unavailable: {0}")]
    Unavailable(String),
}
