//! Applicant and staff identity: registration, login resolution, and profile upkeep.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;

#[cfg(test)]
mod tests;

pub use domain::{
    AccountSummary, LoginRequest, ProfileUpdate, ProfileView, Registration, SessionToken,
    UserAccount, UserId, UserQuery,
};
pub use repository::{AuthCollaborator, AuthFailure, UserRepository};
pub use router::{account_error_response, account_router, bearer_token};
pub use service::{AccountService, AccountServiceError};
pub use validation::{NameField, ValidationError};
