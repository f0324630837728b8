use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::domain::{
    AccountSummary, LoginRequest, ProfileUpdate, Registration, SessionToken, UserAccount, UserId,
    UserQuery,
};
use super::repository::{AuthCollaborator, AuthFailure, UserRepository};
use super::validation::{self, NameField, ValidationError};
use crate::workflows::outcome::ActionOutcome;
use crate::workflows::persistence::RepositoryError;

pub const REGISTERED_MESSAGE: &str =
    "Registration successful! Welcome to the School Admission Portal.";
pub const LOGGED_IN_MESSAGE: &str = "Welcome back! You have successfully logged in.";
pub const LOGGED_OUT_MESSAGE: &str = "You have been successfully logged out.";
pub const PROFILE_UPDATED_MESSAGE: &str = "Your profile has been updated successfully.";

/// Service composing the account repository with the external auth collaborator.
pub struct AccountService<U, A> {
    users: Arc<U>,
    auth: Arc<A>,
}

impl<U, A> AccountService<U, A>
where
    U: UserRepository + 'static,
    A: AuthCollaborator + 'static,
{
    pub fn new(users: Arc<U>, auth: Arc<A>) -> Self {
        Self { users, auth }
    }

    /// Validate and persist a new account, then hand its password to the auth collaborator.
    pub fn register(&self, registration: Registration) -> Result<UserAccount, AccountServiceError> {
        let first_name = validation::required_name(NameField::First, &registration.first_name)?;
        let middle_name =
            validation::optional_name(NameField::Middle, registration.middle_name.as_deref())?;
        let last_name = validation::required_name(NameField::Last, &registration.last_name)?;

        let email = validation::normalize_email(&registration.email)?;
        if self.users.find_by_email(&email)?.is_some() {
            return Err(ValidationError::DuplicateEmail.into());
        }

        let username = match registration
            .username
            .as_deref()
            .map(str::trim)
            .filter(|candidate| !candidate.is_empty())
        {
            Some(explicit) => explicit.to_string(),
            None => validation::username_from_email(&email),
        };
        if self.users.find_by_username(&username)?.is_some() {
            return Err(ValidationError::DuplicateUsername.into());
        }

        validation::password(&registration.password, &registration.password_confirmation)?;

        let now = Utc::now();
        let user = UserAccount {
            id: UserId::random(),
            username,
            email,
            first_name,
            middle_name,
            last_name,
            phone_number: None,
            profile_completed: false,
            is_staff: false,
            created_at: now,
            updated_at: now,
        };

        let stored = self.users.insert(user).map_err(|error| {
            if error.conflict_on("email") {
                AccountServiceError::Validation(ValidationError::DuplicateEmail)
            } else if error.conflict_on("username") {
                AccountServiceError::Validation(ValidationError::DuplicateUsername)
            } else {
                AccountServiceError::Repository(error)
            }
        })?;
        if let Err(failure) = self.auth.store_credentials(&stored, &registration.password) {
            warn!(
                user_id = %stored.id,
                error = %failure,
                "credentials not stored, rolling back registration"
            );
            if let Err(error) = self.users.remove(&stored.id) {
                warn!(user_id = %stored.id, %error, "unfinished account could not be removed");
            }
            return Err(failure.into());
        }

        info!(user_id = %stored.id, username = %stored.username, "account registered");
        Ok(stored)
    }

    /// Open a session for an account that has just been verified or registered.
    pub fn sign_in(&self, user: &UserAccount) -> Result<SessionToken, AccountServiceError> {
        let token = self.auth.create_session(user)?;
        debug!(user_id = %user.id, "session created");
        Ok(token)
    }

    /// Map an email-shaped identifier to its account's username; anything else passes through.
    pub fn resolve_login_identifier(&self, identifier: &str) -> Result<String, AccountServiceError> {
        if identifier.contains('@') {
            if let Some(user) = self.users.find_by_email(&identifier.trim().to_lowercase())? {
                return Ok(user.username);
            }
        }
        Ok(identifier.to_string())
    }

    pub fn login(
        &self,
        request: LoginRequest,
    ) -> Result<(UserAccount, SessionToken), AccountServiceError> {
        let username = self.resolve_login_identifier(&request.identifier)?;
        let user_id = match self.auth.authenticate(&username, &request.password) {
            Ok(user_id) => user_id,
            Err(failure) => {
                warn!(%username, "login rejected");
                return Err(failure.into());
            }
        };

        let user = self.user(&user_id)?;
        let token = self.sign_in(&user)?;
        info!(user_id = %user.id, "user logged in");
        Ok((user, token))
    }

    pub fn logout(&self, token: &SessionToken) -> Result<ActionOutcome, AccountServiceError> {
        self.auth.destroy_session(token)?;
        Ok(ActionOutcome::success(LOGGED_OUT_MESSAGE))
    }

    /// Resolve the account behind a session token.
    pub fn current_user(&self, token: &SessionToken) -> Result<UserAccount, AccountServiceError> {
        let user_id = self
            .auth
            .current_user(token)?
            .ok_or(AccountServiceError::Unauthenticated)?;
        self.user(&user_id)
    }

    pub fn user(&self, id: &UserId) -> Result<UserAccount, AccountServiceError> {
        let user = self.users.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(user)
    }

    /// Apply a partial edit to the name and phone fields, re-validating each supplied field.
    pub fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<(UserAccount, ActionOutcome), AccountServiceError> {
        let mut user = self.user(user_id)?;

        if let Some(first_name) = update.first_name {
            user.first_name = validation::required_name(NameField::First, &first_name)?;
        }
        if let Some(middle_name) = update.middle_name {
            user.middle_name = validation::optional_name(NameField::Middle, Some(&middle_name))?;
        }
        if let Some(last_name) = update.last_name {
            user.last_name = validation::required_name(NameField::Last, &last_name)?;
        }
        if let Some(phone_number) = update.phone_number {
            user.phone_number = validation::optional_phone(Some(&phone_number))?;
        }
        if user.phone_number.is_some() {
            user.profile_completed = true;
        }
        user.updated_at = Utc::now();

        self.users.update(user.clone())?;
        info!(user_id = %user.id, "profile updated");
        Ok((user, ActionOutcome::success(PROFILE_UPDATED_MESSAGE)))
    }

    /// Staff listing of accounts, newest first.
    pub fn list(
        &self,
        reviewer: &UserAccount,
        query: &UserQuery,
    ) -> Result<Vec<AccountSummary>, AccountServiceError> {
        if !reviewer.is_staff {
            warn!(user = %reviewer.username, "staff-only account listing refused");
            return Err(AccountServiceError::Forbidden);
        }
        let mut users: Vec<UserAccount> = self
            .users
            .all()?
            .into_iter()
            .filter(|user| query.matches(user))
            .collect();
        users.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| left.username.cmp(&right.username))
        });
        Ok(users.iter().map(UserAccount::summary).collect())
    }

    /// Give an account access to the review operations.
    pub fn grant_staff(&self, user_id: &UserId) -> Result<UserAccount, AccountServiceError> {
        let mut user = self.user(user_id)?;
        if !user.is_staff {
            user.is_staff = true;
            user.updated_at = Utc::now();
            self.users.update(user.clone())?;
            info!(user_id = %user.id, "staff access granted");
        }
        Ok(user)
    }
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AccountServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Auth(#[from] AuthFailure),
    #[error("authentication required")]
    Unauthenticated,
    #[error("staff access required")]
    Forbidden,
}
