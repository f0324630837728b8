use std::sync::OnceLock;

use regex::Regex;

/// Field-level validation failures raised while registering or editing an account.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("A user with this email already exists.")]
    DuplicateEmail,
    #[error("A user with this username already exists.")]
    DuplicateUsername,
    #[error("Enter a valid email address.")]
    InvalidEmail,
    #[error("{} should contain only letters.", field_label(.field))]
    InvalidName { field: NameField },
    #[error("Phone number must be entered in the format: '+999999999'. Up to 15 digits allowed.")]
    InvalidPhone,
    #[error("The two password fields didn't match.")]
    PasswordMismatch,
    #[error("Password must be at least 8 characters long and contain letters and numbers.")]
    WeakPassword,
}

impl ValidationError {
    /// Form field the message belongs to.
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::DuplicateEmail | ValidationError::InvalidEmail => "email",
            ValidationError::DuplicateUsername => "username",
            ValidationError::InvalidName { field } => field.key(),
            ValidationError::InvalidPhone => "phone_number",
            ValidationError::PasswordMismatch => "password_confirmation",
            ValidationError::WeakPassword => "password",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameField {
    First,
    Middle,
    Last,
}

impl NameField {
    pub const fn key(self) -> &'static str {
        match self {
            NameField::First => "first_name",
            NameField::Middle => "middle_name",
            NameField::Last => "last_name",
        }
    }
}

fn field_label(field: &NameField) -> &'static str {
    match field {
        NameField::First => "First name",
        NameField::Middle => "Middle name",
        NameField::Last => "Last name",
    }
}

pub const MIN_PASSWORD_LENGTH: usize = 8;

static PHONE_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn phone_regex() -> &'static Regex {
    PHONE_RE.get_or_init(|| {
        Regex::new(r"^\+?1?\d{9,15}$")
            .unwrap_or_else(|error| panic!("phone regex failed to compile: {error}"))
    })
}

fn email_regex() -> &'static Regex {
    EMAIL_RE.get_or_init(|| {
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$")
            .unwrap_or_else(|error| panic!("email regex failed to compile: {error}"))
    })
}

/// Validate a required name: letters only once spaces are removed. Returns the trimmed value.
pub fn required_name(field: NameField, raw: &str) -> Result<String, ValidationError> {
    let compact: String = raw.chars().filter(|c| *c != ' ').collect();
    if compact.is_empty() || !compact.chars().all(char::is_alphabetic) {
        return Err(ValidationError::InvalidName { field });
    }
    Ok(raw.trim().to_string())
}

/// Validate the optional middle name; blank input yields `None`.
pub fn optional_name(field: NameField, raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => required_name(field, value).map(Some),
    }
}

/// Lowercase and format-check an email address.
pub fn normalize_email(raw: &str) -> Result<String, ValidationError> {
    let email = raw.trim().to_lowercase();
    if !email_regex().is_match(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email)
}

/// Username derived from an email: everything before the `@`.
pub fn username_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or_default().to_string()
}

/// Validate the optional phone number; blank input yields `None`.
pub fn optional_phone(raw: Option<&str>) -> Result<Option<String>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) if phone_regex().is_match(value) => Ok(Some(value.to_string())),
        Some(_) => Err(ValidationError::InvalidPhone),
    }
}

/// Confirmation must match before strength is assessed.
pub fn password(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }

    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_letter = password.chars().any(char::is_alphabetic);
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(long_enough && has_letter && has_digit) {
        return Err(ValidationError::WeakPassword);
    }
    Ok(())
}
