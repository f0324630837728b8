use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::domain::{DocumentSlot, Gender, PersonalDetails, ProgramChoice, ProgramDetails};
use crate::config::AdmissionsConfig;

/// Raw personal-information form as posted by the applicant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalInfoForm {
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub nationality: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramInfoForm {
    #[serde(default)]
    pub program_choice: Option<ProgramChoice>,
    #[serde(default)]
    pub course_of_study: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepValidationError {
    #[error("This field is required.")]
    MissingField { field: &'static str },
    #[error("Please enter a valid date of birth.")]
    InvalidDateOfBirth,
    #[error("Applicant must be at least {min} years old.")]
    ApplicantTooYoung { min: u32 },
    #[error("Applicant must be at most {max} years old.")]
    ApplicantTooOld { max: u32 },
    #[error("Please specify your desired course of study.")]
    MissingCourseOfStudy,
}

impl StepValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            StepValidationError::MissingField { field } => field,
            StepValidationError::InvalidDateOfBirth
            | StepValidationError::ApplicantTooYoung { .. }
            | StepValidationError::ApplicantTooOld { .. } => "date_of_birth",
            StepValidationError::MissingCourseOfStudy => "course_of_study",
        }
    }
}

pub const DEFAULT_UPLOAD_MAX_BYTES: u64 = 5 * 1024 * 1024;
pub const DEFAULT_ADDITIONAL_UPLOAD_MAX_BYTES: u64 = 10 * 1024 * 1024;
pub const DEFAULT_MIN_APPLICANT_AGE: u32 = 15;
pub const DEFAULT_MAX_APPLICANT_AGE: u32 = 100;

/// Admission limits applied by the step guard and the document validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionPolicy {
    upload_max_bytes: u64,
    additional_upload_max_bytes: u64,
    min_applicant_age: u32,
    max_applicant_age: u32,
}

impl AdmissionPolicy {
    pub fn new(
        upload_max_bytes: u64,
        additional_upload_max_bytes: u64,
        min_applicant_age: u32,
        max_applicant_age: u32,
    ) -> Self {
        let upload_max_bytes = if upload_max_bytes == 0 {
            DEFAULT_UPLOAD_MAX_BYTES
        } else {
            upload_max_bytes
        };
        let additional_upload_max_bytes = if additional_upload_max_bytes == 0 {
            DEFAULT_ADDITIONAL_UPLOAD_MAX_BYTES
        } else {
            additional_upload_max_bytes
        };
        let (min_applicant_age, max_applicant_age) = if min_applicant_age <= max_applicant_age {
            (min_applicant_age, max_applicant_age)
        } else {
            (DEFAULT_MIN_APPLICANT_AGE, DEFAULT_MAX_APPLICANT_AGE)
        };

        Self {
            upload_max_bytes,
            additional_upload_max_bytes,
            min_applicant_age,
            max_applicant_age,
        }
    }

    pub fn max_bytes_for(&self, slot: DocumentSlot) -> u64 {
        if slot.is_required() {
            self.upload_max_bytes
        } else {
            self.additional_upload_max_bytes
        }
    }

    /// Largest body any upload route may need to accept.
    pub fn largest_upload(&self) -> u64 {
        self.upload_max_bytes.max(self.additional_upload_max_bytes)
    }

    pub fn min_applicant_age(&self) -> u32 {
        self.min_applicant_age
    }

    pub fn max_applicant_age(&self) -> u32 {
        self.max_applicant_age
    }
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_UPLOAD_MAX_BYTES,
            DEFAULT_ADDITIONAL_UPLOAD_MAX_BYTES,
            DEFAULT_MIN_APPLICANT_AGE,
            DEFAULT_MAX_APPLICANT_AGE,
        )
    }
}

impl From<&AdmissionsConfig> for AdmissionPolicy {
    fn from(config: &AdmissionsConfig) -> Self {
        Self::new(
            config.upload_max_bytes,
            config.additional_upload_max_bytes,
            config.min_applicant_age,
            config.max_applicant_age,
        )
    }
}

/// Turns raw step forms into validated step data.
#[derive(Debug, Clone, Default)]
pub struct StepGuard {
    policy: AdmissionPolicy,
}

impl StepGuard {
    pub fn with_policy(policy: AdmissionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AdmissionPolicy {
        &self.policy
    }

    pub fn personal_info(
        &self,
        form: PersonalInfoForm,
        today: NaiveDate,
    ) -> Result<PersonalDetails, StepValidationError> {
        let date_of_birth = form
            .date_of_birth
            .ok_or(StepValidationError::MissingField {
                field: "date_of_birth",
            })?;
        if date_of_birth > today {
            return Err(StepValidationError::InvalidDateOfBirth);
        }
        let age = age_on(date_of_birth, today);
        if age < self.policy.min_applicant_age {
            return Err(StepValidationError::ApplicantTooYoung {
                min: self.policy.min_applicant_age,
            });
        }
        if age > self.policy.max_applicant_age {
            return Err(StepValidationError::ApplicantTooOld {
                max: self.policy.max_applicant_age,
            });
        }

        let gender = form
            .gender
            .ok_or(StepValidationError::MissingField { field: "gender" })?;

        Ok(PersonalDetails {
            date_of_birth,
            gender,
            nationality: required_text(&form.nationality, "nationality")?,
            address: required_text(&form.address, "address")?,
            city: required_text(&form.city, "city")?,
            state: required_text(&form.state, "state")?,
            postal_code: form
                .postal_code
                .map(|code| code.trim().to_string())
                .filter(|code| !code.is_empty()),
        })
    }

    pub fn program_info(
        &self,
        form: ProgramInfoForm,
    ) -> Result<ProgramDetails, StepValidationError> {
        let program_choice = form
            .program_choice
            .ok_or(StepValidationError::MissingField {
                field: "program_choice",
            })?;
        let course_of_study = form.course_of_study.trim();
        if course_of_study.is_empty() {
            return Err(StepValidationError::MissingCourseOfStudy);
        }

        Ok(ProgramDetails {
            program_choice,
            course_of_study: course_of_study.to_string(),
        })
    }
}

fn required_text(value: &str, field: &'static str) -> Result<String, StepValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(StepValidationError::MissingField { field })
    } else {
        Ok(trimmed.to_string())
    }
}

/// Whole years between `date_of_birth` and `today`.
pub fn age_on(date_of_birth: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - date_of_birth.year();
    if (today.month(), today.day()) < (date_of_birth.month(), date_of_birth.day()) {
        years -= 1;
    }
    years.max(0) as u32
}
