use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{
    AdmissionApplication, ApplicationId, ApplicationStatus, DocumentSlot, ProgramChoice,
};
use super::lifecycle::WizardStep;
use crate::workflows::accounts::UserAccount;

const UNKNOWN_APPLICANT: &str = "unknown applicant";

/// Row shown in staff listings and the CSV export.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationSummary {
    pub application_id: ApplicationId,
    pub registration_number: String,
    pub applicant_name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub program_choice: Option<ProgramChoice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub course_of_study: Option<String>,
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    pub completion_percentage: u8,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<DateTime<Utc>>,
}

impl ApplicationSummary {
    pub fn from_parts(application: &AdmissionApplication, applicant: Option<&UserAccount>) -> Self {
        Self {
            application_id: application.id(),
            registration_number: application.registration_number().to_string(),
            applicant_name: applicant
                .map(UserAccount::full_name)
                .unwrap_or_else(|| UNKNOWN_APPLICANT.to_string()),
            email: applicant.map(|user| user.email.clone()).unwrap_or_default(),
            program_choice: application.program_choice(),
            course_of_study: application
                .program()
                .map(|program| program.course_of_study.clone()),
            status: application.status(),
            status_label: application.status().display_name(),
            completion_percentage: application.completion_percentage(),
            created_at: application.created_at(),
            submitted_at: application.submitted_at(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepProgressEntry {
    pub step: WizardStep,
    pub step_label: &'static str,
    pub completed: bool,
}

/// Applicant dashboard: progress through the wizard plus what is still missing.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub summary: ApplicationSummary,
    pub steps: Vec<StepProgressEntry>,
    pub can_submit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_step: Option<WizardStep>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_documents: Vec<DocumentSlot>,
}

impl DashboardView {
    pub fn build(application: &AdmissionApplication, applicant: &UserAccount) -> Self {
        let steps = WizardStep::ORDER
            .into_iter()
            .map(|step| StepProgressEntry {
                step,
                step_label: step.label(),
                completed: application.step_completed(step),
            })
            .collect();

        Self {
            summary: ApplicationSummary::from_parts(application, Some(applicant)),
            steps,
            can_submit: application.can_submit(),
            next_step: application.next_step(),
            missing_documents: application.documents().missing_required(),
        }
    }
}

/// Full application as shown to its owner or to staff.
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationDetail {
    pub application: AdmissionApplication,
    pub completion_percentage: u8,
    pub can_submit: bool,
}

impl From<AdmissionApplication> for ApplicationDetail {
    fn from(application: AdmissionApplication) -> Self {
        Self {
            completion_percentage: application.completion_percentage(),
            can_submit: application.can_submit(),
            application,
        }
    }
}
