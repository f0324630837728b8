use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{AdmissionApplication, ApplicationId, ApplicationStatus, Gender, ProgramChoice};
use super::lifecycle::ReviewDecision;
use super::repository::ApplicationRepository;
use super::service::{AdmissionServiceError, ApplicationUpdate};
use super::views::{ApplicationDetail, ApplicationSummary};
use crate::workflows::accounts::{UserAccount, UserRepository};
use crate::workflows::outcome::ActionOutcome;
use crate::workflows::persistence::RepositoryError;

pub const BULK_APPROVE_NOTE: &str = "Approved via bulk action";
pub const BULK_REJECT_NOTE: &str = "Rejected via bulk action";

const EXPORT_HEADERS: [&str; 10] = [
    "registration_number",
    "applicant_name",
    "email",
    "program_choice",
    "course_of_study",
    "status",
    "completion_percentage",
    "created_at",
    "submitted_at",
    "application_id",
];

/// Staff listing filters. Search is case-insensitive over registration number, applicant
/// name and email, and course of study.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationQuery {
    #[serde(default)]
    pub status: Option<ApplicationStatus>,
    #[serde(default)]
    pub program_choice: Option<ProgramChoice>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub search: Option<String>,
}

impl ApplicationQuery {
    fn matches(&self, application: &AdmissionApplication, applicant: Option<&UserAccount>) -> bool {
        if self.status.is_some_and(|status| application.status() != status) {
            return false;
        }
        if self
            .program_choice
            .is_some_and(|choice| application.program_choice() != Some(choice))
        {
            return false;
        }
        if self.gender.is_some_and(|gender| {
            application.personal().map(|personal| personal.gender) != Some(gender)
        }) {
            return false;
        }

        let Some(needle) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase)
        else {
            return true;
        };

        let mut haystacks = vec![application.registration_number().as_str().to_lowercase()];
        if let Some(user) = applicant {
            haystacks.push(user.first_name.to_lowercase());
            haystacks.push(user.last_name.to_lowercase());
            haystacks.push(user.email.to_lowercase());
        }
        if let Some(program) = application.program() {
            haystacks.push(program.course_of_study.to_lowercase());
        }
        haystacks.iter().any(|haystack| haystack.contains(&needle))
    }
}

/// Batch operations offered on the staff listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BulkAction {
    ApproveApplications,
    RejectApplications,
    MarkUnderReview,
}

impl BulkAction {
    pub const fn decision(self) -> ReviewDecision {
        match self {
            BulkAction::ApproveApplications => ReviewDecision::Approve,
            BulkAction::RejectApplications => ReviewDecision::Reject,
            BulkAction::MarkUnderReview => ReviewDecision::MarkUnderReview,
        }
    }

    const fn note(self) -> &'static str {
        match self {
            BulkAction::ApproveApplications => BULK_APPROVE_NOTE,
            BulkAction::RejectApplications => BULK_REJECT_NOTE,
            BulkAction::MarkUnderReview => "",
        }
    }

    fn message(self, updated: usize) -> String {
        match self {
            BulkAction::ApproveApplications => {
                format!("{updated} application(s) approved successfully.")
            }
            BulkAction::RejectApplications => format!("{updated} application(s) rejected."),
            BulkAction::MarkUnderReview => {
                format!("{updated} application(s) marked as under review.")
            }
        }
    }
}

/// Staff-side review, listing, and export over stored applications.
pub struct ReviewService<R, U> {
    applications: Arc<R>,
    users: Arc<U>,
}

impl<R, U> ReviewService<R, U>
where
    R: ApplicationRepository + 'static,
    U: UserRepository + 'static,
{
    pub fn new(applications: Arc<R>, users: Arc<U>) -> Self {
        Self {
            applications,
            users,
        }
    }

    /// Applications matching the query, newest first.
    pub fn list(
        &self,
        reviewer: &UserAccount,
        query: &ApplicationQuery,
    ) -> Result<Vec<ApplicationSummary>, AdmissionServiceError> {
        ensure_staff(reviewer)?;
        let mut rows = Vec::new();
        for application in self.applications.all()? {
            let applicant = self.users.fetch(&application.user_id())?;
            if query.matches(&application, applicant.as_ref()) {
                rows.push(ApplicationSummary::from_parts(&application, applicant.as_ref()));
            }
        }
        rows.sort_by(|left, right| {
            right
                .created_at
                .cmp(&left.created_at)
                .then_with(|| right.registration_number.cmp(&left.registration_number))
        });
        Ok(rows)
    }

    pub fn detail(
        &self,
        reviewer: &UserAccount,
        id: &ApplicationId,
    ) -> Result<ApplicationDetail, AdmissionServiceError> {
        ensure_staff(reviewer)?;
        let application = self
            .applications
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;
        Ok(ApplicationDetail::from(application))
    }

    /// Apply one decision. A decision the current status does not allow is an error and
    /// leaves the stored application untouched.
    pub fn review(
        &self,
        reviewer: &UserAccount,
        id: &ApplicationId,
        decision: ReviewDecision,
        notes: &str,
    ) -> Result<ApplicationUpdate, AdmissionServiceError> {
        ensure_staff(reviewer)?;
        let mut application = self
            .applications
            .fetch(id)?
            .ok_or(RepositoryError::NotFound)?;

        application.review(decision, reviewer.id, notes.trim(), Utc::now())?;
        self.applications.update(application.clone())?;
        info!(
            registration_number = %application.registration_number(),
            reviewer = %reviewer.username,
            status = application.status().label(),
            "review decision recorded"
        );

        let message = format!(
            "Application {} is now {}.",
            application.registration_number(),
            application.status().display_name()
        );
        Ok(ApplicationUpdate {
            application,
            outcome: ActionOutcome::success(message),
        })
    }

    pub fn mark_under_review(
        &self,
        reviewer: &UserAccount,
        id: &ApplicationId,
    ) -> Result<ApplicationUpdate, AdmissionServiceError> {
        self.review(reviewer, id, ReviewDecision::MarkUnderReview, "")
    }

    pub fn approve(
        &self,
        reviewer: &UserAccount,
        id: &ApplicationId,
        notes: &str,
    ) -> Result<ApplicationUpdate, AdmissionServiceError> {
        self.review(reviewer, id, ReviewDecision::Approve, notes)
    }

    pub fn reject(
        &self,
        reviewer: &UserAccount,
        id: &ApplicationId,
        notes: &str,
    ) -> Result<ApplicationUpdate, AdmissionServiceError> {
        self.review(reviewer, id, ReviewDecision::Reject, notes)
    }

    /// Apply an action to each selected application. Applications whose status does not
    /// allow the action, or that no longer exist, are skipped and left out of the count.
    pub fn bulk(
        &self,
        reviewer: &UserAccount,
        action: BulkAction,
        ids: &[ApplicationId],
    ) -> Result<ActionOutcome, AdmissionServiceError> {
        ensure_staff(reviewer)?;
        let now = Utc::now();
        let decision = action.decision();
        let mut updated = 0usize;

        for id in ids {
            let Some(mut application) = self.applications.fetch(id)? else {
                warn!(application_id = %id, "bulk action skipped missing application");
                continue;
            };
            if application
                .review(decision, reviewer.id, action.note(), now)
                .is_err()
            {
                continue;
            }
            self.applications.update(application)?;
            updated += 1;
        }

        info!(
            reviewer = %reviewer.username,
            action = decision.verb(),
            selected = ids.len(),
            updated,
            "bulk review applied"
        );
        Ok(ActionOutcome::success(action.message(updated)))
    }

    /// CSV of the filtered listing, header row first.
    pub fn export_csv(
        &self,
        reviewer: &UserAccount,
        query: &ApplicationQuery,
    ) -> Result<Vec<u8>, AdmissionServiceError> {
        let rows = self.list(reviewer, query)?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(EXPORT_HEADERS)?;
        for row in &rows {
            writer.write_record([
                row.registration_number.clone(),
                row.applicant_name.clone(),
                row.email.clone(),
                row.program_choice
                    .map(|choice| choice.label().to_string())
                    .unwrap_or_default(),
                row.course_of_study.clone().unwrap_or_default(),
                row.status.label().to_string(),
                row.completion_percentage.to_string(),
                row.created_at.to_rfc3339(),
                row.submitted_at
                    .map(|submitted| submitted.to_rfc3339())
                    .unwrap_or_default(),
                row.application_id.to_string(),
            ])?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|error| error.into_error())?;
        info!(reviewer = %reviewer.username, rows = rows.len(), "applications exported");
        Ok(bytes)
    }
}

fn ensure_staff(user: &UserAccount) -> Result<(), AdmissionServiceError> {
    if user.is_staff {
        Ok(())
    } else {
        warn!(user = %user.username, "staff-only admissions operation refused");
        Err(AdmissionServiceError::Forbidden)
    }
}
