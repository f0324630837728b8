use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{
    AdmissionApplication, ApplicationStatus, DocumentSlot, PersonalDetails, ProgramDetails,
    StoredDocument,
};
use crate::workflows::accounts::UserId;

/// Ordered steps of the applicant wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    PersonalInfo,
    ProgramInfo,
    Documents,
}

impl WizardStep {
    pub const ORDER: [WizardStep; 3] = [
        WizardStep::PersonalInfo,
        WizardStep::ProgramInfo,
        WizardStep::Documents,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            WizardStep::PersonalInfo => "personal information",
            WizardStep::ProgramInfo => "program information",
            WizardStep::Documents => "documents",
        }
    }

    /// Step whose completion flag must be up before this one may be recorded.
    pub const fn prerequisite(self) -> Option<WizardStep> {
        match self {
            WizardStep::PersonalInfo => None,
            WizardStep::ProgramInfo => Some(WizardStep::PersonalInfo),
            WizardStep::Documents => Some(WizardStep::ProgramInfo),
        }
    }

    /// Workflow guard run before `record_step`; the entity itself does not enforce ordering.
    pub fn ensure_reachable(self, application: &AdmissionApplication) -> Result<(), StepError> {
        let mut pending = self.prerequisite();
        while let Some(required) = pending {
            if !application.step_completed(required) {
                return Err(StepError::StepOutOfOrder {
                    step: self,
                    required,
                });
            }
            pending = required.prerequisite();
        }
        Ok(())
    }
}

/// Data captured by one wizard step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepRecord {
    PersonalInfo(PersonalDetails),
    ProgramInfo(ProgramDetails),
    Documents(Vec<(DocumentSlot, StoredDocument)>),
}

impl StepRecord {
    pub fn step(&self) -> WizardStep {
        match self {
            StepRecord::PersonalInfo(_) => WizardStep::PersonalInfo,
            StepRecord::ProgramInfo(_) => WizardStep::ProgramInfo,
            StepRecord::Documents(_) => WizardStep::Documents,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StepError {
    #[error("Please complete {} first.", .required.label())]
    StepOutOfOrder {
        step: WizardStep,
        required: WizardStep,
    },
    #[error("application is {} and can no longer be edited", .status.display_name())]
    ApplicationLocked { status: ApplicationStatus },
}

/// Staff decisions that move an application through review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    #[serde(rename = "under_review")]
    MarkUnderReview,
    Approve,
    Reject,
}

impl ReviewDecision {
    pub const fn verb(self) -> &'static str {
        match self {
            ReviewDecision::MarkUnderReview => "mark under review",
            ReviewDecision::Approve => "approve",
            ReviewDecision::Reject => "reject",
        }
    }

    pub const fn target(self) -> ApplicationStatus {
        match self {
            ReviewDecision::MarkUnderReview => ApplicationStatus::UnderReview,
            ReviewDecision::Approve => ApplicationStatus::Approved,
            ReviewDecision::Reject => ApplicationStatus::Rejected,
        }
    }

    pub const fn permits(self, from: ApplicationStatus) -> bool {
        match self {
            ReviewDecision::MarkUnderReview => matches!(from, ApplicationStatus::Submitted),
            ReviewDecision::Approve | ReviewDecision::Reject => from.is_reviewable(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {} an application that is {}", .decision.verb(), .from.display_name())]
pub struct TransitionRejected {
    pub decision: ReviewDecision,
    pub from: ApplicationStatus,
}

impl AdmissionApplication {
    pub fn step_completed(&self, step: WizardStep) -> bool {
        match step {
            WizardStep::PersonalInfo => self.personal_info_completed,
            WizardStep::ProgramInfo => self.program_info_completed,
            WizardStep::Documents => self.documents_uploaded,
        }
    }

    /// Share of completed steps, rounded half-up: one of 0, 33, 67, 100.
    pub fn completion_percentage(&self) -> u8 {
        let completed = WizardStep::ORDER
            .iter()
            .filter(|step| self.step_completed(**step))
            .count() as u32;
        ((100 * completed + 1) / 3) as u8
    }

    pub fn is_complete(&self) -> bool {
        WizardStep::ORDER
            .iter()
            .all(|step| self.step_completed(*step))
    }

    pub fn can_submit(&self) -> bool {
        self.status == ApplicationStatus::Draft && self.is_complete()
    }

    /// First step still waiting on the applicant, while the application is a draft.
    pub fn next_step(&self) -> Option<WizardStep> {
        if self.status != ApplicationStatus::Draft {
            return None;
        }
        WizardStep::ORDER
            .into_iter()
            .find(|step| !self.step_completed(*step))
    }

    pub fn ensure_editable(&self) -> Result<(), StepError> {
        if self.status == ApplicationStatus::Draft {
            Ok(())
        } else {
            Err(StepError::ApplicationLocked {
                status: self.status,
            })
        }
    }

    /// Store step data and raise the step's completion flag when its condition holds.
    ///
    /// Flags never go back down. Returns the documents displaced by a documents step so the
    /// caller can release them from storage.
    pub fn record_step(
        &mut self,
        record: StepRecord,
        now: DateTime<Utc>,
    ) -> Result<Vec<StoredDocument>, StepError> {
        self.ensure_editable()?;

        let mut displaced = Vec::new();
        match record {
            StepRecord::PersonalInfo(details) => {
                self.personal = Some(details);
                self.personal_info_completed = true;
            }
            StepRecord::ProgramInfo(details) => {
                self.program = Some(details);
                self.program_info_completed = true;
            }
            StepRecord::Documents(uploads) => {
                for (slot, document) in uploads {
                    if let Some(previous) = self.documents.replace(slot, document) {
                        displaced.push(previous);
                    }
                }
                if self.documents.has_required() {
                    self.documents_uploaded = true;
                }
            }
        }
        self.updated_at = now;
        Ok(displaced)
    }

    /// Move a complete draft to submitted. Returns `false`, leaving the entity untouched,
    /// when the application cannot be submitted.
    pub fn submit(&mut self, now: DateTime<Utc>) -> bool {
        if !self.can_submit() {
            return false;
        }
        self.status = ApplicationStatus::Submitted;
        self.submitted_at = Some(now);
        self.updated_at = now;
        true
    }

    /// Stamps the reviewer and time; existing review notes are kept.
    pub fn mark_under_review(
        &mut self,
        reviewer: UserId,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRejected> {
        self.transition(ReviewDecision::MarkUnderReview, now)?;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        Ok(())
    }

    pub fn approve(
        &mut self,
        reviewer: UserId,
        notes: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRejected> {
        self.decide(ReviewDecision::Approve, reviewer, notes.into(), now)
    }

    pub fn reject(
        &mut self,
        reviewer: UserId,
        notes: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRejected> {
        self.decide(ReviewDecision::Reject, reviewer, notes.into(), now)
    }

    /// Apply a review decision. Notes are ignored when marking under review.
    pub fn review(
        &mut self,
        decision: ReviewDecision,
        reviewer: UserId,
        notes: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRejected> {
        match decision {
            ReviewDecision::MarkUnderReview => self.mark_under_review(reviewer, now),
            ReviewDecision::Approve | ReviewDecision::Reject => {
                self.decide(decision, reviewer, notes.into(), now)
            }
        }
    }

    fn decide(
        &mut self,
        decision: ReviewDecision,
        reviewer: UserId,
        notes: String,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRejected> {
        self.transition(decision, now)?;
        self.reviewed_by = Some(reviewer);
        self.reviewed_at = Some(now);
        self.review_notes = notes;
        Ok(())
    }

    fn transition(
        &mut self,
        decision: ReviewDecision,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionRejected> {
        if !decision.permits(self.status) {
            return Err(TransitionRejected {
                decision,
                from: self.status,
            });
        }
        self.status = decision.target();
        self.updated_at = now;
        Ok(())
    }
}
