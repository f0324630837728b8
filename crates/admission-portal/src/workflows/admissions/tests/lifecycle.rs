use chrono::{Duration, NaiveDate};
use regex::Regex;

use super::common::*;
use crate::workflows::accounts::UserId;
use crate::workflows::admissions::domain::{
    ApplicationStatus, DocumentRef, DocumentSlot, Gender, PersonalDetails, ProgramChoice,
    ProgramDetails, RegistrationNumber, StoredDocument,
};
use crate::workflows::admissions::lifecycle::{
    ReviewDecision, StepError, StepRecord, TransitionRejected, WizardStep,
};
use crate::workflows::test_support::fixed_now;

fn personal_details() -> PersonalDetails {
    PersonalDetails {
        date_of_birth: NaiveDate::from_ymd_opt(2004, 3, 12).expect("valid date"),
        gender: Gender::Male,
        nationality: "Ghanaian".to_string(),
        address: "4 Ring Road".to_string(),
        city: "Accra".to_string(),
        state: "Greater Accra".to_string(),
        postal_code: Some("GA-184".to_string()),
    }
}

fn program_details() -> ProgramDetails {
    ProgramDetails {
        program_choice: ProgramChoice::Diploma,
        course_of_study: "Nursing".to_string(),
    }
}

fn stored(name: &str) -> StoredDocument {
    StoredDocument {
        reference: DocumentRef(format!("uploads/test/{name}")),
        content_type: "application/pdf".to_string(),
        size_bytes: 10,
        uploaded_at: fixed_now(),
    }
}

#[test]
fn registration_number_has_year_and_uppercase_hex_suffix() {
    let pattern = Regex::new(r"^2025-[0-9A-F]{8}$").expect("pattern compiles");
    for _ in 0..20 {
        let number = RegistrationNumber::generate(fixed_now());
        assert!(pattern.is_match(number.as_str()), "unexpected {number}");
    }
}

#[test]
fn new_draft_starts_empty() {
    let application = draft_for(UserId::random(), fixed_now());
    assert_eq!(application.status(), ApplicationStatus::Draft);
    assert_eq!(application.completion_percentage(), 0);
    assert!(!application.can_submit());
    assert_eq!(application.next_step(), Some(WizardStep::PersonalInfo));
    assert!(application.submitted_at().is_none());
    assert!(application.reviewed_by().is_none());
    assert_eq!(application.created_at(), application.updated_at());
}

#[test]
fn completion_percentage_rounds_each_step_count() {
    let expected = [(0, 0u8), (1, 33), (2, 67), (3, 100)];
    for (completed, percentage) in expected {
        let application = application_with(
            ApplicationStatus::Draft,
            completed >= 1,
            completed >= 2,
            completed >= 3,
        );
        assert_eq!(application.completion_percentage(), percentage);
    }

    let out_of_order = application_with(ApplicationStatus::Draft, false, false, true);
    assert_eq!(out_of_order.completion_percentage(), 33);
}

#[test]
fn can_submit_only_for_complete_drafts() {
    for status in ApplicationStatus::ALL {
        for mask in 0u8..8 {
            let personal = mask & 0b001 != 0;
            let program = mask & 0b010 != 0;
            let documents = mask & 0b100 != 0;
            let application = application_with(status, personal, program, documents);

            let expected = status == ApplicationStatus::Draft && mask == 0b111;
            assert_eq!(
                application.can_submit(),
                expected,
                "status {status:?}, flags {personal}/{program}/{documents}"
            );
        }
    }
}

#[test]
fn record_step_raises_flags_and_keeps_data() {
    let mut application = draft_for(UserId::random(), fixed_now());
    let later = fixed_now() + Duration::minutes(5);

    application
        .record_step(StepRecord::PersonalInfo(personal_details()), later)
        .expect("draft accepts step");
    assert!(application.personal_info_completed());
    assert_eq!(application.personal(), Some(&personal_details()));
    assert_eq!(application.updated_at(), later);
    assert_eq!(application.completion_percentage(), 33);

    application
        .record_step(StepRecord::ProgramInfo(program_details()), later)
        .expect("draft accepts step");
    assert_eq!(application.program_choice(), Some(ProgramChoice::Diploma));
    assert_eq!(application.next_step(), Some(WizardStep::Documents));
}

#[test]
fn documents_flag_waits_for_all_required_slots() {
    let mut application = application_with(ApplicationStatus::Draft, true, true, false);

    let displaced = application
        .record_step(
            StepRecord::Documents(vec![
                (DocumentSlot::PassportPhoto, stored("photo.jpg")),
                (DocumentSlot::AdditionalDocument1, stored("extra.pdf")),
            ]),
            fixed_now(),
        )
        .expect("draft accepts step");
    assert!(displaced.is_empty());
    assert!(!application.documents_uploaded());
    assert_eq!(
        application.documents().missing_required(),
        vec![DocumentSlot::OlevelResult, DocumentSlot::BirthCertificate]
    );

    application
        .record_step(
            StepRecord::Documents(vec![
                (DocumentSlot::OlevelResult, stored("waec.pdf")),
                (DocumentSlot::BirthCertificate, stored("birth.pdf")),
            ]),
            fixed_now(),
        )
        .expect("draft accepts step");
    assert!(application.documents_uploaded());
    assert!(application.can_submit());
}

#[test]
fn replacing_a_document_hands_back_the_old_one() {
    let mut application = application_with(ApplicationStatus::Draft, true, true, false);
    application
        .record_step(
            StepRecord::Documents(vec![(DocumentSlot::PassportPhoto, stored("first.jpg"))]),
            fixed_now(),
        )
        .expect("draft accepts step");

    let displaced = application
        .record_step(
            StepRecord::Documents(vec![(DocumentSlot::PassportPhoto, stored("second.jpg"))]),
            fixed_now(),
        )
        .expect("draft accepts step");

    assert_eq!(displaced, vec![stored("first.jpg")]);
    assert_eq!(
        application
            .documents()
            .get(DocumentSlot::PassportPhoto)
            .map(|document| document.reference.clone()),
        Some(stored("second.jpg").reference)
    );
}

#[test]
fn completion_flags_never_go_back_down() {
    let mut application = application_with(ApplicationStatus::Draft, true, true, true);
    application
        .record_step(StepRecord::Documents(Vec::new()), fixed_now())
        .expect("draft accepts step");
    application
        .record_step(StepRecord::PersonalInfo(personal_details()), fixed_now())
        .expect("draft accepts step");

    assert!(application.personal_info_completed());
    assert!(application.program_info_completed());
    assert!(application.documents_uploaded());
    assert_eq!(application.completion_percentage(), 100);
}

#[test]
fn record_step_is_refused_once_submitted() {
    for status in [
        ApplicationStatus::Submitted,
        ApplicationStatus::UnderReview,
        ApplicationStatus::Approved,
        ApplicationStatus::Rejected,
    ] {
        let mut application = application_with(status, true, true, true);
        let before = application.clone();
        match application.record_step(StepRecord::ProgramInfo(program_details()), fixed_now()) {
            Err(StepError::ApplicationLocked { status: locked }) => assert_eq!(locked, status),
            other => panic!("expected locked application, got {other:?}"),
        }
        assert_eq!(application, before);
    }
}

#[test]
fn step_order_guard_names_the_missing_step() {
    let empty = application_with(ApplicationStatus::Draft, false, false, false);
    assert!(WizardStep::PersonalInfo.ensure_reachable(&empty).is_ok());

    let error = WizardStep::ProgramInfo
        .ensure_reachable(&empty)
        .expect_err("program info needs personal info");
    assert_eq!(
        error,
        StepError::StepOutOfOrder {
            step: WizardStep::ProgramInfo,
            required: WizardStep::PersonalInfo,
        }
    );
    assert_eq!(error.to_string(), "Please complete personal information first.");

    let personal_only = application_with(ApplicationStatus::Draft, true, false, false);
    let error = WizardStep::Documents
        .ensure_reachable(&personal_only)
        .expect_err("documents need program info");
    assert_eq!(error.to_string(), "Please complete program information first.");

    let skipped_personal = application_with(ApplicationStatus::Draft, false, true, false);
    assert!(matches!(
        WizardStep::Documents.ensure_reachable(&skipped_personal),
        Err(StepError::StepOutOfOrder {
            required: WizardStep::PersonalInfo,
            ..
        })
    ));
}

#[test]
fn submit_moves_complete_draft_once() {
    let mut application = application_with(ApplicationStatus::Draft, true, true, true);
    let at = fixed_now() + Duration::hours(1);

    assert!(application.submit(at));
    assert_eq!(application.status(), ApplicationStatus::Submitted);
    assert_eq!(application.submitted_at(), Some(at));
    assert!(!application.can_submit());

    let snapshot = application.clone();
    assert!(!application.submit(at + Duration::hours(1)));
    assert_eq!(application, snapshot);
}

#[test]
fn submit_refuses_incomplete_drafts_without_changes() {
    let mut application = application_with(ApplicationStatus::Draft, true, true, false);
    let snapshot = application.clone();
    assert!(!application.submit(fixed_now()));
    assert_eq!(application, snapshot);
}

#[test]
fn review_transitions_follow_the_status_table() {
    let reviewer = UserId::random();
    for decision in [
        ReviewDecision::MarkUnderReview,
        ReviewDecision::Approve,
        ReviewDecision::Reject,
    ] {
        for status in ApplicationStatus::ALL {
            let mut application = application_with(status, true, true, true);
            let snapshot = application.clone();
            let allowed = match decision {
                ReviewDecision::MarkUnderReview => status == ApplicationStatus::Submitted,
                _ => matches!(
                    status,
                    ApplicationStatus::Submitted | ApplicationStatus::UnderReview
                ),
            };

            let result = application.review(decision, reviewer, "checked", fixed_now());
            if allowed {
                assert!(result.is_ok(), "{decision:?} from {status:?}");
                assert_eq!(application.status(), decision.target());
            } else {
                assert_eq!(
                    result,
                    Err(TransitionRejected {
                        decision,
                        from: status
                    })
                );
                assert_eq!(application, snapshot, "{decision:?} from {status:?}");
            }
        }
    }
}

#[test]
fn review_steps_stamp_reviewer_and_time() {
    let marker = UserId::random();
    let reviewer = UserId::random();
    let marked_at = fixed_now() + Duration::days(1);
    let decided_at = fixed_now() + Duration::days(2);

    let mut application = application_with(ApplicationStatus::Submitted, true, true, true);
    application
        .mark_under_review(marker, marked_at)
        .expect("submitted may move under review");
    assert_eq!(application.status(), ApplicationStatus::UnderReview);
    assert_eq!(application.reviewed_by(), Some(marker));
    assert_eq!(application.reviewed_at(), Some(marked_at));
    assert_eq!(application.review_notes(), "");

    application
        .reject(reviewer, "Incomplete transcripts", decided_at)
        .expect("under review may be rejected");
    assert_eq!(application.status(), ApplicationStatus::Rejected);
    assert_eq!(application.reviewed_by(), Some(reviewer));
    assert_eq!(application.reviewed_at(), Some(decided_at));
    assert_eq!(application.review_notes(), "Incomplete transcripts");

    let error = application
        .approve(reviewer, "second thoughts", decided_at)
        .expect_err("rejected is terminal");
    assert_eq!(error.to_string(), "cannot approve an application that is Rejected");
}
