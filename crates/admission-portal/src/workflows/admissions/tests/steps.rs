use chrono::NaiveDate;

use crate::config::AdmissionsConfig;
use crate::workflows::admissions::domain::{Gender, ProgramChoice};
use crate::workflows::admissions::steps::{
    age_on, AdmissionPolicy, PersonalInfoForm, ProgramInfoForm, StepGuard, StepValidationError,
};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

fn today() -> NaiveDate {
    date(2025, 9, 1)
}

fn form_born(date_of_birth: NaiveDate) -> PersonalInfoForm {
    PersonalInfoForm {
        date_of_birth: Some(date_of_birth),
        gender: Some(Gender::Other),
        nationality: " Kenyan ".to_string(),
        address: "77 Moi Avenue".to_string(),
        city: "Nairobi".to_string(),
        state: "Nairobi County".to_string(),
        postal_code: Some("   ".to_string()),
    }
}

#[test]
fn age_counts_whole_years() {
    assert_eq!(age_on(date(2010, 9, 1), today()), 15);
    assert_eq!(age_on(date(2010, 9, 2), today()), 14);
    assert_eq!(age_on(date(2008, 2, 29), date(2025, 2, 28)), 16);
    assert_eq!(age_on(date(2008, 2, 29), date(2025, 3, 1)), 17);
}

#[test]
fn personal_info_trims_text_and_drops_blank_postal_code() {
    let guard = StepGuard::default();
    let details = guard
        .personal_info(form_born(date(2005, 6, 30)), today())
        .expect("valid form");

    assert_eq!(details.nationality, "Kenyan");
    assert_eq!(details.postal_code, None);
    assert_eq!(details.gender, Gender::Other);
}

#[test]
fn personal_info_age_bounds_are_inclusive() {
    let guard = StepGuard::default();

    assert!(guard
        .personal_info(form_born(date(2010, 9, 1)), today())
        .is_ok());
    assert_eq!(
        guard.personal_info(form_born(date(2010, 9, 2)), today()),
        Err(StepValidationError::ApplicantTooYoung { min: 15 })
    );

    assert!(guard
        .personal_info(form_born(date(1925, 9, 1)), today())
        .is_ok());
    assert_eq!(
        guard.personal_info(form_born(date(1924, 9, 1)), today()),
        Err(StepValidationError::ApplicantTooOld { max: 100 })
    );

    let error = guard
        .personal_info(form_born(date(2025, 9, 2)), today())
        .expect_err("future birth date");
    assert_eq!(error, StepValidationError::InvalidDateOfBirth);
    assert_eq!(error.field(), "date_of_birth");
}

#[test]
fn personal_info_requires_each_mandatory_field() {
    let guard = StepGuard::default();
    let cases: [(&str, fn(&mut PersonalInfoForm)); 6] = [
        ("date_of_birth", |form| form.date_of_birth = None),
        ("gender", |form| form.gender = None),
        ("nationality", |form| form.nationality = "  ".to_string()),
        ("address", |form| form.address.clear()),
        ("city", |form| form.city.clear()),
        ("state", |form| form.state = "\t".to_string()),
    ];

    for (field, blank) in cases {
        let mut form = form_born(date(2001, 1, 1));
        blank(&mut form);
        let error = guard
            .personal_info(form, today())
            .expect_err("missing field rejected");
        assert_eq!(error, StepValidationError::MissingField { field });
        assert_eq!(error.to_string(), "This field is required.");
    }
}

#[test]
fn program_info_requires_choice_and_course() {
    let guard = StepGuard::default();

    let details = guard
        .program_info(ProgramInfoForm {
            program_choice: Some(ProgramChoice::Postgraduate),
            course_of_study: "  Public Health ".to_string(),
        })
        .expect("valid form");
    assert_eq!(details.course_of_study, "Public Health");

    assert_eq!(
        guard.program_info(ProgramInfoForm {
            program_choice: None,
            course_of_study: "Law".to_string(),
        }),
        Err(StepValidationError::MissingField {
            field: "program_choice"
        })
    );

    let error = guard
        .program_info(ProgramInfoForm {
            program_choice: Some(ProgramChoice::Certificate),
            course_of_study: "   ".to_string(),
        })
        .expect_err("blank course rejected");
    assert_eq!(error, StepValidationError::MissingCourseOfStudy);
    assert_eq!(
        error.to_string(),
        "Please specify your desired course of study."
    );
}

#[test]
fn policy_follows_configuration_and_repairs_bad_values() {
    let config = AdmissionsConfig {
        upload_max_bytes: 1024,
        additional_upload_max_bytes: 0,
        min_applicant_age: 16,
        max_applicant_age: 60,
    };
    let policy = AdmissionPolicy::from(&config);
    assert_eq!(policy.min_applicant_age(), 16);
    assert_eq!(policy.max_applicant_age(), 60);
    assert_eq!(policy.largest_upload(), 10 * 1024 * 1024);

    let inverted = AdmissionPolicy::new(1024, 2048, 80, 20);
    assert_eq!(inverted.min_applicant_age(), 15);
    assert_eq!(inverted.max_applicant_age(), 100);

    let guard = StepGuard::with_policy(policy);
    assert_eq!(
        guard.personal_info(form_born(date(2010, 1, 1)), today()),
        Err(StepValidationError::ApplicantTooYoung { min: 16 })
    );
}
