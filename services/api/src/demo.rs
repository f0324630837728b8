use crate::infra::PortalServices;
use admission_portal::error::AppError;
use admission_portal::workflows::accounts::{Registration, UserAccount};
use admission_portal::workflows::admissions::{
    AdmissionPolicy, ApplicationQuery, BulkAction, DocumentSlot, DocumentUpload, Gender,
    PersonalInfoForm, ProgramChoice, ProgramInfoForm,
};
use admission_portal::workflows::cms::{NewPage, PageKind};
use chrono::{Datelike, Local, NaiveDate};
use clap::Args;
use std::path::PathBuf;

const SAMPLE_APPLICANTS: [(&str, &str, &str); 4] = [
    ("Ada", "Obi", "Computer Science"),
    ("Emeka", "Okoro", "Civil Engineering"),
    ("Fatima", "Bello", "Nursing"),
    ("Tunde", "Adeyemi", "Accounting"),
];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of sample applicants to register (1-4)
    #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=4))]
    pub(crate) applicants: u8,
    /// Leave every application unreviewed.
    #[arg(long)]
    pub(crate) skip_review: bool,
    /// Write the staff CSV export to this path.
    #[arg(long)]
    pub(crate) export: Option<PathBuf>,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        applicants,
        skip_review,
        export,
    } = args;

    let services = PortalServices::in_memory(AdmissionPolicy::default());
    let registrar = services.bootstrap_staff("registrar@portal.test", "registrar2025")?;

    println!("School admission portal demo");
    seed_pages(&services, &registrar)?;
    let menu = services.content.menu()?;
    println!("Site menu:");
    for entry in &menu {
        println!("  - {} ({}) /{}", entry.title, entry.kind.label(), entry.slug);
    }

    let mut submitted = Vec::new();
    for (index, (first_name, last_name, course)) in SAMPLE_APPLICANTS
        .iter()
        .take(usize::from(applicants))
        .enumerate()
    {
        let applicant = services.accounts.register(Registration {
            first_name: first_name.to_string(),
            middle_name: None,
            last_name: last_name.to_string(),
            email: format!("{}@applicants.test", first_name.to_lowercase()),
            password: format!("{}2025", last_name.to_lowercase()),
            password_confirmation: format!("{}2025", last_name.to_lowercase()),
            username: None,
        })?;
        println!("\nApplicant {} registered as {}", applicant.full_name(), applicant.username);

        let dashboard = services.admissions.dashboard(&applicant)?;
        println!(
            "  {} created at {}%",
            dashboard.summary.registration_number, dashboard.summary.completion_percentage
        );

        // The last applicant stops after the program step to show a partial application.
        let complete = index + 1 < usize::from(applicants) || applicants == 1;
        walk_wizard(&services, &applicant, course, complete)?;

        if complete {
            let update = services.admissions.submit(&applicant)?;
            println!("  {}", update.outcome.message);
            submitted.push(update.application.id());
        }
    }

    if !skip_review {
        println!("\nStaff review by {}", registrar.username);
        if let Some((first, rest)) = submitted.split_first() {
            services.review.mark_under_review(&registrar, first)?;
            let update = services
                .review
                .approve(&registrar, first, "Meets every entry requirement")?;
            println!("  {}", update.outcome.message);

            let outcome =
                services
                    .review
                    .bulk(&registrar, BulkAction::MarkUnderReview, rest)?;
            println!("  {}", outcome.message);
        }
    }

    let rows = services
        .review
        .list(&registrar, &ApplicationQuery::default())?;
    println!("\nApplications ({}):", rows.len());
    for row in &rows {
        println!(
            "  - {} | {} | {} | {}% complete",
            row.registration_number, row.applicant_name, row.status_label, row.completion_percentage
        );
    }
    println!("Stored documents: {}", services.storage.object_count());

    if let Some(path) = export {
        let csv = services
            .review
            .export_csv(&registrar, &ApplicationQuery::default())?;
        std::fs::write(&path, csv)?;
        println!("CSV export written to {}", path.display());
    }

    Ok(())
}

fn seed_pages(services: &PortalServices, author: &UserAccount) -> Result<(), AppError> {
    let pages = [
        NewPage {
            slug: "home".to_string(),
            title: "Welcome".to_string(),
            kind: PageKind::Home,
            body: "Admissions for the new session are open.".to_string(),
            live: true,
        },
        NewPage {
            slug: "entry-requirements".to_string(),
            title: "Entry Requirements".to_string(),
            kind: PageKind::Content,
            body: "Five O'Level credits including English and Mathematics.".to_string(),
            live: true,
        },
        NewPage {
            slug: "exam-timetable".to_string(),
            title: "Screening Timetable".to_string(),
            kind: PageKind::Timetable,
            body: String::new(),
            live: false,
        },
    ];
    for page in pages {
        services.content.create_page(author, page)?;
    }
    Ok(())
}

fn walk_wizard(
    services: &PortalServices,
    applicant: &UserAccount,
    course: &str,
    with_documents: bool,
) -> Result<(), AppError> {
    let today = Local::now().date_naive();
    let personal = PersonalInfoForm {
        date_of_birth: NaiveDate::from_ymd_opt(today.year() - 19, 6, 1),
        gender: Some(Gender::Other),
        nationality: "Nigerian".to_string(),
        address: "1 University Road".to_string(),
        city: "Nsukka".to_string(),
        state: "Enugu".to_string(),
        postal_code: None,
    };
    let update = services
        .admissions
        .record_personal_info(applicant, personal)?;
    println!(
        "  {} ({}%)",
        update.outcome.message,
        update.application.completion_percentage()
    );

    let program = ProgramInfoForm {
        program_choice: Some(ProgramChoice::Undergraduate),
        course_of_study: course.to_string(),
    };
    let update = services.admissions.record_program_info(applicant, program)?;
    println!(
        "  {} ({}%)",
        update.outcome.message,
        update.application.completion_percentage()
    );

    if !with_documents {
        return Ok(());
    }

    let uploads = [
        (DocumentSlot::PassportPhoto, "passport.jpg"),
        (DocumentSlot::OlevelResult, "waec.pdf"),
        (DocumentSlot::BirthCertificate, "birth-certificate.pdf"),
    ]
    .into_iter()
    .map(|(slot, file_name)| DocumentUpload {
        slot,
        file_name: file_name.to_string(),
        bytes: vec![0u8; 16 * 1024],
    })
    .collect();
    let update = services.admissions.upload_documents(applicant, uploads)?;
    println!(
        "  {} ({}%)",
        update.outcome.message,
        update.application.completion_percentage()
    );
    Ok(())
}
