use std::sync::Arc;

use crate::workflows::accounts::UserAccount;
use crate::workflows::cms::domain::{NewPage, Page, PageKind};
use crate::workflows::cms::service::ContentService;
use crate::workflows::test_support::{staff, MemoryPages};

pub(super) fn editor() -> UserAccount {
    staff("webmaster@school.edu")
}

pub(super) fn new_page(slug: &str, title: &str, kind: PageKind, body: &str) -> NewPage {
    NewPage {
        slug: slug.to_string(),
        title: title.to_string(),
        kind,
        body: body.to_string(),
        live: true,
    }
}

pub(super) fn build_content() -> (ContentService<MemoryPages>, Arc<MemoryPages>) {
    let pages = Arc::new(MemoryPages::default());
    (ContentService::new(pages.clone()), pages)
}

/// Seeds one page of every kind; `exam-timetable` stays unpublished.
pub(super) fn seeded_content() -> ContentService<MemoryPages> {
    let (content, _) = build_content();
    let author = editor();
    let pages = [
        new_page("home", "Welcome", PageKind::Home, "Admissions are open"),
        new_page(
            "fees",
            "School Fees",
            PageKind::Content,
            "Tuition is payable in two instalments",
        ),
        new_page(
            "virtual-classroom",
            "Online Learning",
            PageKind::OnlineLearning,
            "Tuition resources",
        ),
        new_page(
            "lecture-timetable",
            "Lecture Timetable",
            PageKind::Timetable,
            "",
        ),
    ];
    for page in pages {
        content.create_page(&author, page).expect("seed page");
    }
    let mut draft = new_page("exam-timetable", "Exam Timetable", PageKind::Timetable, "");
    draft.live = false;
    content.create_page(&author, draft).expect("seed draft");
    content
}

pub(super) fn slugs(pages: &[Page]) -> Vec<&str> {
    pages.iter().map(|page| page.slug.as_str()).collect()
}
