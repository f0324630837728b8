//! Portal content pages: home, generic content, timetable and online-learning pages.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{is_valid_slug, MenuEntry, NewPage, Page, PageEdit, PageId, PageKind};
pub use repository::PageRepository;
pub use router::{content_error_response, content_router, ContentState};
pub use service::{ContentService, ContentServiceError};
