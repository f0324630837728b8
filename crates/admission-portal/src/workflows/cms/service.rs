use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::domain::{is_valid_slug, MenuEntry, NewPage, Page, PageEdit, PageId};
use super::repository::PageRepository;
use crate::workflows::accounts::UserAccount;
use crate::workflows::persistence::RepositoryError;

/// Service managing portal pages: staff authoring and public lookup.
pub struct ContentService<P> {
    pages: Arc<P>,
}

impl<P> ContentService<P>
where
    P: PageRepository + 'static,
{
    pub fn new(pages: Arc<P>) -> Self {
        Self { pages }
    }

    pub fn create_page(
        &self,
        author: &UserAccount,
        new_page: NewPage,
    ) -> Result<Page, ContentServiceError> {
        ensure_staff(author)?;
        let slug = new_page.slug.trim().to_string();
        if !is_valid_slug(&slug) {
            return Err(ContentServiceError::InvalidSlug { slug });
        }
        let title = required_title(&new_page.title)?;

        let now = Utc::now();
        let page = Page {
            id: PageId::random(),
            slug,
            title,
            kind: new_page.kind,
            body: new_page.body,
            live: new_page.live,
            created_at: now,
            updated_at: now,
        };

        let stored = self.pages.insert(page).map_err(|error| {
            if error.conflict_on("slug") {
                ContentServiceError::DuplicateSlug
            } else {
                error.into()
            }
        })?;
        info!(
            slug = %stored.slug,
            kind = stored.kind.label(),
            live = stored.live,
            author = %author.username,
            "page created"
        );
        Ok(stored)
    }

    /// Apply a partial edit; publishing and unpublishing go through the `live` field.
    pub fn edit_page(
        &self,
        author: &UserAccount,
        slug: &str,
        edit: PageEdit,
    ) -> Result<Page, ContentServiceError> {
        ensure_staff(author)?;
        let mut page = self
            .pages
            .find_by_slug(slug)?
            .ok_or(RepositoryError::NotFound)?;

        if let Some(title) = edit.title {
            page.title = required_title(&title)?;
        }
        if let Some(body) = edit.body {
            page.body = body;
        }
        if let Some(live) = edit.live {
            if live != page.live {
                info!(slug = %page.slug, live, "page publication changed");
            }
            page.live = live;
        }
        page.updated_at = Utc::now();

        self.pages.update(page.clone())?;
        Ok(page)
    }

    pub fn publish(&self, author: &UserAccount, slug: &str) -> Result<Page, ContentServiceError> {
        self.edit_page(
            author,
            slug,
            PageEdit {
                live: Some(true),
                ..PageEdit::default()
            },
        )
    }

    pub fn unpublish(&self, author: &UserAccount, slug: &str) -> Result<Page, ContentServiceError> {
        self.edit_page(
            author,
            slug,
            PageEdit {
                live: Some(false),
                ..PageEdit::default()
            },
        )
    }

    /// A live page by slug; drafts are reported as missing.
    pub fn live_page(&self, slug: &str) -> Result<Page, ContentServiceError> {
        self.pages
            .find_by_slug(slug)?
            .filter(|page| page.live)
            .ok_or_else(|| RepositoryError::NotFound.into())
    }

    /// Live pages ordered by kind then title, optionally narrowed by a case-insensitive search.
    pub fn live_pages(&self, search: Option<&str>) -> Result<Vec<Page>, ContentServiceError> {
        let needle = search
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
            .map(str::to_lowercase);

        let mut pages: Vec<Page> = self
            .pages
            .all()?
            .into_iter()
            .filter(|page| page.live)
            .filter(|page| needle.as_deref().map_or(true, |needle| page.matches(needle)))
            .collect();
        pages.sort_by(|left, right| {
            left.kind
                .cmp(&right.kind)
                .then_with(|| left.title.cmp(&right.title))
        });
        Ok(pages)
    }

    pub fn menu(&self) -> Result<Vec<MenuEntry>, ContentServiceError> {
        Ok(self
            .live_pages(None)?
            .iter()
            .map(Page::menu_entry)
            .collect())
    }
}

fn required_title(raw: &str) -> Result<String, ContentServiceError> {
    let title = raw.trim();
    if title.is_empty() {
        Err(ContentServiceError::MissingTitle)
    } else {
        Ok(title.to_string())
    }
}

fn ensure_staff(user: &UserAccount) -> Result<(), ContentServiceError> {
    if user.is_staff {
        Ok(())
    } else {
        warn!(user = %user.username, "page authoring refused");
        Err(ContentServiceError::Forbidden)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ContentServiceError {
    #[error("Slug '{slug}' may only contain lowercase letters, numbers and hyphens.")]
    InvalidSlug { slug: String },
    #[error("This field is required.")]
    MissingTitle,
    #[error("A page with this slug already exists.")]
    DuplicateSlug,
    #[error("staff access required")]
    Forbidden,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ContentServiceError {
    pub fn field(&self) -> Option<&'static str> {
        match self {
            ContentServiceError::InvalidSlug { .. } | ContentServiceError::DuplicateSlug => {
                Some("slug")
            }
            ContentServiceError::MissingTitle => Some("title"),
            _ => None,
        }
    }
}
