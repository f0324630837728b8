use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PageId(pub Uuid);

impl PageId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Page templates offered by the portal's content area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageKind {
    Home,
    Content,
    Timetable,
    OnlineLearning,
}

impl PageKind {
    pub const fn label(self) -> &'static str {
        match self {
            PageKind::Home => "Home Page",
            PageKind::Content => "Content Page",
            PageKind::Timetable => "Timetable Page",
            PageKind::OnlineLearning => "Online Learning Page",
        }
    }

    /// Only generic content pages index their body for search.
    pub const fn body_searchable(self) -> bool {
        matches!(self, PageKind::Content)
    }
}

/// A CMS page. `body` is stored verbatim and never rendered by the portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub slug: String,
    pub title: String,
    pub kind: PageKind,
    pub body: String,
    pub live: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Page {
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || (self.kind.body_searchable() && self.body.to_lowercase().contains(needle))
    }

    pub fn menu_entry(&self) -> MenuEntry {
        MenuEntry {
            slug: self.slug.clone(),
            title: self.title.clone(),
            kind: self.kind,
        }
    }
}

/// Staff input for a new page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPage {
    pub slug: String,
    pub title: String,
    pub kind: PageKind,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub live: bool,
}

/// Partial edit of an existing page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEdit {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub live: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuEntry {
    pub slug: String,
    pub title: String,
    pub kind: PageKind,
}

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_regex() -> &'static Regex {
    SLUG_RE.get_or_init(|| {
        Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$")
            .unwrap_or_else(|error| panic!("slug regex failed to compile: {error}"))
    })
}

/// Lowercase alphanumerics separated by single hyphens.
pub fn is_valid_slug(slug: &str) -> bool {
    slug_regex().is_match(slug)
}
