//! Content model structs for pages, tags, and attachments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Front matter fields the wiki understands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub summary: String,
}

/// A tag as written in front matter, with a link to its page listing
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Info,
    Warning,
}

/// Something that degraded during rendering without failing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub code: String,
    pub message: String,
    pub severity: DiagnosticSeverity,
}

impl Diagnostic {
    pub fn warning(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            severity: DiagnosticSeverity::Warning,
        }
    }
}

/// A rendered wiki page
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Identity, the filename without `.md` (empty for previews)
    pub slug: String,

    /// Title from front matter, may be empty
    pub title: String,

    /// Document text exactly as stored
    pub raw_source: String,

    /// Rendered HTML fragment
    pub html: String,

    /// Table of contents HTML
    pub toc_html: Option<String>,

    /// Tags in source order
    pub tags: Vec<Tag>,

    pub summary: String,

    /// File modification time, or creation time for drafts and previews
    pub last_changed: DateTime<Utc>,

    /// Not backed by storage
    pub is_draft: bool,

    pub url: String,
    pub edit_url: String,

    /// Slugs of pages this page links to via wikilinks
    pub outgoing_links: Vec<String>,

    /// Attachment names referenced from the body
    pub attachments: Vec<String>,

    /// Non-fatal problems found while rendering
    pub diagnostics: Vec<Diagnostic>,
}

impl Page {
    /// Title for display, falling back to the slug
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.slug
        } else {
            &self.title
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }
}

/// Metadata for a stored attachment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiFile {
    /// Stored filename, used verbatim
    pub name: String,

    /// Inferred from the extension
    pub mimetype: Option<String>,

    pub is_image: bool,

    pub size: u64,

    pub last_changed: DateTime<Utc>,

    pub url: String,
}
