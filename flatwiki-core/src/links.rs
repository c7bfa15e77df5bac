//! Link construction, supplied by whatever layer owns routing.

use crate::config::normalize_base_url;
use urlencoding::encode;

/// Builds navigable references for the entities the core produces.
pub trait LinkBuilder: Send + Sync {
    /// View page `slug`.
    fn page_url(&self, slug: &str) -> String;

    /// Edit page `slug`.
    fn edit_url(&self, slug: &str) -> String;

    /// List pages carrying `tag`.
    fn tag_url(&self, tag: &str) -> String;

    /// View attachment `name`.
    fn file_url(&self, name: &str) -> String;
}

/// Path-based routes under a base URL:
/// `/slug/`, `/slug/_edit`, `/_tags/tag`, `/_files/name`.
#[derive(Debug, Clone)]
pub struct PathLinkBuilder {
    base_url: String,
}

impl PathLinkBuilder {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
        }
    }
}

impl Default for PathLinkBuilder {
    fn default() -> Self {
        Self::new("/")
    }
}

impl LinkBuilder for PathLinkBuilder {
    fn page_url(&self, slug: &str) -> String {
        format!("{}{}/", self.base_url, encode(slug))
    }

    fn edit_url(&self, slug: &str) -> String {
        format!("{}{}/_edit", self.base_url, encode(slug))
    }

    fn tag_url(&self, tag: &str) -> String {
        format!("{}_tags/{}", self.base_url, encode(tag))
    }

    fn file_url(&self, name: &str) -> String {
        format!("{}_files/{}", self.base_url, encode(name))
    }
}
