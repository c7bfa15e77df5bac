//! Page storage: one `.md` file per page under a root directory.

use crate::config::WikiConfig;
use crate::error::{Result, WikiError};
use crate::fsutil::{modified_at, validate_segment, write_atomic};
use crate::links::PathLinkBuilder;
use crate::markdown::IncludeSource;
use crate::models::{Frontmatter, Page};
use crate::render::{RenderTarget, Renderer};
use std::collections::BTreeSet;
use std::fs;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub const PAGE_EXTENSION: &str = "md";


/// Tag names a page must share at least one of
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagFilter(BTreeSet<String>);

impl TagFilter {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }

    pub fn matches(&self, page: &Page) -> bool {
        page.tags.iter().any(|t| self.0.contains(&t.name))
    }
}

impl<S: Into<String>> FromIterator<S> for TagFilter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

pub struct PageStore {
    root: PathBuf,
    renderer: Renderer,
    template: Option<String>,
}

impl PageStore {
    pub fn new<P: Into<PathBuf>>(root: P, renderer: Renderer) -> Self {
        let root = root.into();
        tracing::info!("Page store at {:?}", root);
        Self {
            root,
            renderer,
            template: None,
        }
    }

    pub fn from_config(config: &WikiConfig) -> Self {
        let links = Arc::new(PathLinkBuilder::new(&config.base_url));
        let renderer = Renderer::new(config.render.clone(), links);
        let store = Self::new(config.pages_dir(), renderer);
        match &config.new_page_template {
            Some(template) => store.with_template(template),
            None => store,
        }
    }

    /// Replace the draft template (`{slug}` is substituted verbatim).
    pub fn with_template(mut self, template: &str) -> Self {
        self.template = Some(template.to_string());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    fn path_for(&self, slug: &str) -> Result<PathBuf> {
        let slug = validate_segment(slug)?;
        Ok(self.root.join(format!("{slug}.{PAGE_EXTENSION}")))
    }

    pub fn exists(&self, slug: &str) -> bool {
        match self.path_for(slug) {
            Ok(path) => path.is_file(),
            Err(e) => {
                tracing::debug!("exists({:?}): {}", slug, e);
                false
            }
        }
    }

    /// Load and render the page stored under `slug`.
    pub fn load(&self, slug: &str) -> Result<Page> {
        let path = self.path_for(slug)?;
        let (bytes, metadata) = match read_file(&path) {
            Ok(read) => read,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WikiError::PageNotFound(slug.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        if !metadata.is_file() {
            return Err(WikiError::PageNotFound(slug.to_string()));
        }

        tracing::debug!("Loaded page {:?} ({} bytes)", slug, bytes.len());
        let target = RenderTarget {
            slug: Some(slug),
            last_changed: Some(modified_at(&metadata)),
        };
        self.renderer.render_bytes(&bytes, target, self)
    }

    /// The stored page, or a fresh draft when nothing is stored yet.
    pub fn load_or_draft(&self, slug: &str) -> Result<Page> {
        match self.load(slug) {
            Err(WikiError::PageNotFound(_)) => self.new_draft(slug),
            other => other,
        }
    }

    /// Store `raw_source` under `slug`, replacing any existing page.
    pub fn save(&self, slug: &str, raw_source: &str) -> Result<()> {
        let path = self.path_for(slug)?;
        write_atomic(&path, raw_source.as_bytes())?;
        tracing::debug!("Saved page {:?} ({} bytes)", slug, raw_source.len());
        Ok(())
    }

    pub fn delete(&self, slug: &str) -> Result<()> {
        let path = self.path_for(slug)?;
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!("Deleted page {:?}", slug);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(WikiError::PageNotFound(slug.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Pages carrying any tag in `filter`, or all pages when `filter` is `None`.
    ///
    /// Nothing is read until the returned set is iterated, and every
    /// iteration lists the directory again.
    pub fn enumerate(&self, filter: Option<TagFilter>) -> PageSet<'_> {
        PageSet {
            store: self,
            filter,
        }
    }

    /// Sorted slugs of every stored page.
    pub fn slugs(&self) -> Vec<String> {
        SlugListing::new(&self.root).collect()
    }

    /// An unsaved page prefilled with the draft template.
    pub fn new_draft(&self, slug: &str) -> Result<Page> {
        let slug = validate_segment(slug)?;
        let body = match &self.template {
            Some(template) => template.replace("{slug}", slug),
            None => default_draft(slug),
        };
        Ok(self.renderer.render_with(
            &body,
            RenderTarget {
                slug: Some(slug),
                last_changed: None,
            },
            self,
        ))
    }

    /// Render unsaved text, resolving includes against this store.
    pub fn preview(&self, raw_source: &str) -> Page {
        self.renderer
            .render_with(raw_source, RenderTarget::default(), self)
    }
}

/// Front matter header for a new page, with the slug as its title.
fn default_draft(slug: &str) -> String {
    let header = Frontmatter {
        title: slug.to_string(),
        ..Frontmatter::default()
    };
    let yaml = serde_yaml::to_string(&header).unwrap_or_default();
    format!("---\n{yaml}---\n\n")
}

/// Includes name other pages only: `{!intro!}` or `{!intro.md!}`.
/// Nested paths are rejected, which keeps attachments and anything
/// else under the root out of page bodies.
impl IncludeSource for PageStore {
    fn read_include(&self, name: &str) -> Result<String> {
        let slug = name
            .strip_suffix(&format!(".{PAGE_EXTENSION}"))
            .unwrap_or(name);
        let path = self.path_for(slug)?;
        if !path.is_file() {
            return Err(WikiError::PageNotFound(name.to_string()));
        }

        let bytes = fs::read(&path)?;
        String::from_utf8(bytes).map_err(|_| WikiError::Encoding {
            name: name.to_string(),
        })
    }
}

fn read_file(path: &Path) -> std::io::Result<(Vec<u8>, fs::Metadata)> {
    let mut file = fs::File::open(path)?;
    let metadata = file.metadata()?;
    let mut bytes = Vec::with_capacity(metadata.len() as usize);
    if metadata.is_file() {
        file.read_to_end(&mut bytes)?;
    }
    Ok((bytes, metadata))
}

/// Pages matching a filter; iterate as often as needed.
pub struct PageSet<'a> {
    store: &'a PageStore,
    filter: Option<TagFilter>,
}

impl<'a> PageSet<'a> {
    pub fn iter(&self) -> Pages<'a> {
        Pages {
            store: self.store,
            filter: self.filter.clone(),
            slugs: None,
        }
    }
}

impl<'a> IntoIterator for PageSet<'a> {
    type Item = Page;
    type IntoIter = Pages<'a>;

    fn into_iter(self) -> Pages<'a> {
        Pages {
            store: self.store,
            filter: self.filter,
            slugs: None,
        }
    }
}

impl<'a> IntoIterator for &PageSet<'a> {
    type Item = Page;
    type IntoIter = Pages<'a>;

    fn into_iter(self) -> Pages<'a> {
        self.iter()
    }
}

/// One pass over the stored pages.
pub struct Pages<'a> {
    store: &'a PageStore,
    filter: Option<TagFilter>,
    slugs: Option<SlugListing>,
}

impl Iterator for Pages<'_> {
    type Item = Page;

    fn next(&mut self) -> Option<Page> {
        let root = &self.store.root;
        let slugs = self.slugs.get_or_insert_with(|| SlugListing::new(root));

        for slug in slugs.by_ref() {
            match self.store.load(&slug) {
                Ok(page) => {
                    if self.filter.as_ref().map_or(true, |f| f.matches(&page)) {
                        return Some(page);
                    }
                }
                // Deleted or unreadable since it was listed
                Err(e) => tracing::warn!("Skipping page {:?}: {}", slug, e),
            }
        }
        None
    }
}

/// Streams page slugs from a directory in filename order.
struct SlugListing {
    walker: Option<walkdir::IntoIter>,
}

impl SlugListing {
    fn new(root: &Path) -> Self {
        let walker = root.is_dir().then(|| {
            WalkDir::new(root)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
        });
        Self { walker }
    }
}

impl Iterator for SlugListing {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        let walker = self.walker.as_mut()?;
        for entry in walker.by_ref() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(PAGE_EXTENSION) {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if validate_segment(slug).is_ok() {
                return Some(slug.to_string());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store(root: &Path) -> PageStore {
        PageStore::from_config(&WikiConfig::with_paths(root, root.join("_files")))
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        assert!(!store.exists("intro"));
        store.save("intro", "---\ntitle: Intro\n---\nHello").unwrap();
        assert!(store.exists("intro"));

        let page = store.load("intro").unwrap();
        assert_eq!(page.slug, "intro");
        assert_eq!(page.title, "Intro");
        assert!(!page.is_draft);
        assert!(page.html.contains("<p>Hello</p>"));
    }

    #[test]
    fn test_traversal_is_rejected_before_io() {
        let dir = tempdir().unwrap();
        let store = store(&dir.path().join("pages"));

        for slug in ["../escape", "a/b", "..", ""] {
            assert!(matches!(
                store.save(slug, "x"),
                Err(WikiError::InvalidIdentity { .. })
            ));
            assert!(matches!(
                store.load(slug),
                Err(WikiError::InvalidIdentity { .. })
            ));
            assert!(!store.exists(slug));
        }
        assert!(!dir.path().join("escape.md").exists());
        assert!(!dir.path().join("pages").exists());
    }

    #[test]
    fn test_enumerate_skips_foreign_files() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.save("b", "B").unwrap();
        store.save("a", "A").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a page").unwrap();
        fs::write(dir.path().join(".hidden.md"), "hidden").unwrap();
        fs::create_dir(dir.path().join("sub.md")).unwrap();

        let slugs: Vec<_> = store.enumerate(None).into_iter().map(|p| p.slug).collect();
        assert_eq!(slugs, vec!["a", "b"]);
        assert_eq!(store.slugs(), vec!["a", "b"]);
    }

    #[test]
    fn test_enumerate_is_restartable_and_fresh() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.save("one", "1").unwrap();

        let all = store.enumerate(None);
        assert_eq!(all.iter().count(), 1);
        store.save("two", "2").unwrap();
        assert_eq!((&all).into_iter().count(), 2);
        assert_eq!(all.iter().count(), 2);
    }

    #[test]
    fn test_missing_root_enumerates_nothing() {
        let dir = tempdir().unwrap();
        let store = store(&dir.path().join("absent"));
        assert_eq!(store.enumerate(None).into_iter().count(), 0);
        assert!(matches!(store.load("x"), Err(WikiError::PageNotFound(_))));
    }

    #[test]
    fn test_new_draft_uses_template() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        let draft = store.new_draft("my-page").unwrap();
        assert!(draft.is_draft);
        assert_eq!(draft.title, "my-page");
        assert!(draft.raw_source.starts_with("---\ntitle: my-page\n"));
        assert!(!store.exists("my-page"));

        let custom = store.with_template("# {slug}\n");
        let draft = custom.new_draft("x").unwrap();
        assert_eq!(draft.raw_source, "# x\n");
    }

    #[test]
    fn test_load_or_draft() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        assert!(store.load_or_draft("later").unwrap().is_draft);
        store.save("later", "now").unwrap();
        assert!(!store.load_or_draft("later").unwrap().is_draft);
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.save("gone", "x").unwrap();
        store.delete("gone").unwrap();
        assert!(!store.exists("gone"));
        assert!(matches!(store.delete("gone"), Err(WikiError::PageNotFound(_))));
    }

    #[test]
    fn test_includes_resolve_against_root() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.save("snippet", "---\ntitle: Snippet\n---\nShared *text*").unwrap();
        store.save("host", "Before\n\n{!snippet.md!}\n\n{!missing!}\n").unwrap();

        let page = store.load("host").unwrap();
        assert!(page.html.contains("<em>text</em>"));
        assert!(page.html.contains("include-error"));
        assert_eq!(page.diagnostics.len(), 1);
        // the stored source is untouched
        assert!(page.raw_source.contains("{!snippet.md!}"));
    }

    #[test]
    fn test_self_include_renders_body_once() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.save("loop", "SELF\n\n{!loop!}\n").unwrap();

        let page = store.load("loop").unwrap();
        assert_eq!(page.html.matches("SELF").count(), 1);
        assert_eq!(page.diagnostics.len(), 1);
        assert_eq!(page.diagnostics[0].code, "include.cycle");
    }

    #[test]
    fn test_mutual_includes_render_each_body_once() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        store.save("a", "ALPHA\n\n{!b!}\n").unwrap();
        store.save("b", "BETA\n\n{!a.md!}\n").unwrap();

        for slug in ["a", "b"] {
            let page = store.load(slug).unwrap();
            assert_eq!(page.html.matches("ALPHA").count(), 1, "{slug}");
            assert_eq!(page.html.matches("BETA").count(), 1, "{slug}");
            assert_eq!(page.diagnostics[0].code, "include.cycle");
        }
    }

    #[test]
    fn test_includes_cannot_reach_attachments() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let files = crate::files::FileStore::new(
            dir.path().join("_files"),
            Arc::new(PathLinkBuilder::default()),
        );
        files.put("secret.txt", b"TOP-SECRET attachment body").unwrap();
        files.put("notes.md", b"ATTACHED markdown").unwrap();
        fs::write(dir.path().join("plain.txt"), "LOOSE text").unwrap();
        store
            .save("host", "{!_files/secret.txt!}\n\n{!_files/notes.md!}\n\n{!plain.txt!}\n")
            .unwrap();

        let page = store.load("host").unwrap();
        assert!(!page.html.contains("TOP-SECRET"));
        assert!(!page.html.contains("ATTACHED"));
        assert!(!page.html.contains("LOOSE"));
        let codes: Vec<_> = page.diagnostics.iter().map(|d| d.code.as_str()).collect();
        assert_eq!(codes, vec!["include.invalid", "include.invalid", "include.missing"]);
    }

    #[test]
    fn test_default_draft_quotes_awkward_slugs() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());

        for slug in ["a: b", "null", "true", "#hash", "it's \"quoted\""] {
            let draft = store.new_draft(slug).unwrap();
            assert_eq!(draft.title, slug);
            assert!(draft.diagnostics.is_empty(), "{slug}: {:?}", draft.diagnostics);
            assert!(draft.tags.is_empty());
        }
    }

    #[test]
    fn test_preview_does_not_touch_storage() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        let page = store.preview("---\ntitle: Preview\n---\nBody");
        assert_eq!(page.title, "Preview");
        assert!(page.is_draft);
        assert!(store.slugs().is_empty());
    }

    #[test]
    fn test_invalid_utf8_page() {
        let dir = tempdir().unwrap();
        let store = store(dir.path());
        fs::write(dir.path().join("binary.md"), [0xff, 0xfe, 0x00]).unwrap();
        assert!(matches!(store.load("binary"), Err(WikiError::Encoding { .. })));
        // enumeration skips it instead of failing
        assert_eq!(store.enumerate(None).into_iter().count(), 0);
    }
}
