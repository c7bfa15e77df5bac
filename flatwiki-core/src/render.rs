//! Turns document text into a [`Page`].
//!
//! Rendering performs no I/O of its own and always succeeds for valid UTF-8.
//! Inclusion directives are resolved through the [`IncludeSource`] the caller
//! passes in.

use crate::config::RenderConfig;
use crate::error::{Result, WikiError};
use crate::frontmatter::parse_frontmatter;
use crate::links::LinkBuilder;
use crate::markdown::{IncludeSource, MarkdownProcessor, NoIncludes};
use crate::models::{Page, Tag};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Identity and provenance for a render
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderTarget<'a> {
    /// Page identity; `None` for previews
    pub slug: Option<&'a str>,

    /// Storage timestamp; `None` marks a page with no backing file
    pub last_changed: Option<DateTime<Utc>>,
}

pub struct Renderer {
    processor: MarkdownProcessor,
    links: Arc<dyn LinkBuilder>,
}

impl Renderer {
    pub fn new(settings: RenderConfig, links: Arc<dyn LinkBuilder>) -> Self {
        Self {
            processor: MarkdownProcessor::with_settings(settings),
            links,
        }
    }

    pub fn links(&self) -> &Arc<dyn LinkBuilder> {
        &self.links
    }

    /// Render text with no inclusion support.
    pub fn render(&self, source: &str, slug: Option<&str>) -> Page {
        self.render_with(
            source,
            RenderTarget {
                slug,
                last_changed: None,
            },
            &NoIncludes,
        )
    }

    /// Render raw bytes, failing only when they are not UTF-8.
    pub fn render_bytes(
        &self,
        bytes: &[u8],
        target: RenderTarget<'_>,
        includes: &dyn IncludeSource,
    ) -> Result<Page> {
        let text = std::str::from_utf8(bytes).map_err(|_| WikiError::Encoding {
            name: target.slug.unwrap_or("<input>").to_string(),
        })?;
        Ok(self.render_with(text, target, includes))
    }

    pub fn render_with(
        &self,
        source: &str,
        target: RenderTarget<'_>,
        includes: &dyn IncludeSource,
    ) -> Page {
        let text = source.strip_prefix('\u{feff}').unwrap_or(source);
        let text = if text.contains('\r') {
            text.replace("\r\n", "\n")
        } else {
            text.to_string()
        };

        let doc = parse_frontmatter(&text);
        let rendered = self
            .processor
            .convert_page(doc.body, target.slug, self.links.as_ref(), includes);

        let mut diagnostics = doc.diagnostics;
        diagnostics.extend(rendered.diagnostics);

        let slug = target.slug.unwrap_or_default().to_string();
        let (url, edit_url) = if slug.is_empty() {
            (String::new(), String::new())
        } else {
            (self.links.page_url(&slug), self.links.edit_url(&slug))
        };

        Page {
            title: doc.frontmatter.title,
            tags: self.materialize_tags(&doc.frontmatter.tags),
            summary: doc.frontmatter.summary,
            raw_source: source.to_string(),
            html: rendered.html,
            toc_html: rendered.toc_html,
            last_changed: target.last_changed.unwrap_or_else(Utc::now),
            is_draft: target.last_changed.is_none(),
            url,
            edit_url,
            slug,
            outgoing_links: rendered.outgoing_links,
            attachments: rendered.attachments,
            diagnostics,
        }
    }

    /// Attach a listing link to each tag, keeping source order.
    pub fn materialize_tags(&self, names: &[String]) -> Vec<Tag> {
        names
            .iter()
            .map(|name| Tag {
                name: name.clone(),
                url: self.links.tag_url(name),
            })
            .collect()
    }
}
