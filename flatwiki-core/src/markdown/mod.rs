//! Markdown processing pipeline with custom extensions.
//!
//! Order of passes:
//! 1. `{!name!}` inclusion (text level, before parsing)
//! 2. `!!! kind` admonitions (text level)
//! 3. CommonMark parse with tables, footnotes, definition lists, task lists
//! 4. GitHub alert blockquotes, wikilinks, attachment links
//! 5. heading ids, `[TOC]` marker
//! 6. syntax highlighting, checklists

pub mod admonitions;
pub mod attachments;
pub mod checklist;
pub mod highlight;
pub mod include;
pub mod wikilinks;

use crate::config::RenderConfig;
use crate::links::{LinkBuilder, PathLinkBuilder};
use crate::models::Diagnostic;
use crate::slug::slugify;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};
use std::collections::HashSet;

pub use admonitions::{expand_admonitions, AlertTransformer};
pub use attachments::AttachmentLinkTransformer;
pub use checklist::ChecklistTransformer;
pub use highlight::HighlightTransformer;
pub use include::{IncludeExpander, IncludeSource, NoIncludes};
pub use wikilinks::WikilinkTransformer;

#[derive(Debug, Clone)]
struct TocItem {
    level: u32,
    title: String,
    id: String,
}

/// Output of a single markdown conversion
#[derive(Debug, Clone, Default)]
pub struct Rendered {
    pub html: String,
    pub toc_html: Option<String>,
    pub outgoing_links: Vec<String>,
    pub attachments: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Markdown processor with custom extensions
pub struct MarkdownProcessor {
    options: Options,
    settings: RenderConfig,
}

impl MarkdownProcessor {
    pub fn new() -> Self {
        Self::with_settings(RenderConfig::default())
    }

    pub fn with_settings(settings: RenderConfig) -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_DEFINITION_LIST);
        options.insert(Options::ENABLE_GFM);

        Self { options, settings }
    }

    /// Convert markdown to HTML with all custom transforms
    pub fn convert(
        &self,
        markdown: &str,
        links: &dyn LinkBuilder,
        includes: &dyn IncludeSource,
    ) -> Rendered {
        self.convert_page(markdown, None, links, includes)
    }

    /// Like [`convert`](Self::convert), for the stored page `slug`, which
    /// inclusion directives may not pull back into itself.
    pub fn convert_page(
        &self,
        markdown: &str,
        slug: Option<&str>,
        links: &dyn LinkBuilder,
        includes: &dyn IncludeSource,
    ) -> Rendered {
        let mut diagnostics = Vec::new();

        // Splice included documents before anything else sees the text
        let expander = IncludeExpander::new(includes, self.settings.max_include_depth);
        let expanded = expander.expand(markdown, slug, &mut diagnostics);
        let expanded = expand_admonitions(&expanded);

        // Parse markdown into events
        let parser = Parser::new_ext(&expanded, self.options);
        let events: Vec<Event<'static>> = parser.map(Event::into_static).collect();

        // Collect headings for TOC and later ID injection
        let headings = collect_headings(&events);
        let toc_html = if headings.is_empty() {
            None
        } else {
            Some(render_toc(&headings, &self.settings.toc_title))
        };

        let events = AlertTransformer::new().transform(events);

        let wikilink_transformer = WikilinkTransformer::new(links);
        let (events, outgoing_links) = wikilink_transformer.transform(events);

        let attachment_transformer = AttachmentLinkTransformer::new(links);
        let (events, attachments) = attachment_transformer.transform(events);

        // Inject heading ids to match TOC anchors
        let events = attach_heading_ids(events, &headings);
        let events = replace_toc_marker(events, toc_html.as_deref());

        let highlight_transformer = HighlightTransformer::new(&self.settings.highlight_theme);
        let events = highlight_transformer.transform(events);

        let events = ChecklistTransformer::new().transform(events);

        // Convert events to HTML
        let mut html_output = String::new();
        html::push_html(&mut html_output, events.into_iter());

        Rendered {
            html: html_output,
            toc_html,
            outgoing_links,
            attachments,
            diagnostics,
        }
    }

    /// Convert markdown to HTML with default links and no inclusion
    pub fn convert_simple(&self, markdown: &str) -> String {
        self.convert(markdown, &PathLinkBuilder::default(), &NoIncludes)
            .html
    }
}

impl Default for MarkdownProcessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks fenced code blocks while scanning text line by line.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feed one line; true when the line opens, closes, or sits inside a fence.
    pub(crate) fn in_code(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start_matches(' ');
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~');

        if let Some(ch) = marker {
            let run = trimmed.chars().take_while(|c| *c == ch).count();
            if run >= 3 {
                match self.open {
                    None => {
                        self.open = Some((ch, run));
                        return true;
                    }
                    Some((open_ch, open_run))
                        if open_ch == ch && run >= open_run && trimmed[run..].trim().is_empty() =>
                    {
                        self.open = None;
                        return true;
                    }
                    _ => {}
                }
            }
        }

        self.open.is_some()
    }
}

fn collect_headings(events: &[Event]) -> Vec<TocItem> {
    let mut toc = Vec::new();
    // Author-supplied ids are reserved before any are generated
    let mut seen: HashSet<String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Start(Tag::Heading { id: Some(id), .. }) => Some(id.to_string()),
            _ => None,
        })
        .collect();
    let mut current: Option<(u32, Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::Heading { level, id, .. }) => {
                current = Some((*level as u32, id.as_ref().map(|s| s.to_string()), String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, _, ref mut title)) = current {
                    title.push_str(text.as_ref());
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, explicit, title)) = current.take() {
                    let id = match explicit {
                        Some(id) => id,
                        None => unique_id(&title, &mut seen),
                    };
                    toc.push(TocItem { level, title, id });
                }
            }
            _ => {}
        }
    }

    toc
}

fn unique_id(title: &str, seen: &mut HashSet<String>) -> String {
    let mut base = slugify(title);
    if base.is_empty() {
        base = "section".to_string();
    }
    let mut id = base.clone();
    let mut n = 1;
    while seen.contains(&id) {
        id = format!("{}-{}", base, n);
        n += 1;
    }
    seen.insert(id.clone());
    id
}

fn attach_heading_ids(events: Vec<Event<'static>>, headings: &[TocItem]) -> Vec<Event<'static>> {
    let mut heading_iter = headings.iter();
    let mut result = Vec::with_capacity(events.len());

    for event in events {
        match event {
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let next = heading_iter.next();
                let id = id.or_else(|| next.map(|h| CowStr::Boxed(h.id.clone().into_boxed_str())));
                result.push(Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }));
            }
            _ => result.push(event),
        }
    }

    result
}

/// Replace a paragraph that only says `[TOC]` with the rendered table of contents.
fn replace_toc_marker(events: Vec<Event<'static>>, toc_html: Option<&str>) -> Vec<Event<'static>> {
    let mut out = Vec::with_capacity(events.len());
    let mut i = 0;

    while i < events.len() {
        if matches!(events[i], Event::Start(Tag::Paragraph)) {
            let mut j = i + 1;
            let mut text = String::new();
            while let Some(Event::Text(t)) = events.get(j) {
                text.push_str(t);
                j += 1;
            }
            if matches!(events.get(j), Some(Event::End(TagEnd::Paragraph)))
                && text.trim() == "[TOC]"
            {
                let replacement = toc_html.unwrap_or_default().to_string();
                out.push(Event::Html(CowStr::Boxed(replacement.into_boxed_str())));
                i = j + 1;
                continue;
            }
        }
        out.push(events[i].clone());
        i += 1;
    }

    out
}

fn render_toc(headings: &[TocItem], title: &str) -> String {
    let mut html = format!(
        r#"<nav class="toc"><p class="toc-title">{}</p><ul class="toc-list">"#,
        html_escape(title)
    );
    for h in headings {
        html.push_str(&format!(
            r##"<li class="toc-level-{}"><a href="#{}">{}</a></li>"##,
            h.level,
            html_escape(&h.id),
            html_escape(&h.title)
        ));
    }
    html.push_str("</ul></nav>\n");
    html
}

pub(crate) fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
