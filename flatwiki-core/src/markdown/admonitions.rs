//! Admonition call-out blocks.
//!
//! Two spellings produce the same markup:
//!
//! ```text
//! !!! warning "Mind the gap"
//!     Indented body, any markdown.
//!
//! > [!TIP]
//! > GitHub alert syntax.
//! ```
//!
//! Both become `<div class="admonition KIND"><p class="admonition-title">…</p>…</div>`.

use super::{html_escape, FenceTracker};
use pulldown_cmark::{BlockQuoteKind, CowStr, Event, Tag, TagEnd};
use regex::Regex;
use std::sync::OnceLock;

fn opener_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^!!![ \t]+(?P<kind>[A-Za-z][\w-]*)(?:[ \t]+"(?P<title>[^"]*)")?[ \t]*$"#)
            .expect("valid regex")
    })
}

/// Rewrite `!!! kind "title"` blocks into HTML wrappers around their body.
pub fn expand_admonitions(text: &str) -> String {
    if !text.contains("!!!") {
        return text.to_string();
    }

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut out = String::with_capacity(text.len());
    let mut fences = FenceTracker::default();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if fences.in_code(line) {
            out.push_str(line);
            i += 1;
            continue;
        }
        let Some(caps) = opener_regex().captures(line.trim_end_matches(['\r', '\n'])) else {
            out.push_str(line);
            i += 1;
            continue;
        };

        let kind = caps["kind"].to_lowercase();
        let title = match caps.name("title") {
            Some(t) => t.as_str().to_string(),
            None => capitalize(&kind),
        };

        // Body: indented lines, with blank lines allowed between them
        let mut body = String::new();
        let mut j = i + 1;
        let mut end = j;
        while j < lines.len() {
            let candidate = lines[j];
            if candidate.trim().is_empty() {
                body.push('\n');
                j += 1;
                continue;
            }
            match dedent(candidate) {
                Some(rest) => {
                    body.push_str(rest);
                    j += 1;
                    end = j;
                }
                None => break,
            }
        }

        out.push_str(&format!("<div class=\"admonition {}\">\n", html_escape(&kind)));
        if !title.is_empty() {
            out.push_str(&format!(
                "<p class=\"admonition-title\">{}</p>\n",
                html_escape(&title)
            ));
        }
        out.push('\n');
        out.push_str(expand_admonitions(body.trim_end_matches('\n')).as_str());
        out.push_str("\n\n</div>\n\n");

        i = end.max(i + 1);
    }

    out
}

fn dedent(line: &str) -> Option<&str> {
    line.strip_prefix("    ").or_else(|| line.strip_prefix('\t'))
}

fn capitalize(input: &str) -> String {
    let mut chars = input.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
    }
}

/// Turns GitHub alert blockquotes into admonition blocks.
#[derive(Debug, Default)]
pub struct AlertTransformer;

impl AlertTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut out = Vec::with_capacity(events.len());
        // One entry per open blockquote: whether it was rewritten
        let mut open: Vec<bool> = Vec::new();

        for event in events {
            match event {
                Event::Start(Tag::BlockQuote(Some(kind))) => {
                    let (class, title) = alert_label(kind);
                    open.push(true);
                    out.push(Event::Html(CowStr::Boxed(
                        format!(
                            "<div class=\"admonition {class}\">\n<p class=\"admonition-title\">{title}</p>\n"
                        )
                        .into_boxed_str(),
                    )));
                }
                Event::Start(Tag::BlockQuote(None)) => {
                    open.push(false);
                    out.push(event);
                }
                Event::End(TagEnd::BlockQuote { .. }) => {
                    if open.pop().unwrap_or(false) {
                        out.push(Event::Html(CowStr::Borrowed("</div>\n")));
                    } else {
                        out.push(event);
                    }
                }
                other => out.push(other),
            }
        }

        out
    }
}

fn alert_label(kind: BlockQuoteKind) -> (&'static str, &'static str) {
    match kind {
        BlockQuoteKind::Note => ("note", "Note"),
        BlockQuoteKind::Tip => ("tip", "Tip"),
        BlockQuoteKind::Important => ("important", "Important"),
        BlockQuoteKind::Warning => ("warning", "Warning"),
        BlockQuoteKind::Caution => ("caution", "Caution"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownProcessor;

    #[test]
    fn test_admonition_with_title() {
        let md = "!!! warning \"Mind the gap\"\n    Body **text**.\n\nAfter.\n";
        let html = MarkdownProcessor::new().convert_simple(md);
        assert!(html.contains(r#"<div class="admonition warning">"#));
        assert!(html.contains(r#"<p class="admonition-title">Mind the gap</p>"#));
        assert!(html.contains("<strong>text</strong>"));
        assert!(html.contains("<p>After.</p>"));
    }

    #[test]
    fn test_default_title_and_multi_paragraph_body() {
        let out = expand_admonitions("!!! note\n    one\n\n    two\nafter\n");
        assert!(out.contains(r#"<p class="admonition-title">Note</p>"#));
        assert!(out.contains("one\n\ntwo"));
        assert!(out.ends_with("</div>\n\nafter\n"));
    }

    #[test]
    fn test_empty_title_is_omitted() {
        let out = expand_admonitions("!!! tip \"\"\n    body\n");
        assert!(!out.contains("admonition-title"));
    }

    #[test]
    fn test_inside_code_fence_is_literal() {
        let text = "```\n!!! note\n    body\n```\n";
        assert_eq!(expand_admonitions(text), text);
    }

    #[test]
    fn test_github_alert() {
        let html = MarkdownProcessor::new().convert_simple("> [!TIP]\n> Use the store.\n");
        assert!(html.contains(r#"<div class="admonition tip">"#));
        assert!(html.contains("Use the store."));
        assert!(!html.contains("<blockquote"));
    }

    #[test]
    fn test_plain_blockquote_untouched() {
        let html = MarkdownProcessor::new().convert_simple("> quoted\n");
        assert!(html.contains("<blockquote>"));
    }
}
