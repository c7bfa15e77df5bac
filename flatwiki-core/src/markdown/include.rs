//! `{!name!}` inclusion of other page-store documents.
//!
//! A directive on its own line is replaced by the body of the named document
//! (front matter removed), which is itself expanded. Missing documents,
//! cycles, and nesting deeper than the configured limit turn into an inline
//! notice and a diagnostic; rendering carries on.

use super::{html_escape, FenceTracker};
use crate::error::{Result, WikiError};
use crate::frontmatter::strip_frontmatter;
use crate::models::Diagnostic;
use regex::Regex;
use std::sync::OnceLock;

/// Where inclusion directives are resolved.
pub trait IncludeSource {
    /// Raw text of the document called `name`, relative to the source root.
    fn read_include(&self, name: &str) -> Result<String>;
}

/// Resolves nothing; every directive reports a missing document.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoIncludes;

impl IncludeSource for NoIncludes {
    fn read_include(&self, name: &str) -> Result<String> {
        Err(WikiError::PageNotFound(name.to_string()))
    }
}

fn directive_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[ \t]*\{!\s*(.+?)\s*!\}[ \t]*\r?\n?$").expect("valid regex"))
}

pub struct IncludeExpander<'a> {
    source: &'a dyn IncludeSource,
    max_depth: usize,
}

impl<'a> IncludeExpander<'a> {
    pub fn new(source: &'a dyn IncludeSource, max_depth: usize) -> Self {
        Self { source, max_depth }
    }

    /// Expand directives in `text`. `root` names the document being
    /// rendered so that it cannot include itself.
    pub fn expand(
        &self,
        text: &str,
        root: Option<&str>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let root = root.map(include_key);
        let mut stack = Vec::new();
        self.expand_nested(text, root.as_deref(), &mut stack, diagnostics)
    }

    fn expand_nested(
        &self,
        text: &str,
        root: Option<&str>,
        stack: &mut Vec<String>,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let mut out = String::with_capacity(text.len());
        let mut fences = FenceTracker::default();

        for line in text.split_inclusive('\n') {
            if fences.in_code(line) {
                out.push_str(line);
                continue;
            }
            let Some(caps) = directive_regex().captures(line) else {
                out.push_str(line);
                continue;
            };
            let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let key = include_key(name);

            if root == Some(key.as_str()) || stack.contains(&key) {
                out.push_str(&self.fail(name, "include.cycle", "circular inclusion", diagnostics));
                continue;
            }
            if stack.len() >= self.max_depth {
                out.push_str(&self.fail(
                    name,
                    "include.depth",
                    "inclusion nested too deeply",
                    diagnostics,
                ));
                continue;
            }

            match self.source.read_include(name) {
                Ok(content) => {
                    stack.push(key);
                    let body =
                        self.expand_nested(strip_frontmatter(&content), root, stack, diagnostics);
                    stack.pop();
                    out.push_str(&body);
                    if !body.ends_with('\n') {
                        out.push('\n');
                    }
                }
                Err(WikiError::InvalidIdentity { reason, .. }) => {
                    out.push_str(&self.fail(name, "include.invalid", reason, diagnostics));
                }
                Err(e) => {
                    let reason = if e.is_not_found() {
                        "not found".to_string()
                    } else {
                        e.to_string()
                    };
                    out.push_str(&self.fail(name, "include.missing", &reason, diagnostics));
                }
            }
        }

        out
    }

    fn fail(
        &self,
        name: &str,
        code: &str,
        reason: &str,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        tracing::warn!("Skipping include {:?}: {}", name, reason);
        diagnostics.push(Diagnostic::warning(
            code,
            format!("Could not include {name}: {reason}"),
        ));
        format!(
            "<div class=\"include-error\">Could not include <code>{}</code>: {}</div>\n\n",
            html_escape(name),
            html_escape(reason)
        )
    }
}

/// Stack identity of an include name: `intro` and `intro.md` are the same document.
fn include_key(name: &str) -> String {
    name.strip_suffix(".md").unwrap_or(name).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapSource(HashMap<&'static str, &'static str>);

    impl IncludeSource for MapSource {
        fn read_include(&self, name: &str) -> Result<String> {
            if name.contains("..") {
                return Err(WikiError::InvalidIdentity {
                    name: name.to_string(),
                    reason: "path traversal",
                });
            }
            let key = name.strip_suffix(".md").unwrap_or(name);
            self.0
                .get(key)
                .map(|s| s.to_string())
                .ok_or_else(|| WikiError::PageNotFound(name.to_string()))
        }
    }

    fn source(entries: &[(&'static str, &'static str)]) -> MapSource {
        MapSource(entries.iter().copied().collect())
    }

    #[test]
    fn test_splices_document_body() {
        let src = source(&[("snippet", "---\ntitle: Snippet\n---\nIncluded *text*")]);
        let mut diags = Vec::new();
        let out = IncludeExpander::new(&src, 8).expand("Before\n{!snippet.md!}\nAfter\n", None, &mut diags);
        assert_eq!(out, "Before\nIncluded *text*\nAfter\n");
        assert!(diags.is_empty());
    }

    #[test]
    fn test_nested_includes() {
        let src = source(&[("a", "A\n{!b!}\n"), ("b", "B\n")]);
        let mut diags = Vec::new();
        let out = IncludeExpander::new(&src, 8).expand("{!a!}", None, &mut diags);
        assert_eq!(out, "A\nB\n");
    }

    #[test]
    fn test_cycle_is_reported_not_followed() {
        let src = source(&[("a", "A\n{!b!}\n"), ("b", "B\n{!a.md!}\n")]);
        let mut diags = Vec::new();
        let out = IncludeExpander::new(&src, 8).expand("{!a!}\n", None, &mut diags);
        assert!(out.starts_with("A\nB\n"));
        assert!(out.contains("include-error"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "include.cycle");
    }

    #[test]
    fn test_depth_limit() {
        let src = source(&[("a", "{!b!}\n"), ("b", "{!c!}\n"), ("c", "LEAF\n")]);
        let mut diags = Vec::new();
        let out = IncludeExpander::new(&src, 2).expand("{!a!}\n", None, &mut diags);
        assert!(!out.contains("LEAF"));
        assert!(out.contains("include-error"));
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "include.depth");
    }

    #[test]
    fn test_root_document_is_never_spliced_into_itself() {
        let src = source(&[("a", "ALPHA\n{!b!}\n"), ("b", "BETA\n{!a.md!}\n")]);
        let mut diags = Vec::new();
        let out = IncludeExpander::new(&src, 8).expand("ALPHA\n{!b!}\n", Some("a"), &mut diags);
        assert_eq!(out.matches("ALPHA").count(), 1);
        assert_eq!(out.matches("BETA").count(), 1);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, "include.cycle");
    }

    #[test]
    fn test_self_include_with_root() {
        let src = source(&[("me", "SELF\n{!me!}\n")]);
        let mut diags = Vec::new();
        let out = IncludeExpander::new(&src, 8).expand("SELF\n{!me.md!}\n", Some("me"), &mut diags);
        assert_eq!(out.matches("SELF").count(), 1);
        assert_eq!(diags[0].code, "include.cycle");
    }

    #[test]
    fn test_missing_and_invalid() {
        let src = source(&[]);
        let mut diags = Vec::new();
        let out = IncludeExpander::new(&src, 8).expand("{!nope!}\n{!../etc/passwd!}\n", None, &mut diags);
        assert_eq!(out.matches("include-error").count(), 2);
        assert_eq!(diags[0].code, "include.missing");
        assert_eq!(diags[1].code, "include.invalid");
    }

    #[test]
    fn test_directives_in_code_are_literal() {
        let src = source(&[("a", "A\n")]);
        let mut diags = Vec::new();
        let text = "```\n{!a!}\n```\n";
        let out = IncludeExpander::new(&src, 8).expand(text, None, &mut diags);
        assert_eq!(out, text);
    }
}
