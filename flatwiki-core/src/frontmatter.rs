//! Frontmatter parsing from markdown files.
//!
//! Parsing never fails. A header that cannot be understood degrades to empty
//! metadata and a [`Diagnostic`] explaining what was ignored.

use crate::models::{Diagnostic, Frontmatter};
use regex::Regex;
use serde_yaml::Value;
use std::sync::OnceLock;

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX.get_or_init(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)")
            .expect("valid regex")
    })
}

/// A document split into metadata and markdown body
#[derive(Debug, Clone)]
pub struct ParsedDocument<'a> {
    pub frontmatter: Frontmatter,
    pub body: &'a str,
    pub diagnostics: Vec<Diagnostic>,
}

/// Parse frontmatter from markdown content
///
/// If no frontmatter is present, returns default frontmatter with the full
/// content as body. If the header is not a YAML mapping, the header is left
/// in the body so the author can see and fix it.
///
/// # Example
///
/// ```
/// use flatwiki_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: My Post\ntags: [a, b]\n---\n# Hello World\n";
///
/// let doc = parse_frontmatter(content);
/// assert_eq!(doc.frontmatter.title, "My Post");
/// assert_eq!(doc.frontmatter.tags, vec!["a", "b"]);
/// assert!(doc.body.starts_with("# Hello World"));
/// ```
pub fn parse_frontmatter(content: &str) -> ParsedDocument<'_> {
    let Some(captures) = frontmatter_regex().captures(content) else {
        return ParsedDocument {
            frontmatter: Frontmatter::default(),
            body: content,
            diagnostics: Vec::new(),
        };
    };

    let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or("");
    let body_start = captures.get(0).map(|m| m.end()).unwrap_or(0);
    let mut diagnostics = Vec::new();

    let parsed = if yaml.trim().is_empty() {
        Ok(Value::Null)
    } else {
        serde_yaml::from_str::<Value>(yaml)
    };
    let value = match parsed {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Ignoring invalid front matter: {}", e);
            diagnostics.push(Diagnostic::warning(
                "frontmatter.invalid",
                format!("Invalid YAML: {e}"),
            ));
            return ParsedDocument {
                frontmatter: Frontmatter::default(),
                body: content,
                diagnostics,
            };
        }
    };

    let frontmatter = match value {
        Value::Null => Frontmatter::default(),
        Value::Mapping(_) => Frontmatter {
            title: text_field(&value, "title", &mut diagnostics),
            tags: tags_field(&value, &mut diagnostics),
            summary: text_field(&value, "summary", &mut diagnostics),
        },
        _ => {
            diagnostics.push(Diagnostic::warning(
                "frontmatter.invalid",
                "Front matter is not a key/value mapping",
            ));
            return ParsedDocument {
                frontmatter: Frontmatter::default(),
                body: content,
                diagnostics,
            };
        }
    };

    ParsedDocument {
        frontmatter,
        body: &content[body_start..],
        diagnostics,
    }
}

/// The markdown body with any front matter block removed
pub fn strip_frontmatter(content: &str) -> &str {
    parse_frontmatter(content).body
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        _ => None,
    }
}

fn text_field(map: &Value, key: &str, diagnostics: &mut Vec<Diagnostic>) -> String {
    match map.get(key) {
        None | Some(Value::Null) => String::new(),
        Some(value) => scalar_to_string(value).unwrap_or_else(|| {
            diagnostics.push(Diagnostic::warning(
                "frontmatter.field",
                format!("Field `{key}` should be text"),
            ));
            String::new()
        }),
    }
}

fn tags_field(map: &Value, diagnostics: &mut Vec<Diagnostic>) -> Vec<String> {
    match map.get("tags") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Sequence(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for item in items {
                match scalar_to_string(item) {
                    // Kept as written; blank entries carry no tag
                    Some(tag) if !tag.trim().is_empty() => tags.push(tag),
                    Some(_) => {}
                    None => diagnostics.push(Diagnostic::warning(
                        "frontmatter.field",
                        "Skipped a tag that is not plain text",
                    )),
                }
            }
            tags
        }
        Some(Value::String(list)) => list
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        Some(value) => match scalar_to_string(value) {
            Some(tag) if tag.trim().is_empty() => Vec::new(),
            Some(tag) => vec![tag],
            None => {
                diagnostics.push(Diagnostic::warning(
                    "frontmatter.field",
                    "Field `tags` should be a list",
                ));
                Vec::new()
            }
        },
    }
}
