//! Code syntax highlighting using syntect.
//!
//! Output is inline-styled HTML, so pages need no stylesheet or script to
//! show highlighted code.

use super::html_escape;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Tag, TagEnd};
use std::sync::OnceLock;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::html::highlighted_html_for_string;
use syntect::parsing::SyntaxSet;

const DEFAULT_THEME: &str = "InspiredGitHub";

static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();

fn syntax_set() -> &'static SyntaxSet {
    SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines)
}

fn theme(name: &str) -> Option<&'static Theme> {
    let themes = &THEME_SET.get_or_init(ThemeSet::load_defaults).themes;
    themes.get(name).or_else(|| {
        tracing::debug!("Unknown highlight theme {:?}, using {}", name, DEFAULT_THEME);
        themes.get(DEFAULT_THEME)
    })
}

/// Transformer for syntax highlighting code blocks
pub struct HighlightTransformer {
    theme_name: String,
}

impl HighlightTransformer {
    pub fn new(theme_name: &str) -> Self {
        Self {
            theme_name: theme_name.to_string(),
        }
    }

    /// Transform events, adding syntax highlighting to fenced code blocks
    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut result = Vec::with_capacity(events.len());
        let mut code_lang: Option<String> = None;
        let mut code_content = String::new();

        for event in events {
            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(ref info)))
                    if fence_language(info).is_some() =>
                {
                    code_lang = fence_language(info);
                    code_content.clear();
                }
                Event::Text(text) if code_lang.is_some() => {
                    code_content.push_str(text.as_ref());
                }
                Event::End(TagEnd::CodeBlock) if code_lang.is_some() => {
                    let lang = code_lang.take().unwrap_or_default();
                    let highlighted = self.highlight_code(&code_content, &lang);
                    result.push(Event::Html(CowStr::Boxed(highlighted.into_boxed_str())));
                }
                other => result.push(other),
            }
        }

        result
    }

    fn highlight_code(&self, code: &str, lang: &str) -> String {
        let ss = syntax_set();
        let syntax = ss
            .find_syntax_by_token(lang)
            .or_else(|| ss.find_syntax_by_extension(lang))
            .unwrap_or_else(|| ss.find_syntax_plain_text());

        let highlighted = theme(&self.theme_name)
            .and_then(|theme| highlighted_html_for_string(code, ss, syntax, theme).ok());

        match highlighted {
            Some(html) => html,
            // Fallback to plain code block
            None => format!(
                "<pre><code class=\"language-{}\">{}</code></pre>\n",
                html_escape(lang),
                html_escape(code)
            ),
        }
    }
}

impl Default for HighlightTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_THEME)
    }
}

/// First word of a fence info string (`rust,ignore` -> `rust`), if any.
fn fence_language(info: &str) -> Option<String> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .map(str::trim)
        .filter(|lang| !lang.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::MarkdownProcessor;

    #[test]
    fn test_code_blocks_are_styled_inline() {
        let html = MarkdownProcessor::new().convert_simple("```rust\nfn main() {}\n```");
        assert!(html.contains("<pre style="));
        assert!(html.contains("main"));
        assert!(html.contains("<span style="));
    }

    #[test]
    fn test_plain_fence_stays_plain() {
        let html = MarkdownProcessor::new().convert_simple("```\n<b>raw</b>\n```");
        assert!(html.contains("<pre><code>"));
        assert!(html.contains("&lt;b&gt;raw&lt;/b&gt;"));
    }

    #[test]
    fn test_unknown_theme_falls_back() {
        let transformer = HighlightTransformer::new("No Such Theme");
        let html = transformer.highlight_code("let x = 1;", "rust");
        assert!(html.contains("<pre style="));
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("rust,ignore"), Some("rust".into()));
        assert_eq!(fence_language("python {.numbered}"), Some("python".into()));
        assert_eq!(fence_language(""), None);
    }
}
