//! Wikilink transformation for [[target]] and [[target|text]] syntax.

use crate::links::LinkBuilder;
use crate::slug::{normalize, slugify};
use pulldown_cmark::{CowStr, Event, LinkType, Tag, TagEnd};

/// Transformer for wikilink syntax
pub struct WikilinkTransformer<'a> {
    links: &'a dyn LinkBuilder,
}

impl<'a> WikilinkTransformer<'a> {
    pub fn new(links: &'a dyn LinkBuilder) -> Self {
        Self { links }
    }

    /// Transform events, converting [[wikilinks]] to HTML links
    ///
    /// Returns (transformed_events, outgoing_links)
    pub fn transform(&self, events: Vec<Event<'static>>) -> (Vec<Event<'static>>, Vec<String>) {
        let mut result = Vec::with_capacity(events.len());
        let mut outgoing_links: Vec<String> = Vec::new();
        let mut in_code_block = false;
        let mut events = events.into_iter().peekable();

        while let Some(event) = events.next() {
            match event {
                Event::Start(Tag::CodeBlock(_)) => {
                    in_code_block = true;
                    result.push(event);
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code_block = false;
                    result.push(event);
                }
                Event::Text(text) if !in_code_block => {
                    // Parsers split bracketed text, so merge neighbours first
                    let mut merged_text = text.to_string();
                    while let Some(Event::Text(next)) = events.peek() {
                        merged_text.push_str(next);
                        events.next();
                    }

                    if merged_text.contains("[[") && merged_text.contains("]]") {
                        let (transformed, links) = self.process_wikilinks(&merged_text);
                        result.extend(transformed);
                        for link in links {
                            if !outgoing_links.contains(&link) {
                                outgoing_links.push(link);
                            }
                        }
                    } else {
                        result.push(Event::Text(CowStr::Boxed(merged_text.into_boxed_str())));
                    }
                }
                other => result.push(other),
            }
        }

        (result, outgoing_links)
    }

    fn process_wikilinks(&self, text: &str) -> (Vec<Event<'static>>, Vec<String>) {
        let mut events = Vec::new();
        let mut links = Vec::new();
        let mut remaining = text;

        while let Some(start) = remaining.find("[[") {
            // Add text before the wikilink
            if start > 0 {
                events.push(text_event(&remaining[..start]));
            }

            // Find the closing ]]
            if let Some(end) = remaining[start..].find("]]") {
                let wikilink = &remaining[start + 2..start + end];
                match self.create_link(wikilink) {
                    Some((link_events, slug)) => {
                        events.extend(link_events);
                        links.push(slug);
                    }
                    None => events.push(text_event(&remaining[start..start + end + 2])),
                }
                remaining = &remaining[start + end + 2..];
            } else {
                // No closing ]], treat as literal text
                events.push(text_event(remaining));
                remaining = "";
                break;
            }
        }

        // Add any remaining text
        if !remaining.is_empty() {
            events.push(text_event(remaining));
        }

        (events, links)
    }

    fn create_link(&self, wikilink: &str) -> Option<(Vec<Event<'static>>, String)> {
        // Parse [[target|display text]] or [[target]]
        let (target, display) = match wikilink.split_once('|') {
            Some((target, display)) => (target.trim(), Some(display.trim())),
            None => (wikilink.trim(), None),
        };

        let (target_base, fragment) = match target.split_once('#') {
            Some((base, frag)) => (base.trim(), Some(slugify(frag)).filter(|f| !f.is_empty())),
            None => (target, None),
        };

        if target_base.is_empty() {
            return None;
        }

        let slug = normalize(target_base);
        let href = match &fragment {
            Some(frag) => format!("{}#{}", self.links.page_url(&slug), frag),
            None => self.links.page_url(&slug),
        };
        let display_text = display.filter(|d| !d.is_empty()).unwrap_or(target);

        let events = vec![
            Event::Start(Tag::Link {
                link_type: LinkType::Inline,
                dest_url: CowStr::Boxed(href.into_boxed_str()),
                title: CowStr::Borrowed(""),
                id: CowStr::Borrowed(""),
            }),
            text_event(display_text),
            Event::End(TagEnd::Link),
        ];

        Some((events, slug))
    }
}

fn text_event(text: &str) -> Event<'static> {
    Event::Text(CowStr::Boxed(text.to_string().into_boxed_str()))
}

#[cfg(test)]
mod tests {
    use crate::links::PathLinkBuilder;
    use crate::markdown::{MarkdownProcessor, NoIncludes};

    fn convert(markdown: &str) -> (String, Vec<String>) {
        let rendered =
            MarkdownProcessor::new().convert(markdown, &PathLinkBuilder::default(), &NoIncludes);
        (rendered.html, rendered.outgoing_links)
    }

    #[test]
    fn test_simple_wikilink() {
        let (html, links) = convert("See [[Rust Safety]] for more.");
        assert!(html.contains(r#"<a href="/rust-safety/">Rust Safety</a>"#));
        assert_eq!(links, vec!["rust-safety"]);
    }

    #[test]
    fn test_display_text_and_fragment() {
        let (html, links) = convert("Read [[Ownership#Borrow Rules|the rules]].");
        assert!(html.contains(r#"href="/ownership/#borrow-rules""#));
        assert!(html.contains(">the rules</a>"));
        assert_eq!(links, vec!["ownership"]);
    }

    #[test]
    fn test_links_are_deduplicated() {
        let (_, links) = convert("[[A]] and [[a]] and [[B]]");
        assert_eq!(links, vec!["a", "b"]);
    }

    #[test]
    fn test_empty_and_unclosed() {
        let (html, links) = convert("[[]] and [[open");
        assert!(links.is_empty());
        assert!(html.contains("[[]]"));
        assert!(html.contains("[[open"));
    }

    #[test]
    fn test_code_is_ignored() {
        let (html, links) = convert("```\n[[Not A Link]]\n```\n\n`[[inline]]`");
        assert!(links.is_empty());
        assert!(html.contains("[[Not A Link]]"));
        assert!(html.contains("<code>[[inline]]</code>"));
    }
}
