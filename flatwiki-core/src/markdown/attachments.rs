//! `attachment:NAME` link and image destinations.
//!
//! `![diagram](attachment:arch.png)` points at the attachment route for
//! `arch.png`, and the name is reported back so callers know which files a
//! page references.

use crate::links::LinkBuilder;
use pulldown_cmark::{CowStr, Event, Tag};

const SCHEME: &str = "attachment:";

pub struct AttachmentLinkTransformer<'a> {
    links: &'a dyn LinkBuilder,
}

impl<'a> AttachmentLinkTransformer<'a> {
    pub fn new(links: &'a dyn LinkBuilder) -> Self {
        Self { links }
    }

    /// Returns (transformed_events, referenced attachment names)
    pub fn transform(&self, events: Vec<Event<'static>>) -> (Vec<Event<'static>>, Vec<String>) {
        let mut names: Vec<String> = Vec::new();

        let events = events
            .into_iter()
            .map(|event| match event {
                Event::Start(Tag::Link {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => Event::Start(Tag::Link {
                    link_type,
                    dest_url: self.rewrite(dest_url, &mut names),
                    title,
                    id,
                }),
                Event::Start(Tag::Image {
                    link_type,
                    dest_url,
                    title,
                    id,
                }) => Event::Start(Tag::Image {
                    link_type,
                    dest_url: self.rewrite(dest_url, &mut names),
                    title,
                    id,
                }),
                other => other,
            })
            .collect();

        (events, names)
    }

    fn rewrite(&self, dest: CowStr<'static>, names: &mut Vec<String>) -> CowStr<'static> {
        let Some(name) = dest.strip_prefix(SCHEME).map(str::trim) else {
            return dest;
        };
        if name.is_empty() {
            return dest;
        }
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
        CowStr::Boxed(self.links.file_url(name).into_boxed_str())
    }
}
