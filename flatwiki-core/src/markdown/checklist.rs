//! Checklist items rendered as disabled checkboxes.

use pulldown_cmark::{CowStr, Event, Tag, TagEnd};

#[derive(Debug, Default)]
pub struct ChecklistTransformer;

impl ChecklistTransformer {
    pub fn new() -> Self {
        Self
    }

    pub fn transform(&self, events: Vec<Event<'static>>) -> Vec<Event<'static>> {
        let mut out = Vec::with_capacity(events.len());
        // One entry per open unordered list: whether it was opened as a checklist
        let mut lists: Vec<bool> = Vec::new();

        for (i, event) in events.iter().enumerate() {
            match event {
                Event::Start(Tag::List(None)) => {
                    let is_checklist = starts_with_task(&events[i + 1..]);
                    lists.push(is_checklist);
                    if is_checklist {
                        out.push(Event::Html(CowStr::Borrowed("<ul class=\"checklist\">\n")));
                    } else {
                        out.push(event.clone());
                    }
                }
                Event::End(TagEnd::List(false)) => {
                    if lists.pop().unwrap_or(false) {
                        out.push(Event::Html(CowStr::Borrowed("</ul>\n")));
                    } else {
                        out.push(event.clone());
                    }
                }
                Event::TaskListMarker(checked) => {
                    let input = if *checked {
                        "<input type=\"checkbox\" class=\"checklist-item\" disabled checked> "
                    } else {
                        "<input type=\"checkbox\" class=\"checklist-item\" disabled> "
                    };
                    out.push(Event::InlineHtml(CowStr::Borrowed(input)));
                }
                other => out.push(other.clone()),
            }
        }

        out
    }
}

/// Whether the list whose events follow begins with a task item.
fn starts_with_task(rest: &[Event<'static>]) -> bool {
    let mut iter = rest.iter();
    if !matches!(iter.next(), Some(Event::Start(Tag::Item))) {
        return false;
    }
    match iter.next() {
        Some(Event::TaskListMarker(_)) => true,
        // Loose lists wrap the item in a paragraph first
        Some(Event::Start(Tag::Paragraph)) => {
            matches!(iter.next(), Some(Event::TaskListMarker(_)))
        }
        _ => false,
    }
}
