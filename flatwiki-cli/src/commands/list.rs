//! Listings of pages, tags, and attachments.

use super::load_config;
use anyhow::Result;
use flatwiki_core::{FileStore, PageStore, TagFilter, TagIndex};
use std::path::Path;

/// Print `slug<TAB>title` for each page, optionally filtered by tag
pub fn list_pages(config_path: &Path, tags: Vec<String>) -> Result<()> {
    let store = PageStore::from_config(&load_config(config_path)?);
    let filter = (!tags.is_empty()).then(|| TagFilter::new(tags));

    for page in store.enumerate(filter) {
        println!("{}\t{}", page.slug, page.display_title());
    }
    Ok(())
}

pub fn list_tags(config_path: &Path, counts: bool) -> Result<()> {
    let store = PageStore::from_config(&load_config(config_path)?);
    let index = TagIndex::new(&store);

    if counts {
        for (name, count) in index.counts() {
            println!("{name}\t{count}");
        }
    } else {
        for tag in index.all_tags() {
            println!("{}", tag.name);
        }
    }
    Ok(())
}

pub fn list_files(config_path: &Path) -> Result<()> {
    let files = FileStore::from_config(&load_config(config_path)?);
    for file in files.enumerate() {
        println!(
            "{}\t{}\t{}",
            file.name,
            file.size,
            file.mimetype.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
