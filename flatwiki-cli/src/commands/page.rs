//! Show, save, and create single pages.

use super::load_config;
use crate::PageFormat;
use anyhow::{bail, Context, Result};
use flatwiki_core::{canonical_redirect, normalize, PageStore, WikiError};
use std::fs;
use std::io::Read;
use std::path::Path;

pub fn show_page(config_path: &Path, slug: &str, format: PageFormat) -> Result<()> {
    let store = PageStore::from_config(&load_config(config_path)?);

    let page = match store.load(slug) {
        Ok(page) => page,
        Err(WikiError::PageNotFound(_)) => bail!(
            "Page '{}' not found; create it with `flatwiki new \"{}\"`",
            slug,
            slug
        ),
        Err(e) => return Err(e).with_context(|| format!("Failed to load page '{}'", slug)),
    };

    for diagnostic in &page.diagnostics {
        tracing::warn!("{}: {}", diagnostic.code, diagnostic.message);
    }

    match format {
        PageFormat::Html => println!("{}", page.html),
        PageFormat::Json => println!("{}", serde_json::to_string_pretty(&page)?),
        PageFormat::Raw => print!("{}", page.raw_source),
    }
    Ok(())
}

pub fn save_page(config_path: &Path, slug: &str, from: Option<&Path>) -> Result<()> {
    let store = PageStore::from_config(&load_config(config_path)?);

    let source = match from {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read page source from stdin")?;
            buf
        }
    };

    if let Some(canonical) = canonical_redirect(slug) {
        tracing::warn!("'{}' is not a canonical slug (expected '{}')", slug, canonical);
    }

    store
        .save(slug, &source)
        .with_context(|| format!("Failed to save page '{}'", slug))?;
    println!("Saved '{}'", slug);
    Ok(())
}

/// Normalize `title` and print a draft for it, or report the existing page.
pub fn new_page(config_path: &Path, title: &str, save: bool) -> Result<()> {
    let store = PageStore::from_config(&load_config(config_path)?);
    let slug = normalize(title);

    if store.exists(&slug) {
        println!("Page '{}' already exists", slug);
        return Ok(());
    }

    let draft = store.new_draft(&slug)?;
    if save {
        store.save(&slug, &draft.raw_source)?;
        println!("Created '{}'", slug);
    } else {
        print!("{}", draft.raw_source);
    }
    Ok(())
}
