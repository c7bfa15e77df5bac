use super::load_config;
use anyhow::{Context, Result};
use flatwiki_core::FileStore;
use std::fs;
use std::path::Path;

/// Copy `path` into the attachment directory
pub fn attach_file(config_path: &Path, path: &Path, name: Option<&str>) -> Result<()> {
    let files = FileStore::from_config(&load_config(config_path)?);

    let name = match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .and_then(|n| n.to_str())
            .with_context(|| format!("Cannot derive an attachment name from {:?}", path))?
            .to_string(),
    };

    let contents = fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
    let stored = files
        .put(&name, &contents)
        .with_context(|| format!("Failed to store attachment '{}'", name))?;

    println!("{}", stored.url);
    Ok(())
}
