//! Init command implementation.

use anyhow::{Context, Result};
use flatwiki_core::{PageStore, WikiConfig};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"site:
  title: flatwiki
  theme: flatly
paths:
  pages: data
  files: data/_files
render:
  highlight_theme: InspiredGitHub
  max_include_depth: 8
  toc_title: Contents
base_url: /
"#;

const WELCOME_PAGE: &str = r#"---
title: Welcome
tags: [flatwiki]
summary: Start here
---

[TOC]

# Welcome

Every page is a Markdown file under `data/`. Link pages with `[[Page Title]]`
and reference uploads with `![alt](attachment:name.png)`.

## Getting around

- [ ] Edit this page with `flatwiki save index --from index.md`
- [ ] Start another one with `flatwiki new "My Page" --save`
"#;

/// Initialize a new wiki in `path`
pub fn init_wiki(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    let config_path = root.join("flatwiki.yml");
    if config_path.exists() {
        println!("flatwiki.yml already exists at {:?}", config_path);
    } else {
        fs::write(&config_path, DEFAULT_CONFIG)
            .with_context(|| format!("Failed to write {:?}", config_path))?;
        println!("Created {:?}", config_path);
    }

    let config = WikiConfig::from_file(&config_path)
        .with_context(|| format!("Failed to load {:?}", config_path))?;
    let files_dir = config.files_dir();
    fs::create_dir_all(&files_dir).with_context(|| format!("Failed to create {:?}", files_dir))?;

    let store = PageStore::from_config(&config);
    if !store.exists("index") {
        store.save("index", WELCOME_PAGE)?;
        println!("Created page 'index'");
    }

    println!("✓ flatwiki initialized in {:?}", root);
    Ok(())
}
