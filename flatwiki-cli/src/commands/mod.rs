//! CLI command implementations.

pub mod attach;
pub mod init;
pub mod list;
pub mod page;

pub use attach::attach_file;
pub use init::init_wiki;
pub use list::{list_files, list_pages, list_tags};
pub use page::{new_page, save_page, show_page};

use anyhow::{Context, Result};
use flatwiki_core::WikiConfig;
use std::path::Path;

/// Load the config file, or fall back to defaults rooted beside it.
pub fn load_config(config_path: &Path) -> Result<WikiConfig> {
    if config_path.exists() {
        return WikiConfig::from_file(config_path)
            .with_context(|| format!("Failed to load {:?}", config_path));
    }

    tracing::debug!("No config at {:?}, using defaults", config_path);
    let root = config_path.parent().unwrap_or_else(|| Path::new(""));
    Ok(WikiConfig::new(root))
}

pub fn show_config(config_path: &Path, key: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let value = config
        .get(key)
        .with_context(|| format!("Unknown config key '{}'", key))?;
    println!("{value}");
    Ok(())
}
