//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

/// Main configuration struct matching the flatwiki.yml schema
///
/// Built once at process start and handed to component constructors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WikiConfig {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub render: RenderConfig,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Body used for pages that do not exist yet
    #[serde(default)]
    pub new_page_template: Option<String>,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_base_url() -> String {
    String::from("/")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_title")]
    pub title: String,

    /// Presentation hint for the templating layer (a Bootswatch theme name)
    #[serde(default = "default_theme")]
    pub theme: String,
}

fn default_site_title() -> String {
    String::from("flatwiki")
}

fn default_theme() -> String {
    String::from("flatly")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_pages_dir")]
    pub pages: PathBuf,

    #[serde(default = "default_files_dir")]
    pub files: PathBuf,
}

fn default_pages_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_files_dir() -> PathBuf {
    PathBuf::from("data/_files")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,

    #[serde(default = "default_max_include_depth")]
    pub max_include_depth: usize,

    #[serde(default = "default_toc_title")]
    pub toc_title: String,
}

fn default_highlight_theme() -> String {
    String::from("InspiredGitHub")
}

fn default_max_include_depth() -> usize {
    8
}

fn default_toc_title() -> String {
    String::from("Contents")
}

impl WikiConfig {
    /// Configuration rooted at `root`: pages in `root/data`, attachments in
    /// `root/data/_files`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            config_path: Some(root.as_ref().join("flatwiki.yml")),
            ..Self::default()
        }
    }

    /// Defaults with explicit page and attachment directories.
    pub fn with_paths<P: Into<PathBuf>, F: Into<PathBuf>>(pages: P, files: F) -> Self {
        Self {
            paths: PathsConfig {
                pages: pages.into(),
                files: files.into(),
            },
            ..Self::default()
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: WikiConfig = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.render.max_include_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "render.max_include_depth".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.paths.pages.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "paths.pages".into(),
                message: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Get the pages directory, resolved relative to config file
    pub fn pages_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.pages)
    }

    /// Get the attachments directory, resolved relative to config file
    pub fn files_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.files)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }

    /// Get a nested config value using dotted path (e.g., "site.title")
    pub fn get(&self, key: &str) -> Option<String> {
        let parts: Vec<&str> = key.split('.').collect();
        match parts.as_slice() {
            ["site", "title"] => Some(self.site.title.clone()),
            ["site", "theme"] => Some(self.site.theme.clone()),
            ["paths", "pages"] => Some(self.pages_dir().display().to_string()),
            ["paths", "files"] => Some(self.files_dir().display().to_string()),
            ["render", "highlight_theme"] => Some(self.render.highlight_theme.clone()),
            ["render", "max_include_depth"] => Some(self.render.max_include_depth.to_string()),
            ["render", "toc_title"] => Some(self.render.toc_title.clone()),
            ["base_url"] => Some(self.normalized_base_url()),
            _ => None,
        }
    }

    /// Normalized base URL with leading and trailing slash ("/foo/" or "/")
    pub fn normalized_base_url(&self) -> String {
        normalize_base_url(&self.base_url)
    }
}

impl Default for WikiConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            paths: PathsConfig::default(),
            render: RenderConfig::default(),
            base_url: default_base_url(),
            new_page_template: None,
            config_path: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            theme: default_theme(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            pages: default_pages_dir(),
            files: default_files_dir(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            highlight_theme: default_highlight_theme(),
            max_include_depth: default_max_include_depth(),
            toc_title: default_toc_title(),
        }
    }
}

/// Ensure base URLs have a leading and trailing slash
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        "/".to_string()
    } else {
        format!("/{}/", segments.join("/"))
    }
}
