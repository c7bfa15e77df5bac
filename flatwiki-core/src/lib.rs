//! # flatwiki-core
//!
//! Core library for flatwiki, a wiki whose pages are plain Markdown files.
//!
//! Pages live one per file under a root directory and are identified by a
//! URL-safe slug:
//!
//! ```
//! assert_eq!(flatwiki_core::slugify("Hello, World!"), "hello-world");
//! ```
//!
//! Each file may open with a YAML front matter block:
//!
//! ```
//! use flatwiki_core::frontmatter::parse_frontmatter;
//!
//! let doc = parse_frontmatter("---\ntitle: Intro\ntags: [a, b]\n---\nBody");
//! assert_eq!(doc.frontmatter.title, "Intro");
//! assert_eq!(doc.body, "Body");
//! ```

pub mod config;
pub mod error;
pub mod files;
pub mod frontmatter;
pub mod fsutil;
pub mod links;
pub mod markdown;
pub mod models;
pub mod render;
pub mod slug;
pub mod store;
pub mod tags;

pub use config::{ConfigError, WikiConfig};
pub use error::{Result, WikiError};
pub use files::FileStore;
pub use links::{LinkBuilder, PathLinkBuilder};
pub use models::{Diagnostic, DiagnosticSeverity, Frontmatter, Page, Tag, WikiFile};
pub use render::{RenderTarget, Renderer};
pub use slug::{canonical_redirect, normalize, slugify};
pub use store::{PageSet, PageStore, TagFilter};
pub use tags::TagIndex;
