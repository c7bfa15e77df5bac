//! Attachment storage, a flat directory of opaque files.

use crate::config::WikiConfig;
use crate::error::{Result, WikiError};
use crate::fsutil::{modified_at, validate_segment, write_atomic};
use crate::links::{LinkBuilder, PathLinkBuilder};
use crate::models::WikiFile;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

pub struct FileStore {
    root: PathBuf,
    links: Arc<dyn LinkBuilder>,
}

impl FileStore {
    pub fn new<P: Into<PathBuf>>(root: P, links: Arc<dyn LinkBuilder>) -> Self {
        Self {
            root: root.into(),
            links,
        }
    }

    pub fn from_config(config: &WikiConfig) -> Self {
        Self::new(
            config.files_dir(),
            Arc::new(PathLinkBuilder::new(&config.base_url)),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        Ok(self.root.join(validate_segment(name)?))
    }

    pub fn exists(&self, name: &str) -> bool {
        self.path_for(name).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Metadata for the attachment stored as `name`.
    pub fn load(&self, name: &str) -> Result<WikiFile> {
        let path = self.path_for(name)?;
        let metadata = match fs::metadata(&path) {
            Ok(m) if m.is_file() => m,
            Ok(_) => return Err(WikiError::FileNotFound(name.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(WikiError::FileNotFound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let mime = mime_guess::from_path(name).first();
        Ok(WikiFile {
            name: name.to_string(),
            is_image: mime
                .as_ref()
                .is_some_and(|m| m.type_() == mime_guess::mime::IMAGE),
            mimetype: mime.map(|m| m.essence_str().to_string()),
            size: metadata.len(),
            last_changed: modified_at(&metadata),
            url: self.links.file_url(name),
        })
    }

    /// Contents of the attachment stored as `name`.
    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(name)?;
        fs::read(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => WikiError::FileNotFound(name.to_string()),
            _ => e.into(),
        })
    }

    /// Store `contents` as `name`, replacing any existing attachment.
    pub fn put(&self, name: &str, contents: &[u8]) -> Result<WikiFile> {
        let path = self.path_for(name)?;
        write_atomic(&path, contents)?;
        tracing::debug!("Stored attachment {:?} ({} bytes)", name, contents.len());
        self.load(name)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        fs::remove_file(&path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => WikiError::FileNotFound(name.to_string()),
            _ => e.into(),
        })
    }

    /// Every stored attachment in filename order, read lazily.
    pub fn enumerate(&self) -> Files<'_> {
        let walker = self.root.is_dir().then(|| {
            WalkDir::new(&self.root)
                .min_depth(1)
                .max_depth(1)
                .sort_by_file_name()
                .into_iter()
        });
        Files {
            store: self,
            walker,
        }
    }
}

pub struct Files<'a> {
    store: &'a FileStore,
    walker: Option<walkdir::IntoIter>,
}

impl Iterator for Files<'_> {
    type Item = WikiFile;

    fn next(&mut self) -> Option<WikiFile> {
        let walker = self.walker.as_mut()?;
        for entry in walker.by_ref() {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_file() {
                continue;
            }
            // Hidden names cover in-flight temp files from write_atomic
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if validate_segment(name).is_err() {
                continue;
            }
            match self.store.load(name) {
                Ok(file) => return Some(file),
                Err(e) => tracing::warn!("Skipping attachment {:?}: {}", name, e),
            }
        }
        None
    }
}
