//! Filesystem helpers shared by the page and file stores.

use crate::error::{Result, WikiError};
use chrono::{DateTime, Utc};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Longest stored name we accept, in bytes.
pub const MAX_NAME_LEN: usize = 255;

/// Check that `name` is usable as exactly one path segment under a store root.
///
/// This is the traversal boundary: nothing reaches the filesystem without
/// passing through here first.
pub fn validate_segment(name: &str) -> Result<&str> {
    let invalid = |reason| WikiError::InvalidIdentity {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Err(invalid("empty name"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid("name too long"));
    }
    if name.starts_with('.') {
        return Err(invalid("leading dot"));
    }
    if name.contains(['/', '\\']) {
        return Err(invalid("path separator"));
    }
    if name.chars().any(char::is_control) {
        return Err(invalid("control character"));
    }
    Ok(name)
}

/// Write `contents` to `path` so readers see either the old or the new file,
/// never a partial one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| WikiError::InvalidIdentity {
        name: path.display().to_string(),
        reason: "no parent directory",
    })?;
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::Builder::new()
        .prefix(".flatwiki-")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| WikiError::Io(e.error))?;

    #[cfg(unix)]
    {
        if let Err(err) = sync_dir(parent) {
            tracing::warn!("Directory sync failed for {:?}: {}", parent, err);
        }
    }

    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

/// Modification time of an already-opened file's metadata, falling back to now.
pub fn modified_at(metadata: &fs::Metadata) -> DateTime<Utc> {
    metadata
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_accepts_plain_names() {
        assert!(validate_segment("index").is_ok());
        assert!(validate_segment("My Page").is_ok());
        assert!(validate_segment("report.final.pdf").is_ok());
    }

    #[test]
    fn test_rejects_traversal() {
        for bad in ["", ".", "..", "../secret", "a/b", "a\\b", ".hidden", "nul\0byte"] {
            match validate_segment(bad) {
                Err(WikiError::InvalidIdentity { .. }) => {}
                other => panic!("expected InvalidIdentity for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_rejects_overlong_names() {
        let long = "a".repeat(MAX_NAME_LEN + 1);
        assert!(validate_segment(&long).is_err());
    }

    #[test]
    fn test_write_atomic_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("page.md");

        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }
}
