//! Directory-backed local archive lookup.
//!
//! The archive is a flat directory of already-collected images named after
//! catalog keys (`<key>.jpg`, `<key>-2.png`, ...). Lookups never touch the
//! network; a missing archive directory is simply a miss for every item.

use std::fs;
use std::path::{Path, PathBuf};

use pictor_core::error::AppError;
use pictor_core::traits::ArchiveLookup;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif"];

#[derive(Debug, Clone)]
pub struct DirArchive {
    root: PathBuf,
}

impl DirArchive {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ArchiveLookup for DirArchive {
    fn lookup(&self, key: &str, _title: &str) -> Result<Vec<String>, AppError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let entries = fs::read_dir(&self.root)
            .map_err(|e| AppError::Archive(format!("{}: {e}", self.root.display())))?;

        let mut hits = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !is_image(&path) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem == key || stem.starts_with(&format!("{key}-")) {
                hits.push(path.display().to_string());
            }
        }

        // Directory iteration order is arbitrary; keep lookups deterministic.
        hits.sort();
        Ok(hits)
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
