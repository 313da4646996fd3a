//! CSV catalog provider.
//!
//! Commerce exports commonly repeat one handle across several rows (one per
//! variant or image slot); rows are merged by key, and an image on any row
//! marks the whole entry as already having an artifact. Malformed rows are
//! skipped with a warning rather than failing the load; only an unreadable
//! file is fatal, since there is nothing to work on.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use pictor_core::error::AppError;
use pictor_core::item::CatalogRecord;
use pictor_core::traits::CatalogProvider;

/// Raw CSV row; header names are aliased so common catalog exports load
/// without a mapping step.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(alias = "handle")]
    key: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    vendor: String,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default, alias = "product_type")]
    category: String,
    #[serde(default, alias = "image_src")]
    image: String,
}

pub struct CsvCatalog {
    path: PathBuf,
}

impl CsvCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CatalogProvider for CsvCatalog {
    fn load(&self) -> Result<Vec<CatalogRecord>, AppError> {
        let mut reader = csv::Reader::from_path(&self.path)
            .map_err(|e| AppError::Catalog(format!("{}: {e}", self.path.display())))?;

        let mut records: Vec<CatalogRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (line, row) in reader.deserialize::<CsvRow>().enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    // +2: one for the header, one for 1-based numbering.
                    tracing::warn!(line = line + 2, error = %e, "Skipping malformed catalog row");
                    continue;
                }
            };

            let key = row.key.trim().to_string();
            if key.is_empty() {
                tracing::warn!(line = line + 2, "Skipping catalog row without a key");
                continue;
            }

            let has_artifact = !row.image.trim().is_empty();
            if let Some(&at) = index.get(&key) {
                let existing = &mut records[at];
                existing.has_artifact |= has_artifact;
                // Variant rows often leave descriptive columns blank.
                if existing.title.is_empty() {
                    existing.title = row.title.trim().to_string();
                }
                if existing.vendor.is_empty() {
                    existing.vendor = row.vendor.trim().to_string();
                }
                continue;
            }

            index.insert(key.clone(), records.len());
            records.push(CatalogRecord {
                key,
                title: row.title.trim().to_string(),
                vendor: row.vendor.trim().to_string(),
                price: row.price.unwrap_or(0.0),
                category: row.category.trim().to_string(),
                has_artifact,
            });
        }

        tracing::info!(
            path = %self.path.display(),
            entries = records.len(),
            "Catalog loaded"
        );
        Ok(records)
    }
}
