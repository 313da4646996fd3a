use std::future::Future;

use crate::error::AppError;
use crate::item::CatalogRecord;
use crate::state::RunState;

/// A fetched page: the body plus the final URL after redirects, which is
/// the base for resolving relative candidate links.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    pub final_url: String,
    pub body: String,
}

/// Retrieves content from a search URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchResponse, AppError>> + Send;
}

/// Proposes candidate artifact URLs from fetched content.
///
/// Brand- and site-specific parsing lives entirely behind this seam; the
/// engine never sees how candidates were derived.
pub trait ArtifactExtractor: Send + Sync + Clone {
    fn extract(&self, content: &str, base_url: &str) -> Result<Vec<String>, AppError>;
}

/// Supplies catalog records; queried once at startup.
pub trait CatalogProvider {
    fn load(&self) -> Result<Vec<CatalogRecord>, AppError>;
}

/// Resolves already-available artifacts without any network call.
pub trait ArchiveLookup: Send + Sync + Clone {
    fn lookup(&self, key: &str, title: &str) -> Result<Vec<String>, AppError>;
}

/// Durable run-state persistence. `save` must replace the whole document
/// atomically; it is called after every processed item.
pub trait StateStore: Send + Sync {
    fn load(&self) -> Result<RunState, AppError>;
    fn save(&self, state: &RunState) -> Result<(), AppError>;
}

/// Archive lookup that never finds anything, for runs without an archive.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullArchive;

impl ArchiveLookup for NullArchive {
    fn lookup(&self, _key: &str, _title: &str) -> Result<Vec<String>, AppError> {
        Ok(Vec::new())
    }
}
