//! Test utilities: mock implementations of the core trait seams.
//!
//! Handwritten mocks for dependency injection in unit tests. All mocks use
//! `Arc<Mutex<_>>` for interior mutability, allowing test assertions on
//! recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::engine::{EngineEvent, EngineReporter};
use crate::error::AppError;
use crate::item::CatalogRecord;
use crate::state::RunState;
use crate::traits::{ArchiveLookup, ArtifactExtractor, FetchResponse, Fetcher, StateStore};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher with a queue of responses and a recorded call log.
///
/// Each call pops the first queued response. When the queue is empty the
/// fallback applies: a default page, or a fabricated error when built via
/// [`MockFetcher::always_failing`].
#[derive(Clone, Default)]
pub struct MockFetcher {
    responses: Arc<Mutex<Vec<Result<FetchResponse, AppError>>>>,
    fallback_status: Option<u16>,
    /// URLs fetched, in order.
    pub fetched: Arc<Mutex<Vec<String>>>,
}

impl MockFetcher {
    pub fn with_responses(responses: Vec<Result<FetchResponse, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Default::default()
        }
    }

    /// Every fetch fails with the error classified from `status`.
    pub fn always_failing(status: u16) -> Self {
        Self {
            fallback_status: Some(status),
            ..Default::default()
        }
    }

    fn fallback(&self, url: &str) -> Result<FetchResponse, AppError> {
        match self.fallback_status {
            None => Ok(FetchResponse {
                final_url: url.to_string(),
                body: "<html><body>default</body></html>".to_string(),
            }),
            Some(429) => Err(AppError::RateLimited),
            Some(status @ (401 | 403)) => Err(AppError::AccessDenied(status)),
            Some(status) => Err(AppError::HttpStatus {
                status,
                url: url.to_string(),
            }),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, AppError> {
        self.fetched.lock().unwrap().push(url.to_string());
        let next = {
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                None
            } else {
                Some(responses.remove(0))
            }
        };
        next.unwrap_or_else(|| self.fallback(url))
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor with a response queue and an optional fixed fallback.
#[derive(Clone, Default)]
pub struct MockExtractor {
    responses: Arc<Mutex<Vec<Result<Vec<String>, AppError>>>>,
    fixed: Option<Vec<String>>,
}

impl MockExtractor {
    /// Always returns the same candidate list.
    pub fn fixed(candidates: Vec<String>) -> Self {
        Self {
            fixed: Some(candidates),
            ..Default::default()
        }
    }

    pub fn with_responses(responses: Vec<Result<Vec<String>, AppError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Default::default()
        }
    }

    pub fn with_error(error: AppError) -> Self {
        Self::with_responses(vec![Err(error)])
    }
}

impl ArtifactExtractor for MockExtractor {
    fn extract(&self, _content: &str, _base_url: &str) -> Result<Vec<String>, AppError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.fixed.clone().unwrap_or_default())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockArchive
// ---------------------------------------------------------------------------

/// Mock archive keyed by item key.
#[derive(Clone, Default)]
pub struct MockArchive {
    hits: Arc<Mutex<HashMap<String, Vec<String>>>>,
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockArchive {
    pub fn with_hit(key: &str, artifacts: Vec<String>) -> Self {
        let archive = Self::default();
        archive
            .hits
            .lock()
            .unwrap()
            .insert(key.to_string(), artifacts);
        archive
    }

    pub fn with_error(error: AppError) -> Self {
        let archive = Self::default();
        *archive.error.lock().unwrap() = Some(error);
        archive
    }
}

impl ArchiveLookup for MockArchive {
    fn lookup(&self, key: &str, _title: &str) -> Result<Vec<String>, AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        Ok(self.hits.lock().unwrap().get(key).cloned().unwrap_or_default())
    }
}

// ---------------------------------------------------------------------------
// MemoryStateStore
// ---------------------------------------------------------------------------

/// In-memory state store that records every save.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    state: Arc<Mutex<Option<RunState>>>,
    failing: bool,
    pub save_count: Arc<Mutex<usize>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every save fails.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Default::default()
        }
    }

    pub fn snapshot(&self) -> Option<RunState> {
        self.state.lock().unwrap().clone()
    }

    pub fn saves(&self) -> usize {
        *self.save_count.lock().unwrap()
    }
}

impl StateStore for MemoryStateStore {
    fn load(&self) -> Result<RunState, AppError> {
        Ok(self.state.lock().unwrap().clone().unwrap_or_default())
    }

    fn save(&self, state: &RunState) -> Result<(), AppError> {
        if self.failing {
            return Err(AppError::State("disk full".into()));
        }
        *self.state.lock().unwrap() = Some(state.clone());
        *self.save_count.lock().unwrap() += 1;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Engine reporter that records compact event labels for assertions.
#[derive(Default, Clone)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Labels starting with the given prefix, in order.
    pub fn labels_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.labels()
            .into_iter()
            .filter(|l| l.starts_with(prefix))
            .collect()
    }
}

impl EngineReporter for MockReporter {
    fn report(&self, event: EngineEvent<'_>) {
        let label = match event {
            EngineEvent::Started { queued, .. } => format!("started:{queued}"),
            EngineEvent::ItemStarted { key, .. } => format!("item:{key}"),
            EngineEvent::SourceSkipped { key, source_id } => format!("skip:{key}:{source_id}"),
            EngineEvent::SourceFailed { key, source_id, .. } => {
                format!("srcfail:{key}:{source_id}")
            }
            EngineEvent::ArtifactsFound {
                key,
                source_id,
                count,
            } => format!("hit:{key}:{source_id}:{count}"),
            EngineEvent::ItemSettled {
                key,
                status,
                will_retry,
            } => format!("settled:{key}:{status}:{will_retry}"),
            EngineEvent::Interrupted { processed } => format!("interrupted:{processed}"),
            EngineEvent::Finished { processed } => format!("finished:{processed}"),
        };
        self.events.lock().unwrap().push(label);
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Catalog record with sensible defaults for tests.
pub fn make_test_record(key: &str, vendor: &str, price: f64) -> CatalogRecord {
    CatalogRecord {
        key: key.to_string(),
        title: format!("Product {key}"),
        vendor: vendor.to_string(),
        price,
        category: "misc".to_string(),
        has_artifact: false,
    }
}
