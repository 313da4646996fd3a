//! The orchestration loop: what to try next, and when to give up.
//!
//! Strictly sequential: the engine walks the priority queue,
//! consults each item's source plan through the circuit breaker, and
//! checkpoints the full run state after every item, so a crash at any
//! point loses at most the in-flight network call.

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::AppError;
use crate::item::{CatalogRecord, Item, ItemStatus, SourceOutcome};
use crate::registry::{CircuitConfig, SourceRegistry};
use crate::scheduler;
use crate::sources::{self, SearchSource, SourceKind};
use crate::state::{RunState, StatusCounts};
use crate::traits::{ArchiveLookup, ArtifactExtractor, Fetcher, StateStore};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Attempts per item before `failed` becomes terminal.
    pub max_attempts: u32,

    /// Cap on items processed this invocation.
    pub limit: Option<usize>,

    /// Whether failed items with attempts remaining go back to `pending`.
    pub requeue_failed: bool,

    /// Search and transition in memory, but never write the state file.
    pub dry_run: bool,

    /// Item keys to mark skipped before the queue is built.
    pub skips: Vec<String>,

    pub circuit: CircuitConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            limit: None,
            requeue_failed: true,
            dry_run: false,
            skips: Vec::new(),
            circuit: CircuitConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_skips(mut self, skips: Vec<String>) -> Self {
        self.skips = skips;
        self
    }
}

/// Events emitted by the engine for monitoring/logging.
#[derive(Debug, Clone)]
pub enum EngineEvent<'a> {
    Started { run_id: Uuid, queued: usize },
    ItemStarted { key: &'a str, score: u8, attempt: u32 },
    SourceSkipped { key: &'a str, source_id: &'a str },
    SourceFailed { key: &'a str, source_id: &'a str, error: &'a str },
    ArtifactsFound { key: &'a str, source_id: &'a str, count: usize },
    ItemSettled { key: &'a str, status: ItemStatus, will_retry: bool },
    Interrupted { processed: usize },
    Finished { processed: usize },
}

/// Trait for receiving engine events (decoupled logging).
pub trait EngineReporter: Send + Sync {
    fn report(&self, event: EngineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl EngineReporter for TracingReporter {
    fn report(&self, event: EngineEvent<'_>) {
        match event {
            EngineEvent::Started { run_id, queued } => {
                tracing::info!(%run_id, %queued, "Backfill run started");
            }
            EngineEvent::ItemStarted {
                key,
                score,
                attempt,
            } => {
                tracing::info!(%key, %score, %attempt, "Searching for artifacts");
            }
            EngineEvent::SourceSkipped { key, source_id } => {
                tracing::debug!(%key, source = %source_id, "Source not eligible, skipping");
            }
            EngineEvent::SourceFailed {
                key,
                source_id,
                error,
            } => {
                tracing::warn!(%key, source = %source_id, %error, "Source failed");
            }
            EngineEvent::ArtifactsFound {
                key,
                source_id,
                count,
            } => {
                tracing::info!(%key, source = %source_id, %count, "Candidate artifacts found");
            }
            EngineEvent::ItemSettled {
                key,
                status,
                will_retry,
            } => {
                tracing::info!(%key, %status, %will_retry, "Item settled");
            }
            EngineEvent::Interrupted { processed } => {
                tracing::warn!(%processed, "Run interrupted; state checkpointed");
            }
            EngineEvent::Finished { processed } => {
                tracing::info!(%processed, "Run finished");
            }
        }
    }
}

/// Summary returned by [`Engine::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub counts: StatusCounts,
    pub interrupted: bool,
}

/// Drives the backfill over a catalog, composing the fetcher, extraction
/// adapter, archive lookup, and state store behind their trait seams.
pub struct Engine<F, X, A, S>
where
    F: Fetcher,
    X: ArtifactExtractor,
    A: ArchiveLookup,
    S: StateStore,
{
    fetcher: F,
    extractor: X,
    archive: A,
    store: S,
    config: EngineConfig,
}

impl<F, X, A, S> Engine<F, X, A, S>
where
    F: Fetcher,
    X: ArtifactExtractor,
    A: ArchiveLookup,
    S: StateStore,
{
    pub fn new(fetcher: F, extractor: X, archive: A, store: S, config: EngineConfig) -> Self {
        Self {
            fetcher,
            extractor,
            archive,
            store,
            config,
        }
    }

    /// Run the backfill over `catalog`, folding results into `state`.
    ///
    /// Returns the final state and a summary. The only error that escapes
    /// is a state-store write failure; everything else is contained at the
    /// item or source level.
    pub async fn run<R: EngineReporter>(
        &self,
        mut state: RunState,
        catalog: Vec<CatalogRecord>,
        cancel: CancellationToken,
        reporter: &R,
    ) -> Result<(RunState, RunSummary), AppError> {
        let added = state.absorb_catalog(&catalog, scheduler::score);
        let skipped = state.mark_skipped(&self.config.skips);
        let requeued = state.requeue(self.config.max_attempts, self.config.requeue_failed);
        tracing::info!(added, requeued, skipped, "Queue prepared");

        let mut queue = scheduler::rank(
            state
                .items
                .values()
                .filter(|item| item.status == ItemStatus::Pending),
        );
        if let Some(limit) = self.config.limit {
            queue.truncate(limit);
        }

        let mut registry = SourceRegistry::from_stats(
            self.config.circuit.clone(),
            std::mem::take(&mut state.source_stats),
        );

        reporter.report(EngineEvent::Started {
            run_id: state.run_id,
            queued: queue.len(),
        });

        let mut processed = 0usize;
        let mut interrupted = false;

        for key in &queue {
            // Interrupts are honored between items only; the in-flight item
            // finishes and is checkpointed before the loop exits.
            if cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            let outcome = match state.items.get_mut(key) {
                Some(item) => self.process_item(item, &mut registry, reporter).await,
                None => Ok(()),
            };
            if let Err(e) = outcome {
                // Loop-level boundary: nothing inside the per-item procedure
                // may take the run down.
                tracing::error!(item = %key, error = %e, "Item procedure failed");
                if let Some(item) = state.items.get_mut(key) {
                    item.status = ItemStatus::Failed;
                    item.last_error = Some(e.to_string());
                }
            }
            processed += 1;
            self.checkpoint(&mut state, &registry)?;
        }

        self.checkpoint(&mut state, &registry)?;

        if interrupted {
            reporter.report(EngineEvent::Interrupted { processed });
        } else {
            reporter.report(EngineEvent::Finished { processed });
        }

        let summary = RunSummary {
            processed,
            counts: state.stats,
            interrupted,
        };
        Ok((state, summary))
    }

    async fn process_item<R: EngineReporter>(
        &self,
        item: &mut Item,
        registry: &mut SourceRegistry,
        reporter: &R,
    ) -> Result<(), AppError> {
        item.status = ItemStatus::Searching;
        item.attempts += 1;
        item.last_attempt_at = Some(Utc::now());
        reporter.report(EngineEvent::ItemStarted {
            key: &item.key,
            score: item.priority_score,
            attempt: item.attempts,
        });

        let plan = sources::plan_for(item);
        let mut found: Vec<String> = Vec::new();
        let mut consulted = 0usize;
        let mut last_source_error: Option<String> = None;

        for source in &plan {
            if !registry.is_eligible(&source.id) {
                reporter.report(EngineEvent::SourceSkipped {
                    key: &item.key,
                    source_id: &source.id,
                });
                continue;
            }
            consulted += 1;
            match self.consult(source, item).await {
                Ok(candidates) => {
                    registry.record_success(&source.id, candidates.len());
                    item.sources_tried.insert(
                        source.id.clone(),
                        SourceOutcome::hit(candidates.len() as u32),
                    );
                    if !candidates.is_empty() {
                        reporter.report(EngineEvent::ArtifactsFound {
                            key: &item.key,
                            source_id: &source.id,
                            count: candidates.len(),
                        });
                        found = candidates;
                        break;
                    }
                }
                Err(e) => {
                    let message = e.to_string();
                    reporter.report(EngineEvent::SourceFailed {
                        key: &item.key,
                        source_id: &source.id,
                        error: &message,
                    });
                    registry.record_failure(&source.id, e.class());
                    item.sources_tried
                        .insert(source.id.clone(), SourceOutcome::failure(message.clone()));
                    last_source_error = Some(message);
                }
            }
        }

        if found.is_empty() {
            // Zero eligible sources is a terminal condition for this pass;
            // resume may still re-queue the item once cooldowns lapse.
            let will_retry = consulted > 0
                && self.config.requeue_failed
                && item.can_retry(self.config.max_attempts);
            item.status = if will_retry {
                ItemStatus::Pending
            } else {
                ItemStatus::Failed
            };
            item.last_error = Some(if consulted == 0 {
                "no eligible source".to_string()
            } else {
                last_source_error
                    .unwrap_or_else(|| "no artifacts from any eligible source".to_string())
            });
            reporter.report(EngineEvent::ItemSettled {
                key: &item.key,
                status: item.status,
                will_retry,
            });
        } else {
            item.record_artifacts(&found);
            item.status = ItemStatus::Found;
            item.last_error = None;
            reporter.report(EngineEvent::ItemSettled {
                key: &item.key,
                status: item.status,
                will_retry: false,
            });
        }

        Ok(())
    }

    async fn consult(&self, source: &SearchSource, item: &Item) -> Result<Vec<String>, AppError> {
        match source.kind {
            SourceKind::Archive => self.archive.lookup(&item.key, &item.title),
            SourceKind::Web => {
                let url = source.query_url.as_deref().ok_or_else(|| {
                    AppError::Config(format!("source {} has no query URL", source.id))
                })?;
                let page = self.fetcher.fetch(url).await?;
                self.extractor.extract(&page.body, &page.final_url)
            }
        }
    }

    fn checkpoint(&self, state: &mut RunState, registry: &SourceRegistry) -> Result<(), AppError> {
        state.source_stats = registry.stats().clone();
        state.recount();
        state.touch();
        if self.config.dry_run {
            return Ok(());
        }
        // A failed save is the one error that aborts the run.
        self.store.save(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    type TestEngine = Engine<MockFetcher, MockExtractor, MockArchive, MemoryStateStore>;

    fn engine(
        fetcher: MockFetcher,
        extractor: MockExtractor,
        archive: MockArchive,
        store: MemoryStateStore,
    ) -> TestEngine {
        Engine::new(fetcher, extractor, archive, store, EngineConfig::default())
    }

    fn candidates() -> Vec<String> {
        vec!["https://cdn.example.com/product.jpg".to_string()]
    }

    async fn run_engine(
        engine: &TestEngine,
        state: RunState,
        catalog: Vec<CatalogRecord>,
    ) -> (RunState, RunSummary, MockReporter) {
        let reporter = MockReporter::new();
        let (state, summary) = engine
            .run(state, catalog, CancellationToken::new(), &reporter)
            .await
            .unwrap();
        (state, summary, reporter)
    }

    #[tokio::test]
    async fn happy_path_marks_items_found() {
        let store = MemoryStateStore::new();
        let eng = engine(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            store.clone(),
        );
        let catalog = vec![
            make_test_record("item-0", "aurelia", 100.0),
            make_test_record("item-1", "aurelia", 100.0),
        ];

        let (state, summary, _) = run_engine(&eng, RunState::new(), catalog).await;

        assert_eq!(summary.processed, 2);
        assert!(!summary.interrupted);
        assert_eq!(state.stats.found, 2);
        for item in state.items.values() {
            assert_eq!(item.status, ItemStatus::Found);
            assert_eq!(
                item.selected_artifact.as_deref(),
                Some("https://cdn.example.com/product.jpg")
            );
            // The archive was consulted first and recorded as a miss.
            assert_eq!(item.sources_tried["archive"].artifacts, 0);
        }
        // One save per item plus the final checkpoint.
        assert_eq!(store.saves(), 3);
        assert_eq!(state.source_stats["manufacturer:aurelia"].found_count, 2);
    }

    #[tokio::test]
    async fn archive_hit_short_circuits_network() {
        let fetcher = MockFetcher::default();
        let eng = engine(
            fetcher.clone(),
            MockExtractor::fixed(candidates()),
            MockArchive::with_hit("item-0", vec!["/archive/item-0.jpg".to_string()]),
            MemoryStateStore::new(),
        );

        let (state, _, _) = run_engine(
            &eng,
            RunState::new(),
            vec![make_test_record("item-0", "aurelia", 100.0)],
        )
        .await;

        assert_eq!(state.items["item-0"].status, ItemStatus::Found);
        assert_eq!(
            state.items["item-0"].selected_artifact.as_deref(),
            Some("/archive/item-0.jpg")
        );
        assert!(fetcher.fetched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn processing_order_follows_priority() {
        let eng = engine(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            MemoryStateStore::new(),
        );
        // Same vendor and category, so price alone orders the queue.
        let catalog = vec![
            make_test_record("cheap", "aurelia", 50.0),
            make_test_record("dear", "aurelia", 500.0),
            make_test_record("middle", "aurelia", 200.0),
        ];

        let (_, _, reporter) = run_engine(&eng, RunState::new(), catalog).await;

        assert_eq!(
            reporter.labels_with_prefix("item:"),
            vec!["item:dear", "item:middle", "item:cheap"]
        );
    }

    #[tokio::test]
    async fn terminal_failures_requeue_until_attempts_exhausted() {
        let store = MemoryStateStore::new();
        let eng = engine(
            MockFetcher::always_failing(404),
            MockExtractor::default(),
            MockArchive::default(),
            store.clone(),
        );
        let catalog = vec![make_test_record("item-0", "aurelia", 100.0)];

        let (state, _, _) = run_engine(&eng, RunState::new(), catalog.clone()).await;
        assert_eq!(state.items["item-0"].status, ItemStatus::Pending);
        assert_eq!(state.items["item-0"].attempts, 1);
        assert!(state.items["item-0"].last_error.is_some());

        let (state, _, _) = run_engine(&eng, state, catalog.clone()).await;
        assert_eq!(state.items["item-0"].status, ItemStatus::Pending);
        assert_eq!(state.items["item-0"].attempts, 2);

        let (state, _, _) = run_engine(&eng, state, catalog.clone()).await;
        assert_eq!(state.items["item-0"].status, ItemStatus::Failed);
        assert_eq!(state.items["item-0"].attempts, 3);

        // Terminal now: another run must not touch it.
        let (state, summary, _) = run_engine(&eng, state, catalog).await;
        assert_eq!(summary.processed, 0);
        assert_eq!(state.items["item-0"].attempts, 3);
    }

    #[tokio::test]
    async fn blocking_error_blocks_sources_for_the_run() {
        let fetcher = MockFetcher::always_failing(403);
        let eng = engine(
            fetcher.clone(),
            MockExtractor::default(),
            MockArchive::default(),
            MemoryStateStore::new(),
        );
        let catalog = vec![
            make_test_record("item-0", "aurelia", 100.0),
            make_test_record("item-1", "aurelia", 100.0),
        ];

        let (state, _, reporter) = run_engine(&eng, RunState::new(), catalog).await;

        // Item 0 burned each web source once; item 1 found them all blocked.
        assert_eq!(fetcher.fetched.lock().unwrap().len(), 3);
        assert!(state.source_stats["manufacturer:aurelia"].blocked);
        assert!(state.source_stats["retailer:bazaarly"].blocked);
        assert!(
            reporter
                .labels()
                .contains(&"skip:item-1:manufacturer:aurelia".to_string())
        );
        // With no artifacts anywhere, both items remain queued for retry.
        assert_eq!(state.stats.pending, 2);
    }

    #[tokio::test]
    async fn three_consecutive_failures_put_source_on_cooldown() {
        let eng = engine(
            MockFetcher::always_failing(500),
            MockExtractor::default(),
            MockArchive::default(),
            MemoryStateStore::new(),
        );
        let catalog = vec![
            make_test_record("item-0", "aurelia", 100.0),
            make_test_record("item-1", "aurelia", 100.0),
            make_test_record("item-2", "aurelia", 100.0),
            make_test_record("item-3", "aurelia", 100.0),
        ];

        let (state, _, reporter) = run_engine(&eng, RunState::new(), catalog).await;

        let stat = &state.source_stats["manufacturer:aurelia"];
        assert!(!stat.blocked);
        assert_eq!(stat.consecutive_fails, 3);
        assert!(stat.cooldown_until.is_some());
        // The fourth item saw every web source cooling.
        assert!(
            reporter
                .labels()
                .contains(&"skip:item-3:manufacturer:aurelia".to_string())
        );
    }

    #[tokio::test]
    async fn resume_skips_completed_items() {
        let store = MemoryStateStore::new();
        let catalog = vec![
            make_test_record("item-0", "aurelia", 300.0),
            make_test_record("item-1", "aurelia", 200.0),
            make_test_record("item-2", "aurelia", 100.0),
        ];

        // First invocation handles only the top-priority item.
        let first_fetcher = MockFetcher::default();
        let eng = Engine::new(
            first_fetcher.clone(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            store.clone(),
            EngineConfig::default().with_limit(Some(1)),
        );
        let (_, summary, _) = run_engine(&eng, RunState::new(), catalog.clone()).await;
        assert_eq!(summary.processed, 1);

        // Second invocation resumes from the stored snapshot.
        let second_fetcher = MockFetcher::default();
        let eng = Engine::new(
            second_fetcher.clone(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            store.clone(),
            EngineConfig::default(),
        );
        let resumed = store.load().unwrap();
        let (state, summary, _) = run_engine(&eng, resumed, catalog).await;

        assert_eq!(summary.processed, 2);
        assert_eq!(state.stats.found, 3);
        // item-0 was already found; its query must never be fetched again.
        let first_urls = first_fetcher.fetched.lock().unwrap().clone();
        let second_urls = second_fetcher.fetched.lock().unwrap().clone();
        assert!(first_urls.iter().all(|u| u.contains("item-0")));
        assert!(second_urls.iter().all(|u| !u.contains("item-0")));
    }

    #[tokio::test]
    async fn resume_converges_to_same_state_as_uninterrupted_run() {
        let catalog = vec![
            make_test_record("item-0", "aurelia", 300.0),
            make_test_record("item-1", "aurelia", 200.0),
        ];

        // Uninterrupted baseline.
        let baseline_store = MemoryStateStore::new();
        let eng = engine(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            baseline_store.clone(),
        );
        let (baseline, _, _) = run_engine(&eng, RunState::new(), catalog.clone()).await;

        // Interrupted after one item, then resumed.
        let store = MemoryStateStore::new();
        let eng = Engine::new(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            store.clone(),
            EngineConfig::default().with_limit(Some(1)),
        );
        let (_, _, _) = run_engine(&eng, RunState::new(), catalog.clone()).await;
        let eng = engine(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            store.clone(),
        );
        let (resumed, _, _) = run_engine(&eng, store.load().unwrap(), catalog).await;

        for (key, expected) in &baseline.items {
            let actual = &resumed.items[key];
            assert_eq!(actual.status, expected.status);
            assert_eq!(actual.selected_artifact, expected.selected_artifact);
            assert_eq!(actual.found_artifacts, expected.found_artifacts);
            assert_eq!(actual.attempts, expected.attempts);
        }
        assert_eq!(resumed.stats, baseline.stats);
    }

    #[tokio::test]
    async fn cancellation_finishes_current_item_then_stops() {
        struct CancellingReporter {
            cancel: CancellationToken,
        }
        impl EngineReporter for CancellingReporter {
            fn report(&self, event: EngineEvent<'_>) {
                if matches!(event, EngineEvent::ItemSettled { .. }) {
                    self.cancel.cancel();
                }
            }
        }

        let store = MemoryStateStore::new();
        let eng = engine(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            store.clone(),
        );
        let catalog = vec![
            make_test_record("item-0", "aurelia", 300.0),
            make_test_record("item-1", "aurelia", 200.0),
            make_test_record("item-2", "aurelia", 100.0),
        ];

        let cancel = CancellationToken::new();
        let reporter = CancellingReporter {
            cancel: cancel.clone(),
        };
        let (state, summary) = eng
            .run(RunState::new(), catalog, cancel, &reporter)
            .await
            .unwrap();

        assert!(summary.interrupted);
        assert_eq!(summary.processed, 1);
        // The finished item was checkpointed before exit.
        assert_eq!(state.stats.found, 1);
        assert_eq!(state.stats.pending, 2);
        assert_eq!(store.snapshot().unwrap().stats.found, 1);
    }

    #[tokio::test]
    async fn archive_error_does_not_abort_the_item() {
        let eng = engine(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::with_error(AppError::Archive("permission denied".into())),
            MemoryStateStore::new(),
        );

        let (state, _, _) = run_engine(
            &eng,
            RunState::new(),
            vec![make_test_record("item-0", "aurelia", 100.0)],
        )
        .await;

        // The archive failure is recorded, and the web sources still ran.
        let item = &state.items["item-0"];
        assert_eq!(item.status, ItemStatus::Found);
        assert!(item.sources_tried["archive"].error.is_some());
    }

    #[tokio::test]
    async fn save_failure_aborts_the_run() {
        let eng = engine(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            MemoryStateStore::failing(),
        );

        let reporter = MockReporter::new();
        let result = eng
            .run(
                RunState::new(),
                vec![make_test_record("item-0", "aurelia", 100.0)],
                CancellationToken::new(),
                &reporter,
            )
            .await;

        assert!(matches!(result, Err(AppError::State(_))));
    }

    #[tokio::test]
    async fn dry_run_never_writes_state() {
        let store = MemoryStateStore::new();
        let eng = Engine::new(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            store.clone(),
            EngineConfig::default().with_dry_run(true),
        );

        let (state, _, _) = run_engine(
            &eng,
            RunState::new(),
            vec![make_test_record("item-0", "aurelia", 100.0)],
        )
        .await;

        // Transitions happened in memory only.
        assert_eq!(state.stats.found, 1);
        assert_eq!(store.saves(), 0);
        assert!(store.snapshot().is_none());
    }

    #[tokio::test]
    async fn operator_skip_is_terminal_and_never_fetched() {
        let fetcher = MockFetcher::default();
        let eng = Engine::new(
            fetcher.clone(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            MemoryStateStore::new(),
            EngineConfig::default().with_skips(vec!["item-0".to_string()]),
        );
        let catalog = vec![
            make_test_record("item-0", "aurelia", 300.0),
            make_test_record("item-1", "aurelia", 100.0),
        ];

        let (state, summary, _) = run_engine(&eng, RunState::new(), catalog).await;

        assert_eq!(state.items["item-0"].status, ItemStatus::Skipped);
        assert_eq!(summary.processed, 1);
        assert!(
            fetcher
                .fetched
                .lock()
                .unwrap()
                .iter()
                .all(|u| !u.contains("item-0"))
        );
    }

    #[tokio::test]
    async fn limit_caps_items_processed() {
        let store = MemoryStateStore::new();
        let eng = Engine::new(
            MockFetcher::default(),
            MockExtractor::fixed(candidates()),
            MockArchive::default(),
            store.clone(),
            EngineConfig::default().with_limit(Some(2)),
        );
        let catalog = (0..5)
            .map(|i| make_test_record(&format!("item-{i}"), "aurelia", 100.0))
            .collect();

        let (state, summary, _) = run_engine(&eng, RunState::new(), catalog).await;
        assert_eq!(summary.processed, 2);
        assert_eq!(state.stats.found, 2);
        assert_eq!(state.stats.pending, 3);
        assert_eq!(state.stats.total(), 5);
    }
}
