pub mod engine;
pub mod error;
pub mod item;
pub mod politeness;
pub mod registry;
pub mod report;
pub mod scheduler;
pub mod sources;
pub mod state;
pub mod testutil;
pub mod traits;

pub use engine::{Engine, EngineConfig, EngineReporter, RunSummary, TracingReporter};
pub use error::{AppError, ErrorClass};
pub use item::{CatalogRecord, Item, ItemStatus};
pub use state::{RunState, SourceStat, StatusCounts};
pub use traits::{
    ArchiveLookup, ArtifactExtractor, CatalogProvider, FetchResponse, Fetcher, StateStore,
};
