use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::item::{CatalogRecord, Item, ItemStatus};

/// Bumped whenever the on-disk layout changes incompatibly.
pub const STATE_VERSION: u32 = 1;

/// Aggregate item counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: usize,
    pub searching: usize,
    pub found: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.pending + self.searching + self.found + self.failed + self.skipped
    }

    fn bump(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Pending => self.pending += 1,
            ItemStatus::Searching => self.searching += 1,
            ItemStatus::Found => self.found += 1,
            ItemStatus::Failed => self.failed += 1,
            ItemStatus::Skipped => self.skipped += 1,
        }
    }
}

/// Running health record for one external source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStat {
    pub source_id: String,
    pub found_count: u64,
    pub failed_count: u64,
    pub consecutive_fails: u32,
    /// Permanent for the run; never cleared.
    pub blocked: bool,
    /// Advisory; re-evaluated on every eligibility check.
    pub cooldown_until: Option<DateTime<Utc>>,
}

impl SourceStat {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            found_count: 0,
            failed_count: 0,
            consecutive_fails: 0,
            blocked: false,
            cooldown_until: None,
        }
    }
}

/// Full durable snapshot of one backfill run.
///
/// Serialized wholesale after every processed item, so the on-disk document
/// always reflects a consistent prefix of completed work.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunState {
    pub version: u32,
    pub run_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub stats: StatusCounts,
    pub items: BTreeMap<String, Item>,
    pub source_stats: BTreeMap<String, SourceStat>,
}

impl RunState {
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            version: STATE_VERSION,
            run_id: Uuid::new_v4(),
            created_at: now,
            last_updated: now,
            stats: StatusCounts::default(),
            items: BTreeMap::new(),
            source_stats: BTreeMap::new(),
        }
    }

    /// Fold freshly loaded catalog records into the state.
    ///
    /// A record becomes an item the first time it is seen without an
    /// artifact; its ordinal and priority score are pinned at that moment.
    /// Existing items keep their history. Returns the number of items added.
    pub fn absorb_catalog<F>(&mut self, records: &[CatalogRecord], score: F) -> usize
    where
        F: Fn(&CatalogRecord) -> u8,
    {
        let mut added = 0;
        for (ordinal, record) in records.iter().enumerate() {
            if record.has_artifact || self.items.contains_key(&record.key) {
                continue;
            }
            let item = Item::from_record(record, ordinal, score(record));
            self.items.insert(record.key.clone(), item);
            added += 1;
        }
        added
    }

    /// Re-queue work that should run again: items stuck `searching` (a crash
    /// mid-item) always go back to `pending`; `failed` items go back only in
    /// re-queue mode and only while attempts remain. Returns the number
    /// re-queued.
    pub fn requeue(&mut self, max_attempts: u32, requeue_failed: bool) -> usize {
        let mut requeued = 0;
        for item in self.items.values_mut() {
            match item.status {
                ItemStatus::Searching => {
                    item.status = ItemStatus::Pending;
                    requeued += 1;
                }
                ItemStatus::Failed if requeue_failed && item.can_retry(max_attempts) => {
                    item.status = ItemStatus::Pending;
                    requeued += 1;
                }
                _ => {}
            }
        }
        requeued
    }

    /// Operator skip: the named items become terminal and are never retried.
    pub fn mark_skipped(&mut self, keys: &[String]) -> usize {
        let mut marked = 0;
        for key in keys {
            if let Some(item) = self.items.get_mut(key)
                && item.status != ItemStatus::Skipped
            {
                item.status = ItemStatus::Skipped;
                marked += 1;
            }
        }
        marked
    }

    /// Recompute `stats` from the item map.
    pub fn recount(&mut self) {
        let mut counts = StatusCounts::default();
        for item in self.items.values() {
            counts.bump(item.status);
        }
        self.stats = counts;
    }

    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
