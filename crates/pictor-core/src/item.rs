use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of a catalog item in the backfill queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Searching,
    Found,
    Failed,
    Skipped,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Pending => "pending",
            ItemStatus::Searching => "searching",
            ItemStatus::Found => "found",
            ItemStatus::Failed => "failed",
            ItemStatus::Skipped => "skipped",
        }
    }

    /// `Found` and `Skipped` never leave their state. `Failed` is terminal
    /// only once attempts are exhausted; see [`Item::is_settled`].
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Found | ItemStatus::Skipped)
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ItemStatus::Pending),
            "searching" => Ok(ItemStatus::Searching),
            "found" => Ok(ItemStatus::Found),
            "failed" => Ok(ItemStatus::Failed),
            "skipped" => Ok(ItemStatus::Skipped),
            _ => Err(format!("Unknown item status: {}", s)),
        }
    }
}

/// One catalog entry as supplied by the provider.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRecord {
    pub key: String,
    pub title: String,
    pub vendor: String,
    pub price: f64,
    pub category: String,
    /// True when the catalog already carries an image for this entry.
    pub has_artifact: bool,
}

/// Outcome summary for one source consulted for one item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceOutcome {
    /// Candidate artifacts the source produced (0 for a clean miss).
    pub artifacts: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub at: DateTime<Utc>,
}

impl SourceOutcome {
    pub fn hit(artifacts: u32) -> Self {
        Self {
            artifacts,
            error: None,
            at: Utc::now(),
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            artifacts: 0,
            error: Some(error.into()),
            at: Utc::now(),
        }
    }
}

/// A catalog item tracked by the engine.
///
/// Items are never deleted; a terminal record is the audit trail of what
/// was tried and what came of it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub key: String,
    pub title: String,
    pub vendor: String,
    pub price: f64,
    pub category: String,
    /// Position in the source catalog; tie-break for the scheduler.
    pub ordinal: usize,
    /// Computed once when the item is first seen, reused afterwards.
    pub priority_score: u8,
    pub status: ItemStatus,
    pub attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub sources_tried: BTreeMap<String, SourceOutcome>,
    #[serde(default)]
    pub found_artifacts: Vec<String>,
    pub selected_artifact: Option<String>,
    pub last_error: Option<String>,
}

impl Item {
    pub fn from_record(record: &CatalogRecord, ordinal: usize, priority_score: u8) -> Self {
        Self {
            key: record.key.clone(),
            title: record.title.clone(),
            vendor: record.vendor.clone(),
            price: record.price,
            category: record.category.clone(),
            ordinal,
            priority_score,
            status: ItemStatus::Pending,
            attempts: 0,
            last_attempt_at: None,
            sources_tried: BTreeMap::new(),
            found_artifacts: Vec::new(),
            selected_artifact: None,
            last_error: None,
        }
    }

    pub fn can_retry(&self, max_attempts: u32) -> bool {
        self.attempts < max_attempts
    }

    /// True once this item will never be attempted again.
    pub fn is_settled(&self, max_attempts: u32) -> bool {
        self.status.is_terminal()
            || (self.status == ItemStatus::Failed && !self.can_retry(max_attempts))
    }

    /// Append candidates in order, skipping duplicates; the first candidate
    /// ever recorded becomes the selected artifact.
    pub fn record_artifacts(&mut self, candidates: &[String]) {
        for url in candidates {
            if !self.found_artifacts.contains(url) {
                self.found_artifacts.push(url.clone());
            }
        }
        if self.selected_artifact.is_none() {
            self.selected_artifact = self.found_artifacts.first().cloned();
        }
    }
}
