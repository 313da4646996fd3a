//! Source health tracking and the per-source circuit breaker.
//!
//! Two suspension mechanisms, deliberately distinct:
//!
//! ```text
//! healthy --[3 consecutive failures]--> cooling --[cooldown lapses]--> healthy
//!    |                                                                   |
//!    +--[blocking error: 401/403/429]--> BLOCKED (permanent for the run)-+-> never
//! ```
//!
//! A cooldown is timed and self-healing; a block is monotonic and lasts
//! until the process exits. Any success clears the failure streak and an
//! active cooldown, but never a block.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::ErrorClass;
use crate::state::SourceStat;

/// Configuration for the per-source circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitConfig {
    /// Consecutive non-blocking failures before a source enters cooldown.
    pub fail_threshold: u32,

    /// How long a cooling source stays ineligible.
    pub cooldown: TimeDelta,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            fail_threshold: 3,
            cooldown: TimeDelta::minutes(5),
        }
    }
}

/// Tracks per-source health for one run and decides which sources may be
/// contacted. Stats are created lazily on first contact and round-trip
/// through the persisted state on every checkpoint.
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    config: CircuitConfig,
    stats: BTreeMap<String, SourceStat>,
}

impl SourceRegistry {
    pub fn new(config: CircuitConfig) -> Self {
        Self {
            config,
            stats: BTreeMap::new(),
        }
    }

    /// Rebuild from a persisted snapshot when resuming a run.
    pub fn from_stats(config: CircuitConfig, stats: BTreeMap<String, SourceStat>) -> Self {
        Self { config, stats }
    }

    /// Snapshot for persistence.
    pub fn stats(&self) -> &BTreeMap<String, SourceStat> {
        &self.stats
    }

    fn entry(&mut self, source_id: &str) -> &mut SourceStat {
        self.stats
            .entry(source_id.to_string())
            .or_insert_with(|| SourceStat::new(source_id))
    }

    /// May this source be contacted right now?
    pub fn is_eligible(&mut self, source_id: &str) -> bool {
        self.is_eligible_at(source_id, Utc::now())
    }

    pub fn is_eligible_at(&mut self, source_id: &str, now: DateTime<Utc>) -> bool {
        let stat = self.entry(source_id);
        if stat.blocked {
            return false;
        }
        if let Some(until) = stat.cooldown_until {
            if now < until {
                return false;
            }
            // Cooldown lapsed: the source gets a clean slate.
            tracing::info!(source = %source_id, "Cooldown lapsed, source back in rotation");
            stat.cooldown_until = None;
            stat.consecutive_fails = 0;
        }
        true
    }

    /// Record a successful contact. `artifacts` is the number of candidates
    /// the source produced; zero still counts as healthy.
    pub fn record_success(&mut self, source_id: &str, artifacts: usize) {
        let stat = self.entry(source_id);
        if artifacts > 0 {
            stat.found_count += 1;
        }
        stat.consecutive_fails = 0;
        stat.cooldown_until = None;
    }

    pub fn record_failure(&mut self, source_id: &str, class: ErrorClass) {
        self.record_failure_at(source_id, class, Utc::now());
    }

    pub fn record_failure_at(&mut self, source_id: &str, class: ErrorClass, now: DateTime<Utc>) {
        let fail_threshold = self.config.fail_threshold;
        let cooldown = self.config.cooldown;

        let stat = self.entry(source_id);
        stat.failed_count += 1;

        if class == ErrorClass::SourceBlocking {
            tracing::warn!(source = %source_id, "Source blocked for the remainder of the run");
            stat.blocked = true;
            return;
        }

        stat.consecutive_fails += 1;
        if stat.consecutive_fails >= fail_threshold && stat.cooldown_until.is_none() {
            stat.cooldown_until = Some(now + cooldown);
            tracing::warn!(
                source = %source_id,
                fails = stat.consecutive_fails,
                "Source entering cooldown after {} consecutive failures",
                stat.consecutive_fails
            );
        }
    }
}
