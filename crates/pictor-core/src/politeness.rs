//! Per-host politeness delays between fetches.
//!
//! Wraps any [`Fetcher`] so consecutive requests to the same host are
//! spaced out. The timestamp is recorded only after a *successful* fetch;
//! the politeness window is independent of the fetcher's retry backoff.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use url::Url;

use crate::error::AppError;
use crate::traits::{FetchResponse, Fetcher};

/// Configuration for the politeness wrapper.
#[derive(Debug, Clone)]
pub struct PolitenessConfig {
    /// Minimum delay after a successful fetch before the next request to
    /// the same host.
    pub delay: Duration,

    /// Maximum random jitter added on top of `delay` (uniform [0, jitter]).
    /// Set to `Duration::ZERO` to disable.
    pub jitter: Duration,
}

impl PolitenessConfig {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            jitter: Duration::ZERO,
        }
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    fn effective_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.delay;
        }
        self.delay + Duration::from_millis(rand_jitter_ms(self.jitter.as_millis() as u64))
    }
}

impl Default for PolitenessConfig {
    /// 1 second delay, 250ms jitter.
    fn default() -> Self {
        Self {
            delay: Duration::from_secs(1),
            jitter: Duration::from_millis(250),
        }
    }
}

/// A [`Fetcher`] wrapper that enforces per-host politeness delays.
#[derive(Clone)]
pub struct PoliteFetcher<F> {
    inner: F,
    config: PolitenessConfig,
    /// Last successful fetch per host key.
    last_success: Arc<Mutex<HashMap<String, Instant>>>,
}

impl<F: Fetcher> PoliteFetcher<F> {
    pub fn new(inner: F, config: PolitenessConfig) -> Self {
        Self {
            inner,
            config,
            last_success: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Host key for a URL (scheme://host:port).
    fn host_key(url_str: &str) -> Option<String> {
        let url = Url::parse(url_str).ok()?;
        let host = url.host_str()?;
        let port = url
            .port_or_known_default()
            .map(|p| format!(":{p}"))
            .unwrap_or_default();
        Some(format!("{}://{}{}", url.scheme(), host, port))
    }

    async fn wait_for(&self, key: &str) {
        let last = {
            let map = self.last_success.lock().await;
            map.get(key).copied()
        };
        if let Some(last) = last {
            let elapsed = last.elapsed();
            let required = self.config.effective_delay();
            if elapsed < required {
                let pause = required - elapsed;
                tracing::debug!(
                    host = %key,
                    pause_ms = %pause.as_millis(),
                    "Politeness delay before next request"
                );
                tokio::time::sleep(pause).await;
            }
        }
    }
}

impl<F: Fetcher> Fetcher for PoliteFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, AppError> {
        let key = Self::host_key(url);
        if let Some(key) = &key {
            self.wait_for(key).await;
        }
        let result = self.inner.fetch(url).await;
        if result.is_ok()
            && let Some(key) = key
        {
            self.last_success.lock().await.insert(key, Instant::now());
        }
        result
    }
}

// Deterministic jitter seeded from the clock; good enough for request
// spacing without pulling in the `rand` crate.
fn rand_jitter_ms(max_ms: u64) -> u64 {
    if max_ms == 0 {
        return 0;
    }
    let mut x = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;
    // xorshift64
    x ^= x << 13;
    x ^= x >> 7;
    x ^= x << 17;
    x % max_ms
}
