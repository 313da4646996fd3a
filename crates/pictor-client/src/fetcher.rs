use std::time::Duration;

use pictor_core::error::AppError;
use pictor_core::traits::{FetchResponse, Fetcher};
use reqwest::{Client, redirect};
use url::Url;

/// Hard cap on redirect hops; exceeding it is terminal, never retried.
const MAX_REDIRECT_HOPS: usize = 5;

/// Fixed backoff schedule for retryable failures.
const DEFAULT_BACKOFF: [Duration; 3] = [
    Duration::from_secs(1),
    Duration::from_secs(2),
    Duration::from_secs(4),
];

/// HTTP fetcher using reqwest.
///
/// Redirects are disabled at the client level and followed by hand, so the
/// hop count is explicit and bounded. Outcomes classify into terminal,
/// retryable, and source-blocking; retryable failures are retried on a
/// fixed backoff schedule before surfacing.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout_secs: u64,
    backoff: Vec<Duration>,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        let timeout_secs = timeout.as_secs();
        let client = Client::builder()
            .user_agent("Pictor/0.1 (catalog image backfill)")
            .redirect(redirect::Policy::none())
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Network(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
            backoff: DEFAULT_BACKOFF.to_vec(),
        })
    }

    /// Override the retry schedule. An empty schedule disables retries.
    pub fn with_backoff(mut self, backoff: Vec<Duration>) -> Self {
        self.backoff = backoff;
        self
    }

    /// One pass through the redirect chain, no retries.
    async fn fetch_once(&self, url: &str) -> Result<FetchResponse, AppError> {
        let mut current = validate_url(url).await?;

        for _hop in 0..=MAX_REDIRECT_HOPS {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|e| classify_transport(e, self.timeout_secs))?;

            let status = response.status();
            if status.is_redirection() {
                let location = response
                    .headers()
                    .get(reqwest::header::LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| AppError::HttpStatus {
                        status: status.as_u16(),
                        url: current.to_string(),
                    })?;
                // Location may be relative; resolve against the current URL.
                current = current.join(location).map_err(|e| {
                    AppError::InvalidUrl(format!("redirect target '{location}': {e}"))
                })?;
                continue;
            }

            if !status.is_success() {
                return Err(classify_status(status.as_u16(), current.as_str()));
            }

            let body = response
                .text()
                .await
                .map_err(|e| AppError::Network(format!("failed to read response body: {e}")))?;
            return Ok(FetchResponse {
                final_url: current.to_string(),
                body,
            });
        }

        Err(AppError::TooManyRedirects(MAX_REDIRECT_HOPS as u32))
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, AppError> {
        let mut retries = 0;
        loop {
            match self.fetch_once(url).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && retries < self.backoff.len() => {
                    let delay = self.backoff[retries];
                    retries += 1;
                    tracing::debug!(
                        %url,
                        retry = retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying fetch"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Parse and sanity-check a URL before any request goes out.
///
/// Hostnames are resolved up front so DNS failures classify as terminal
/// rather than surfacing as generic connect errors.
async fn validate_url(url: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(url).map_err(|e| AppError::InvalidUrl(format!("{url}: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AppError::InvalidUrl(format!(
                "scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| AppError::InvalidUrl(format!("{url}: missing host")))?;

    if host.parse::<std::net::IpAddr>().is_err() {
        let port = parsed.port_or_known_default().unwrap_or(80);
        let mut addrs = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| AppError::Dns(format!("{host}: {e}")))?;
        if addrs.next().is_none() {
            return Err(AppError::Dns(format!("{host}: no addresses returned")));
        }
    }

    Ok(parsed)
}

fn classify_transport(e: reqwest::Error, timeout_secs: u64) -> AppError {
    if e.is_timeout() {
        AppError::Timeout(timeout_secs)
    } else if e.is_connect() {
        AppError::Network(format!("connection failed: {e}"))
    } else {
        AppError::Network(e.to_string())
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
fn classify_status(status: u16, url: &str) -> AppError {
    match status {
        401 | 403 => AppError::AccessDenied(status),
        429 => AppError::RateLimited,
        _ => AppError::HttpStatus {
            status,
            url: url.to_string(),
        },
    }
}
