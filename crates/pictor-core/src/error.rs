use thiserror::Error;

/// How a failure should be handled by the engine and the circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Permanent for this request; trying again cannot help.
    Terminal,
    /// Transient; worth retrying on the backoff schedule.
    Retryable,
    /// The source is refusing us; stop contacting it for the rest of the run.
    SourceBlocking,
}

/// Application-wide error types for Pictor.
#[derive(Error, Debug)]
pub enum AppError {
    /// Non-success HTTP status that is neither a block signal nor a redirect.
    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    /// Request timed out.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// Connection-level failure (reset, refused, broken transport).
    #[error("network error: {0}")]
    Network(String),

    /// Hostname did not resolve.
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    /// The URL could not be parsed or uses a disallowed scheme.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Redirect chain exceeded the hop cap.
    #[error("redirect chain exceeded {0} hops")]
    TooManyRedirects(u32),

    /// The source denied access (401/403).
    #[error("access denied (HTTP {0})")]
    AccessDenied(u16),

    /// The source rate-limited us (429).
    #[error("rate limited by source")]
    RateLimited,

    /// Candidate extraction failed.
    #[error("extraction error: {0}")]
    Extraction(String),

    /// Catalog could not be read or parsed.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Local archive lookup failed.
    #[error("archive error: {0}")]
    Archive(String),

    /// State file could not be written or replaced.
    #[error("state store error: {0}")]
    State(String),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),
}

impl AppError {
    /// Classify this error for retry and circuit-breaker decisions.
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::Timeout(_) | AppError::Network(_) => ErrorClass::Retryable,
            AppError::HttpStatus { status, .. } if *status >= 500 => ErrorClass::Retryable,
            AppError::AccessDenied(_) | AppError::RateLimited => ErrorClass::SourceBlocking,
            _ => ErrorClass::Terminal,
        }
    }

    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        self.class() == ErrorClass::Retryable
    }

    /// Returns true if this error should take the source out of rotation.
    pub fn is_source_blocking(&self) -> bool {
        self.class() == ErrorClass::SourceBlocking
    }
}
