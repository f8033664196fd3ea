//! Error types for Pitchlens operations.
//!
//! [`PitchlensError`] is what callers see. [`ServiceError`] is the
//! classification a [`ModelTransport`](crate::ModelTransport) reports for a
//! single failed call; the analyzer decides from it whether to retry.
//!
//! # Example
//!
//! ```rust
//! use pitchlens_core::{PitchlensError, Result};
//!
//! fn require_copy(text: &str) -> Result<&str> {
//!     if text.trim().is_empty() {
//!         return Err(PitchlensError::InvalidInput("no text to analyze".to_string()));
//!     }
//!     Ok(text)
//! }
//! ```

use std::time::Duration;

use thiserror::Error;

/// Main error type for extraction and analysis.
///
/// The extractor produces `InvalidUrl`, `Network`, `Fetch`,
/// `UnsupportedContent` and `HtmlParse`. The analyzer produces the rest.
/// Transient service failures never surface on their own: they are retried,
/// and only show up as the source of [`PitchlensError::ServiceUnavailable`].
///
/// # Example
///
/// ```rust,no_run
/// use pitchlens_core::{Extractor, PitchlensError};
///
/// # async fn run() {
/// match Extractor::new().extract("https://example.com").await {
///     Ok(page) => println!("{} words", page.word_count()),
///     Err(PitchlensError::Fetch { status }) => eprintln!("server said {}", status),
///     Err(e) => eprintln!("Error: {}", e),
/// }
/// # }
/// ```
#[derive(Error, Debug)]
pub enum PitchlensError {
    /// The URL could not be parsed or is not http/https.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection, DNS, TLS or timeout failure while fetching a page.
    #[error("Network error: {0}")]
    Network(String),

    /// The page responded with a non-2xx status.
    #[error("Fetch failed with HTTP status {status}")]
    Fetch { status: u16 },

    /// The response is not something we can read as HTML or text.
    #[error("Unsupported content: {0}")]
    UnsupportedContent(String),

    /// The HTML rewriter rejected the document.
    #[error("Failed to parse HTML: {0}")]
    HtmlParse(String),

    /// Analyzer input was empty or whitespace-only.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The AI service rejected the credential.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The AI service rejected the request itself.
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// The AI service answered, but not with a conforming analysis.
    #[error("Response failed schema validation: {0}")]
    SchemaValidation(String),

    /// Every attempt failed transiently.
    ///
    /// `source` is the failure of the final attempt.
    #[error("AI service unavailable after {attempts} attempts: {source}")]
    ServiceUnavailable {
        attempts: u32,
        #[source]
        source: ServiceError,
    },
}

/// Failure of a single call to the AI service.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// HTTP 429 or a quota/resource-exhausted envelope.
    #[error("rate limited: {message}")]
    RateLimited { message: String, retry_after: Option<Duration> },

    /// 5xx or an internal/unavailable envelope.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The request never produced a response (connect, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The credential was refused.
    #[error("authentication error: {0}")]
    Auth(String),

    /// The service refused the request as malformed.
    #[error("bad request (HTTP {status}): {message}")]
    BadRequest { status: u16, message: String },

    /// A 2xx response that carried no usable text.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Whether another attempt might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ServiceError::RateLimited { .. } | ServiceError::Server { .. } | ServiceError::Transport(_)
        )
    }

    /// Minimum wait the service asked for, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ServiceError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<ServiceError> for PitchlensError {
    /// Maps a non-retried service failure to the caller-facing error.
    ///
    /// Transient variants only reach this conversion when the retry loop is
    /// bypassed; they become `ServiceUnavailable` after a single attempt.
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Auth(message) => PitchlensError::Auth(message),
            ServiceError::BadRequest { status, message } => {
                PitchlensError::MalformedRequest(format!("HTTP {}: {}", status, message))
            }
            ServiceError::InvalidResponse(message) => PitchlensError::SchemaValidation(message),
            transient => PitchlensError::ServiceUnavailable { attempts: 1, source: transient },
        }
    }
}

/// Result type alias for PitchlensError.
pub type Result<T> = std::result::Result<T, PitchlensError>;
