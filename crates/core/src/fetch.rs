//! Single-shot page fetching.
//!
//! One GET per call with a bounded timeout and a browser-like identity.
//! Retrying is the caller's business.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::{PitchlensError, Result};

/// Desktop Chrome identity; some sites refuse unidentified clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// HTTP client configuration for fetching web pages.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Request timeout in seconds.
    pub timeout: u64,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self { timeout: 10, user_agent: DEFAULT_USER_AGENT.to_string() }
    }
}

/// A successfully fetched, textual response.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects.
    pub url: Url,
    /// Declared content type, if the server sent one.
    pub content_type: Option<String>,
    /// Response body decoded with the declared charset (UTF-8 when none is given).
    pub body: String,
}

/// Parses and checks a caller-supplied URL.
///
/// Only `http` and `https` are accepted.
pub fn parse_http_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| PitchlensError::InvalidUrl(format!("{}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(PitchlensError::InvalidUrl(format!(
            "unsupported scheme '{}' (expected http or https)",
            other
        ))),
    }
}

/// Builds a reqwest client from the fetch configuration.
pub fn build_client(config: &FetchConfig) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(config.timeout))
        .user_agent(&config.user_agent)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| PitchlensError::Network(format!("failed to build HTTP client: {}", e)))
}

/// Fetches a page with a single GET.
///
/// Non-2xx statuses become [`PitchlensError::Fetch`], binary payloads become
/// [`PitchlensError::UnsupportedContent`], and anything that kept the request
/// from completing becomes [`PitchlensError::Network`].
pub async fn fetch_url(client: &Client, url: &str, config: &FetchConfig) -> Result<FetchedPage> {
    let parsed_url = parse_http_url(url)?;

    tracing::debug!(url = %parsed_url, timeout = config.timeout, "Fetching page");

    let response = client
        .get(parsed_url)
        .timeout(Duration::from_secs(config.timeout))
        .header(reqwest::header::USER_AGENT, &config.user_agent)
        .header(
            reqwest::header::ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        )
        .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .send()
        .await
        .map_err(|e| network_error(&e, config.timeout))?;

    let status = response.status();
    if !status.is_success() {
        tracing::warn!(url, status = status.as_u16(), "Page fetch returned non-success status");
        return Err(PitchlensError::Fetch { status: status.as_u16() });
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());

    if let Some(ct) = &content_type
        && !is_textual_content_type(ct)
    {
        return Err(PitchlensError::UnsupportedContent(format!("content type '{}'", ct)));
    }

    let body = response.text().await.map_err(|e| network_error(&e, config.timeout))?;

    if body.contains('\0') {
        return Err(PitchlensError::UnsupportedContent("binary response body".to_string()));
    }

    tracing::debug!(url = %final_url, bytes = body.len(), "Fetched page");

    Ok(FetchedPage { url: final_url, content_type, body })
}

/// Whether a `Content-Type` header value names something parseable as HTML or text.
pub fn is_textual_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime.starts_with("text/") || mime.contains("html") || mime.contains("xml")
}

fn network_error(err: &reqwest::Error, timeout: u64) -> PitchlensError {
    if err.is_timeout() {
        PitchlensError::Network(format!("request timed out after {} seconds", timeout))
    } else {
        PitchlensError::Network(err.to_string())
    }
}
