//! Content extraction API.
//!
//! [`Extractor`] turns a URL into [`PageContent`]: one fetch, boilerplate
//! removal, then visible-text extraction.
//!
//! # Example
//!
//! ```rust,no_run
//! use pitchlens_core::Extractor;
//!
//! # async fn example() -> pitchlens_core::Result<()> {
//! let page = Extractor::new().extract("https://example.com").await?;
//! println!("{}", page.text());
//! # Ok(())
//! # }
//! ```

use reqwest::Client;

use crate::fetch::{FetchConfig, build_client, fetch_url};
use crate::page::PageContent;
use crate::preprocess::{PreprocessConfig, clean_html};
use crate::text::{extract_hook, extract_text, extract_title};
use crate::Result;

/// Fetches pages and extracts their readable copy.
///
/// Holds only its HTTP client and configuration, so one instance can be
/// shared across tasks.
#[derive(Debug, Clone)]
pub struct Extractor {
    client: Option<Client>,
    fetch: FetchConfig,
    preprocess: PreprocessConfig,
}

impl Extractor {
    /// Creates an extractor with default fetch and cleanup settings.
    pub fn new() -> Self {
        Self::with_config(FetchConfig::default())
    }

    /// Creates an extractor with custom fetch settings.
    pub fn with_config(fetch: FetchConfig) -> Self {
        Self { client: None, fetch, preprocess: PreprocessConfig::default() }
    }

    /// Creates an extractor around an existing HTTP client.
    ///
    /// The per-request timeout and User-Agent from `fetch` still apply.
    pub fn with_client(client: Client, fetch: FetchConfig) -> Self {
        Self { client: Some(client), fetch, preprocess: PreprocessConfig::default() }
    }

    /// Replaces the boilerplate-removal settings.
    pub fn preprocess(mut self, preprocess: PreprocessConfig) -> Self {
        self.preprocess = preprocess;
        self
    }

    /// Fetch configuration in use.
    pub fn fetch_config(&self) -> &FetchConfig {
        &self.fetch
    }

    /// Fetches `url` once and extracts its visible text.
    ///
    /// An empty text is a valid result for pages with no readable content.
    ///
    /// # Errors
    ///
    /// `InvalidUrl` before any request is made; `Network`, `Fetch` or
    /// `UnsupportedContent` from the fetch itself.
    pub async fn extract(&self, url: &str) -> Result<PageContent> {
        let page = match &self.client {
            Some(client) => fetch_url(client, url, &self.fetch).await?,
            None => {
                let client = build_client(&self.fetch)?;
                fetch_url(&client, url, &self.fetch).await?
            }
        };

        let content = self.extract_html(&page.body, page.url.as_str())?;

        tracing::info!(
            url = content.url(),
            words = content.word_count(),
            hook_chars = content.hook_text().chars().count(),
            "Extracted page content"
        );

        Ok(content)
    }

    /// Runs the cleanup and text extraction over already-fetched HTML.
    pub fn extract_html(&self, html: &str, url: &str) -> Result<PageContent> {
        let title = extract_title(html);
        let cleaned = clean_html(html, &self.preprocess)?;
        let hook_text = extract_hook(&cleaned);
        let text = extract_text(&cleaned);

        if text.is_empty() {
            tracing::warn!(url, "Page has no extractable text");
        }

        Ok(PageContent::new(url, title, hook_text, text))
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Fetches `url` and extracts its text with default settings.
pub async fn extract(url: &str) -> Result<PageContent> {
    Extractor::new().extract(url).await
}

/// Extracts text from an HTML string with default settings.
pub fn extract_from_html(html: &str, url: &str) -> Result<PageContent> {
    Extractor::new().extract_html(html, url)
}
