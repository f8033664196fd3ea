//! Extracted page content.
//!
//! [`PageContent`] is the output of the extractor and the usual input of the
//! analyzer. It is built once and never modified.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static WORD_REGEX: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(r"\b[\w'-]+\b").ok());

/// Readable text pulled from one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageContent {
    url: String,
    title: Option<String>,
    hook_text: String,
    text: String,
}

impl PageContent {
    /// Creates page content from its parts.
    ///
    /// `hook_text` is the opening headline and first paragraph; it may be empty.
    pub fn new(url: impl Into<String>, title: Option<String>, hook_text: String, text: String) -> Self {
        Self { url: url.into(), title, hook_text, text }
    }

    /// Source URL (after redirects when the page was fetched).
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Document title, if the page declared one.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// First headline followed by the first paragraph.
    pub fn hook_text(&self) -> &str {
        &self.hook_text
    }

    /// Cleaned visible text, one block per line.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Consumes the page and returns its text.
    pub fn into_text(self) -> String {
        self.text
    }

    /// Whether the page yielded no visible text at all.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Length of the text in characters.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Word count of the text.
    pub fn word_count(&self) -> usize {
        count_words(&self.text)
    }
}

/// Count words in text using a simple regex pattern
fn count_words(text: &str) -> usize {
    match WORD_REGEX.as_ref() {
        Some(re) => re.find_iter(text).count(),
        None => text.split_whitespace().count(),
    }
}
