//! Messaging analysis API.
//!
//! [`Analyzer`] sends page copy to a generative model through a
//! [`ModelTransport`], retries transient failures with backoff, and returns a
//! validated [`AnalysisResult`].
//!
//! # Example
//!
//! ```rust,no_run
//! use pitchlens_core::{Analyzer, Extractor, GeminiTransport};
//!
//! # async fn example() -> pitchlens_core::Result<()> {
//! let page = Extractor::new().extract("https://example.com").await?;
//! let analyzer = Analyzer::new(GeminiTransport::new("api-key")?);
//! let result = analyzer.analyze_page(&page).await?;
//! println!("Hook score: {}", result.hook_score());
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::analysis::{AnalysisResult, parse_analysis, response_schema};
use crate::page::PageContent;
use crate::retry::{RetryPolicy, Sleeper, TokioSleeper, retry_with_backoff};
use crate::{PitchlensError, Result, ServiceError};

/// Default model name.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Instruction that frames every analysis request.
pub const SYSTEM_INSTRUCTION: &str = "\
You are a senior marketing messaging analyst.
Assess the website copy you are given and answer only with the requested JSON object.
Base every judgement strictly on the supplied text.
hook_score is an integer from 0 to 100 rating how compelling the opening headline and first paragraph are.
audience_persona is a single concise sentence naming the specific audience the copy targets.
conversion_killers is a list of exactly 3 confusing, jargon-heavy or vague phrases from the copy.";

/// One request to the model.
///
/// Built per call from the analyzer's configuration and the input text.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisRequest {
    /// Model identifier, e.g. `gemini-2.5-flash`.
    pub model: String,
    /// System-level instruction.
    pub system_instruction: String,
    /// User prompt carrying the page copy.
    pub prompt: String,
    /// Schema the response must follow.
    pub response_schema: Value,
}

/// Carries an [`AnalysisRequest`] to a model and returns its raw text answer.
///
/// Implementations classify failures into [`ServiceError`] so the analyzer
/// can tell transient from permanent ones. They do not retry.
#[async_trait]
pub trait ModelTransport: Send + Sync {
    async fn generate(&self, request: &AnalysisRequest) -> std::result::Result<String, ServiceError>;
}

#[async_trait]
impl<T: ModelTransport + ?Sized> ModelTransport for Arc<T> {
    async fn generate(&self, request: &AnalysisRequest) -> std::result::Result<String, ServiceError> {
        (**self).generate(request).await
    }
}

/// Configuration for the analyzer.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Model to ask (default: [`DEFAULT_MODEL`]).
    pub model: String,
    /// Backoff applied to transient failures.
    pub retry: RetryPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self { model: DEFAULT_MODEL.to_string(), retry: RetryPolicy::default() }
    }
}

impl AnalyzerConfig {
    /// Creates a new builder for AnalyzerConfig.
    ///
    /// # Example
    ///
    /// ```rust
    /// use pitchlens_core::AnalyzerConfig;
    /// use std::time::Duration;
    ///
    /// let config = AnalyzerConfig::builder()
    ///     .max_attempts(3)
    ///     .initial_delay(Duration::from_millis(500))
    ///     .build();
    /// assert_eq!(config.retry.max_attempts, 3);
    /// ```
    pub fn builder() -> AnalyzerConfigBuilder {
        AnalyzerConfigBuilder::new()
    }
}

/// Builder for AnalyzerConfig.
pub struct AnalyzerConfigBuilder {
    config: AnalyzerConfig,
}

impl AnalyzerConfigBuilder {
    /// Creates a new builder with default values.
    pub fn new() -> Self {
        Self { config: AnalyzerConfig::default() }
    }

    /// Sets the model name.
    pub fn model(mut self, value: impl Into<String>) -> Self {
        self.config.model = value.into();
        self
    }

    /// Sets the total number of attempts.
    pub fn max_attempts(mut self, value: u32) -> Self {
        self.config.retry.max_attempts = value;
        self
    }

    /// Sets the delay after the first failure.
    pub fn initial_delay(mut self, value: Duration) -> Self {
        self.config.retry.initial_delay = value;
        self
    }

    /// Sets the backoff multiplier.
    pub fn multiplier(mut self, value: f64) -> Self {
        self.config.retry.multiplier = value;
        self
    }

    /// Sets the cap on a single wait.
    pub fn max_delay(mut self, value: Duration) -> Self {
        self.config.retry.max_delay = value;
        self
    }

    /// Sets the jitter fraction.
    pub fn jitter(mut self, value: f64) -> Self {
        self.config.retry.jitter = value;
        self
    }

    /// Replaces the whole retry policy.
    pub fn retry(mut self, value: RetryPolicy) -> Self {
        self.config.retry = value;
        self
    }

    /// Builds the config.
    pub fn build(self) -> AnalyzerConfig {
        self.config
    }
}

impl Default for AnalyzerConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scores marketing copy with a generative model.
///
/// Stateless between calls; share it behind an `Arc` to analyze concurrently.
pub struct Analyzer {
    transport: Box<dyn ModelTransport>,
    sleeper: Box<dyn Sleeper>,
    config: AnalyzerConfig,
}

impl Analyzer {
    /// Creates an analyzer with default settings.
    pub fn new(transport: impl ModelTransport + 'static) -> Self {
        Self::with_config(transport, AnalyzerConfig::default())
    }

    /// Creates an analyzer with a custom configuration.
    pub fn with_config(transport: impl ModelTransport + 'static, config: AnalyzerConfig) -> Self {
        Self { transport: Box::new(transport), sleeper: Box::new(TokioSleeper), config }
    }

    /// Replaces how the analyzer waits between attempts.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Box::new(sleeper);
        self
    }

    /// Configuration in use.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes a block of copy.
    ///
    /// The same text serves as both the hook and the full page.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for blank text (no request is made), `Auth`,
    /// `MalformedRequest` or `SchemaValidation` straight from the first attempt
    /// that hits them, `ServiceUnavailable` once transient failures use up every
    /// attempt.
    pub async fn analyze(&self, text: &str) -> Result<AnalysisResult> {
        self.analyze_with_hook("", text).await
    }

    /// Analyzes an extracted page, scoring its hook text separately.
    pub async fn analyze_page(&self, page: &PageContent) -> Result<AnalysisResult> {
        self.analyze_with_hook(page.hook_text(), page.text()).await
    }

    /// Analyzes `full_text`, scoring `hook_text` as the opening.
    ///
    /// A blank hook falls back to the full text.
    pub async fn analyze_with_hook(&self, hook_text: &str, full_text: &str) -> Result<AnalysisResult> {
        let full_text = full_text.trim();
        if full_text.is_empty() {
            return Err(PitchlensError::InvalidInput("text to analyze is empty".to_string()));
        }

        let hook_text = match hook_text.trim() {
            "" => full_text,
            hook => hook,
        };

        let request = self.build_request(hook_text, full_text);

        tracing::info!(
            model = %request.model,
            chars = full_text.chars().count(),
            "Requesting messaging analysis"
        );

        let raw = retry_with_backoff(&self.config.retry, self.sleeper.as_ref(), |attempt| {
            tracing::debug!(attempt, "Calling model");
            self.transport.generate(&request)
        })
        .await?;

        let result = parse_analysis(&raw).inspect_err(|e| {
            tracing::warn!(error = %e, "Model response failed validation");
        })?;

        tracing::info!(hook_score = result.hook_score(), "Analysis complete");

        Ok(result)
    }

    fn build_request(&self, hook_text: &str, full_text: &str) -> AnalysisRequest {
        AnalysisRequest {
            model: self.config.model.clone(),
            system_instruction: SYSTEM_INSTRUCTION.to_string(),
            prompt: build_prompt(hook_text, full_text),
            response_schema: response_schema(),
        }
    }
}

/// User prompt with the hook and the full copy in separate sections.
pub fn build_prompt(hook_text: &str, full_text: &str) -> String {
    format!(
        "Analyze the following website content.\n\n\
         1. HOOK CONTENT (use for hook_score only):\n---\n{}\n---\n\n\
         2. FULL PAGE CONTENT (use for audience_persona and conversion_killers):\n---\n{}\n---\n",
        hook_text, full_text
    )
}
