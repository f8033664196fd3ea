pub mod analysis;
pub mod analyzer;
pub mod error;
pub mod extractor;
pub mod fetch;
#[cfg(feature = "gemini")]
pub mod gemini;
pub mod page;
pub mod preprocess;
pub mod retry;
pub mod text;

pub use analysis::{AnalysisResult, HookRating, parse_analysis, response_schema};
pub use analyzer::{AnalysisRequest, Analyzer, AnalyzerConfig, AnalyzerConfigBuilder, ModelTransport};
pub use error::{PitchlensError, Result, ServiceError};
pub use extractor::{Extractor, extract, extract_from_html};
pub use fetch::{FetchConfig, FetchedPage, fetch_url};
#[cfg(feature = "gemini")]
pub use gemini::GeminiTransport;
pub use page::PageContent;
pub use preprocess::{PreprocessConfig, clean_html};
pub use retry::{RetryPolicy, RetryState, Sleeper, TokioSleeper, retry_with_backoff};
pub use text::{extract_hook, extract_text, extract_title};
