//! Report rendering for analysis results.

use anyhow::Context;
use pitchlens_core::{AnalysisResult, PageContent};

/// Plain-text report: hook score with advice, persona, numbered killers.
pub fn render_text(page: &PageContent, result: &AnalysisResult) -> String {
    let rating = result.hook_rating();
    let mut out = format!("Messaging analysis: {}\n", page.url());

    if let Some(title) = page.title() {
        out.push_str(&format!("Title: {}\n", title));
    }
    out.push('\n');

    out.push_str(&format!("Hook score: {}/100 ({})\n", result.hook_score(), rating));
    out.push_str(&format!("  {}\n\n", rating.advice()));

    out.push_str("Audience persona:\n");
    out.push_str(&format!("  {}\n\n", result.audience_persona()));

    out.push_str("Conversion killers:\n");
    for (i, phrase) in result.conversion_killers().iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, phrase));
    }

    out
}

/// `{ "source": ..., "analysis": ... }` as pretty JSON.
pub fn render_json(page: &PageContent, result: &AnalysisResult) -> anyhow::Result<String> {
    let value = serde_json::json!({
        "source": page.url(),
        "analysis": result,
    });
    let mut json = serde_json::to_string_pretty(&value).context("Failed to serialize analysis")?;
    json.push('\n');
    Ok(json)
}

/// Extracted page as pretty JSON.
pub fn render_page_json(page: &PageContent) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(page).context("Failed to serialize page")?;
    json.push('\n');
    Ok(json)
}
