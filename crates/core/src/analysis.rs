//! Marketing analysis result and its schema.
//!
//! The model is asked for JSON shaped like [`AnalysisResult`]. The provider's
//! schema enforcement is not trusted: [`parse_analysis`] checks every field
//! again before a result is handed out.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::{PitchlensError, Result};

/// Number of conversion killers the model must return.
pub const CONVERSION_KILLER_COUNT: usize = 3;

/// Highest valid hook score.
pub const MAX_HOOK_SCORE: u8 = 100;

static CODE_FENCE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*\n?(.*?)\n?\s*```\s*$").ok());

/// A validated marketing assessment of one page.
///
/// Every constructor, including deserialization, runs the same checks as
/// [`parse_analysis`], so a value of this type always holds a score in
/// `0..=100`, a non-blank persona and three non-blank phrases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawAnalysis")]
pub struct AnalysisResult {
    hook_score: u8,
    audience_persona: String,
    conversion_killers: [String; CONVERSION_KILLER_COUNT],
}

impl AnalysisResult {
    /// Builds a result from its parts, trimming and validating them.
    pub fn new(
        hook_score: u8,
        audience_persona: impl Into<String>,
        conversion_killers: [String; CONVERSION_KILLER_COUNT],
    ) -> Result<Self> {
        validate(RawAnalysis {
            hook_score: hook_score.into(),
            audience_persona: audience_persona.into(),
            conversion_killers: conversion_killers.into(),
        })
    }

    /// How compelling the opening headline and paragraph are, 0 to 100.
    pub fn hook_score(&self) -> u8 {
        self.hook_score
    }

    /// One sentence describing who the page speaks to.
    pub fn audience_persona(&self) -> &str {
        &self.audience_persona
    }

    /// Phrases likely to cost conversions.
    pub fn conversion_killers(&self) -> &[String; CONVERSION_KILLER_COUNT] {
        &self.conversion_killers
    }

    /// Rating band for the hook score.
    pub fn hook_rating(&self) -> HookRating {
        HookRating::from_score(self.hook_score)
    }
}

impl TryFrom<RawAnalysis> for AnalysisResult {
    type Error = PitchlensError;

    fn try_from(raw: RawAnalysis) -> Result<Self> {
        validate(raw)
    }
}

/// Coarse reading of a hook score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HookRating {
    /// Below 50.
    Weak,
    /// 50 to 79.
    Decent,
    /// 80 and above.
    Strong,
}

impl HookRating {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..50 => HookRating::Weak,
            50..80 => HookRating::Decent,
            _ => HookRating::Strong,
        }
    }

    /// Short advice matching the band.
    pub fn advice(self) -> &'static str {
        match self {
            HookRating::Weak => "The opening hook needs significant work to grab visitor attention quickly.",
            HookRating::Decent => "The hook is decent but could be punchier or clearer.",
            HookRating::Strong => "Excellent hook! The opening is highly compelling.",
        }
    }
}

impl fmt::Display for HookRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookRating::Weak => write!(f, "weak"),
            HookRating::Decent => write!(f, "decent"),
            HookRating::Strong => write!(f, "strong"),
        }
    }
}

/// The wire shape before validation.
#[derive(Debug, Deserialize)]
struct RawAnalysis {
    hook_score: serde_json::Number,
    audience_persona: String,
    conversion_killers: Vec<String>,
}

/// Response schema in the OpenAPI subset accepted by Gemini's
/// `generationConfig.responseSchema`.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "hook_score": {
                "type": "INTEGER",
                "description": "How compelling the opening headline and first paragraph are, from 0 (ignorable) to 100 (irresistible).",
                "minimum": 0,
                "maximum": MAX_HOOK_SCORE
            },
            "audience_persona": {
                "type": "STRING",
                "description": "One concise sentence naming the specific audience the page is written for, e.g. 'Enterprise CTOs evaluating cloud migration'."
            },
            "conversion_killers": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "minItems": CONVERSION_KILLER_COUNT,
                "maxItems": CONVERSION_KILLER_COUNT,
                "description": "Exactly 3 confusing, jargon-heavy or vague phrases taken from the page."
            }
        },
        "required": ["hook_score", "audience_persona", "conversion_killers"],
        "propertyOrdering": ["hook_score", "audience_persona", "conversion_killers"]
    })
}

/// Parse and validate a model response.
///
/// Accepts bare JSON or JSON inside a Markdown code fence. Every violation is
/// a [`PitchlensError::SchemaValidation`]; nothing is defaulted or truncated.
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let body = strip_code_fence(raw);

    let parsed: RawAnalysis = serde_json::from_str(body)
        .map_err(|e| PitchlensError::SchemaValidation(format!("response is not a valid analysis object: {}", e)))?;

    validate(parsed)
}

fn validate(raw: RawAnalysis) -> Result<AnalysisResult> {
    let hook_score = integral_score(&raw.hook_score).ok_or_else(|| {
        PitchlensError::SchemaValidation(format!(
            "hook_score must be an integer in 0..={}, got {}",
            MAX_HOOK_SCORE, raw.hook_score
        ))
    })?;

    let audience_persona = raw.audience_persona.trim().to_string();
    if audience_persona.is_empty() {
        return Err(PitchlensError::SchemaValidation("audience_persona is empty".to_string()));
    }

    let count = raw.conversion_killers.len();
    let killers: Vec<String> = raw
        .conversion_killers
        .into_iter()
        .map(|k| k.trim().to_string())
        .collect();

    if let Some(idx) = killers.iter().position(|k| k.is_empty()) {
        return Err(PitchlensError::SchemaValidation(format!("conversion_killers[{}] is empty", idx)));
    }

    let conversion_killers: [String; CONVERSION_KILLER_COUNT] = killers.try_into().map_err(|_| {
        PitchlensError::SchemaValidation(format!(
            "conversion_killers must have exactly {} entries, got {}",
            CONVERSION_KILLER_COUNT, count
        ))
    })?;

    Ok(AnalysisResult { hook_score, audience_persona, conversion_killers })
}

fn integral_score(n: &serde_json::Number) -> Option<u8> {
    let value = match n.as_i64() {
        Some(i) => i,
        None => {
            let f = n.as_f64()?;
            if f.fract() != 0.0 {
                return None;
            }
            f as i64
        }
    };

    u8::try_from(value).ok().filter(|s| *s <= MAX_HOOK_SCORE)
}

fn strip_code_fence(raw: &str) -> &str {
    CODE_FENCE
        .as_ref()
        .and_then(|re| re.captures(raw))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw)
        .trim()
}
