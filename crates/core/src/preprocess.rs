//! Boilerplate removal.
//!
//! A streaming lol_html pass that drops executable and embedded content,
//! navigation and landmark chrome, and forms. The built-in selectors only
//! match tags whose end tag cannot be omitted. Hidden elements can be `<p>`
//! or `<li>` with no end tag, so they are skipped by the tree walk in
//! [`crate::text`] instead.

use std::str::FromStr;

use lol_html::{HtmlRewriter, Selector, Settings};

use crate::{PitchlensError, Result};

/// Non-visible or embedded content. Always removed.
const NON_CONTENT_SELECTORS: [&str; 11] = [
    "script", "style", "noscript", "template", "iframe", "svg", "canvas", "object", "embed", "meta", "link",
];

/// Structural chrome around the copy.
const LANDMARK_SELECTORS: [&str; 8] = [
    "nav",
    "header",
    "footer",
    "aside",
    "form",
    "[role=\"navigation\"]",
    "[role=\"banner\"]",
    "[role=\"contentinfo\"]",
];

/// Configuration for boilerplate removal
#[derive(Debug, Clone)]
pub struct PreprocessConfig {
    /// Whether to remove nav/header/footer/aside/form and their ARIA equivalents
    pub remove_landmarks: bool,
    /// Extra CSS selectors to remove (e.g. cookie banners)
    pub extra_selectors: Vec<String>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self { remove_landmarks: true, extra_selectors: Vec::new() }
    }
}

/// Strip boilerplate elements from an HTML document.
///
/// Comments are dropped along with the elements. Returns
/// [`PitchlensError::HtmlParse`] if an extra selector is invalid or the
/// rewriter fails.
pub fn clean_html(html: &str, config: &PreprocessConfig) -> Result<String> {
    let mut selectors: Vec<&str> = NON_CONTENT_SELECTORS.to_vec();

    if config.remove_landmarks {
        selectors.extend(LANDMARK_SELECTORS);
    }

    selectors.extend(config.extra_selectors.iter().map(String::as_str));

    for selector in &selectors {
        parse_selector(selector)?;
    }

    let handlers: Vec<_> = selectors
        .iter()
        .map(|selector| {
            lol_html::element!(*selector, |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    let mut output = String::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            document_content_handlers: vec![lol_html::doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    rewriter
        .write(html.as_bytes())
        .map_err(|e| PitchlensError::HtmlParse(e.to_string()))?;
    rewriter.end().map_err(|e| PitchlensError::HtmlParse(e.to_string()))?;

    Ok(output)
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::from_str(selector)
        .map_err(|e| PitchlensError::HtmlParse(format!("Invalid selector '{}': {}", selector, e)))
}
