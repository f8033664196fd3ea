//! Visible-text extraction over parsed HTML.

use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

const BLOCK_ELEMENTS: [&str; 30] = [
    "address",
    "article",
    "blockquote",
    "dd",
    "details",
    "div",
    "dl",
    "dt",
    "figcaption",
    "figure",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "li",
    "main",
    "ol",
    "p",
    "pre",
    "section",
    "summary",
    "table",
    "td",
    "th",
    "tr",
    "ul",
    "br",
];

/// Elements whose text is never visible copy.
const SKIPPED_ELEMENTS: [&str; 5] = ["script", "style", "noscript", "template", "head"];

static HIDDEN_STYLE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)(display\s*:\s*none|visibility\s*:\s*hidden)").ok());

/// Extract visible text from an HTML document.
///
/// Walks `<body>` (or the whole document when there is none), breaks lines at
/// block elements, collapses whitespace runs to single spaces and drops blank
/// lines. Script and style text is never emitted, nor is anything under an
/// element marked `hidden`, `aria-hidden="true"` or hidden by inline style.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let root = body_or_root(&document);

    let mut raw = String::new();
    collect_text(root, &mut raw);
    normalize_lines(&raw)
}

/// Extract the opening hook: the first `<h1>` followed by the first `<p>`.
///
/// Hidden headlines and paragraphs are passed over. Either part may be
/// missing; the result is empty when both are.
pub fn extract_hook(html: &str) -> String {
    let document = Html::parse_document(html);

    let first_text = |selector: &str| -> String {
        Selector::parse(selector)
            .ok()
            .and_then(|sel| document.select(&sel).find(|el| is_visible(*el)).map(element_text))
            .unwrap_or_default()
    };

    let parts = [first_text("h1"), first_text("p")];
    parts
        .iter()
        .filter(|p| !p.is_empty())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the document `<title>`, if present and non-blank.
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;
    document
        .select(&selector)
        .next()
        .map(element_text)
        .filter(|t| !t.is_empty())
}

fn body_or_root(document: &Html) -> ElementRef<'_> {
    Selector::parse("body")
        .ok()
        .and_then(|sel| document.select(&sel).next())
        .unwrap_or_else(|| document.root_element())
}

fn element_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(element, &mut raw);
    collapse_whitespace(&raw)
}

fn collect_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child_element) = ElementRef::wrap(child) {
            let name = child_element.value().name();
            if SKIPPED_ELEMENTS.contains(&name) || is_hidden(child_element) {
                continue;
            }

            let is_block = BLOCK_ELEMENTS.contains(&name);
            if is_block {
                out.push('\n');
            }
            collect_text(child_element, out);
            if is_block {
                out.push('\n');
            }
        }
    }
}

fn is_hidden(element: ElementRef<'_>) -> bool {
    let el = element.value();

    el.attr("hidden").is_some()
        || el
            .attr("aria-hidden")
            .is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
        || el
            .attr("style")
            .is_some_and(|style| HIDDEN_STYLE.as_ref().is_some_and(|re| re.is_match(style)))
}

fn is_visible(element: ElementRef<'_>) -> bool {
    !is_hidden(element) && !element.ancestors().filter_map(ElementRef::wrap).any(is_hidden)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
