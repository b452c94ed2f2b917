//! Link and keyword extraction from markup
//!
//! Walks the parsed document tree depth-first. Every element carrying a
//! reference attribute (`href` or `src`) yields one raw candidate link; the
//! reference is resolved against the origin URL, so relative paths inherit
//! the origin's scheme and host. The text under the element becomes keyword
//! evidence, weighted by the nearest enclosing heading: an `<h1>` anchor
//! weighs more than body text.
//!
//! Extracted text is sanitized before it is used as scoring evidence:
//! control and other non-printable characters are stripped and whitespace
//! runs collapsed. Scan artifacts in the evidence are a scoring hazard, not
//! something to preserve.

use crate::scoring::Keyword;
use chrono::{DateTime, Utc};
use scraper::{ElementRef, Html};
use url::Url;

/// A raw candidate link emitted by extraction
#[derive(Debug, Clone)]
pub struct RawLink {
    pub time_found: DateTime<Utc>,
    pub origin: Url,
    pub dest: Url,
    pub keywords: Vec<Keyword>,
}

/// Visibility weight for text in body copy
const BODY_VISIBILITY: u32 = 1;

/// Extracts every reference-carrying element from a document
///
/// `html` must already be valid UTF-8; html5ever itself is error-tolerant
/// and produces a tree for any input.
pub fn extract_links(origin: &Url, html: &str) -> Vec<RawLink> {
    let document = Html::parse_document(html);
    let now = Utc::now();

    let mut links = Vec::new();
    for node in document.tree.root().descendants() {
        let Some(element) = ElementRef::wrap(node) else {
            continue;
        };
        let Some(reference) = element
            .value()
            .attr("href")
            .or_else(|| element.value().attr("src"))
        else {
            continue;
        };
        let Some(dest) = resolve_reference(origin, reference) else {
            continue;
        };

        links.push(RawLink {
            time_found: now,
            origin: origin.clone(),
            dest,
            keywords: collect_evidence(element),
        });
    }
    links
}

/// Resolves a reference attribute against the origin URL
///
/// Relative references inherit the origin's scheme and host. Pseudo-scheme
/// references (javascript:, mailto:, tel:, data:) and fragment-only
/// references are discarded, as is anything that does not resolve to
/// http(s).
fn resolve_reference(origin: &Url, reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() || reference.starts_with('#') {
        return None;
    }
    if reference.starts_with("javascript:")
        || reference.starts_with("mailto:")
        || reference.starts_with("tel:")
        || reference.starts_with("data:")
    {
        return None;
    }

    let resolved = origin.join(reference).ok()?;
    match resolved.scheme() {
        "http" | "https" => Some(resolved),
        _ => None,
    }
}

/// Collects weighted keyword evidence for one link element
///
/// Every text node under the element contributes one keyword. The weight
/// comes from the nearest heading enclosing that text node, so an anchor
/// inside an `<h1>` scores its text at heading strength.
fn collect_evidence(element: ElementRef) -> Vec<Keyword> {
    let mut keywords = Vec::new();
    for node in element.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let cleaned = sanitize(text);
        if cleaned.is_empty() {
            continue;
        }

        let visibility = node
            .ancestors()
            .filter_map(|a| a.value().as_element())
            .find_map(|e| heading_visibility(e.name()))
            .unwrap_or(BODY_VISIBILITY);

        keywords.push(Keyword {
            text: cleaned,
            visibility,
        });
    }
    keywords
}

/// Visibility weight for heading elements; deeper headings weigh less
fn heading_visibility(tag: &str) -> Option<u32> {
    match tag {
        "h1" => Some(7),
        "h2" => Some(6),
        "h3" => Some(5),
        "h4" => Some(4),
        "h5" => Some(3),
        "h6" => Some(2),
        _ => None,
    }
}

/// Strips non-printable artifacts and collapses whitespace
fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else if c.is_control() || c == '\u{fffd}' {
            continue;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}
