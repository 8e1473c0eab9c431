//! HTML extraction of links and visible text
//!
//! This module turns a fetched body into:
//! - The absolute web links found in `<a href>` attributes, in document order
//! - The page's sanitized visible-text fragments, in document order
//!
//! Both walks are depth-first over the parsed document tree, using an explicit
//! stack; children are pushed in reverse so they pop in document order.

use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use scraper::{Html, Node};

/// Elements whose text content is never visible
const HIDDEN_ELEMENTS: [&str; 2] = ["script", "style"];

/// How much of the body is inspected when rejecting binary content
const SNIFF_LEN: usize = 1024;

/// Links and text extracted from one page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedPage {
    /// Absolute web links, duplicates preserved
    pub links: Vec<String>,

    /// Sanitized visible-text fragments
    pub keywords: Vec<String>,
}

/// Parses a response body into a document tree
///
/// The body is decoded as UTF-8, replacing invalid sequences; text fragments
/// that end up containing a replacement character are later dropped by
/// [`collect_text`].
///
/// Scripting is disabled in the tree builder, so `<noscript>` content is
/// parsed as ordinary markup and its text is kept.
///
/// # Returns
///
/// * `Ok(Html)` - The parsed document
/// * `Err(String)` - The body is not a text document
pub fn parse_document(body: &[u8]) -> Result<Html, String> {
    let sniff = &body[..body.len().min(SNIFF_LEN)];
    if sniff.contains(&0) {
        return Err("body is not a text document (NUL byte found)".to_string());
    }

    let text = String::from_utf8_lossy(body);
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    Ok(html5ever::parse_document(Html::new_document(), opts).one(&*text))
}

/// Parses a body and extracts both links and text
///
/// # Example
///
/// ```
/// use kwcrawl::crawler::extract_page;
///
/// let body = br#"<html><body><a href="http://x.com">Go</a></body></html>"#;
/// let page = extract_page(body).unwrap();
/// assert_eq!(page.links, vec!["http://x.com"]);
/// assert_eq!(page.keywords, vec!["Go"]);
/// ```
pub fn extract_page(body: &[u8]) -> Result<ExtractedPage, String> {
    let document = parse_document(body)?;
    Ok(ExtractedPage {
        links: collect_links(&document),
        keywords: collect_text(&document),
    })
}

/// Collects the `href` of every anchor that points at an absolute web address
///
/// Relative paths, fragments, `mailto:` and other schemes are ignored. Values
/// are returned verbatim; no normalization is applied.
pub fn collect_links(document: &Html) -> Vec<String> {
    let mut links = Vec::new();
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        if let Node::Element(element) = node.value() {
            if element.name() == "a" {
                if let Some(href) = element.attr("href") {
                    if is_absolute_web_link(href) {
                        links.push(href.to_string());
                    }
                }
            }
        }

        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
    }

    links
}

/// Collects sanitized visible-text fragments
///
/// Text under `script` and `style` is skipped. Each fragment is
/// trimmed, dropped if empty or badly encoded, and has its quotes and
/// non-breaking spaces turned into plain spaces.
pub fn collect_text(document: &Html) -> Vec<String> {
    let mut text = Vec::new();
    let mut stack = vec![document.tree.root()];

    while let Some(node) = stack.pop() {
        match node.value() {
            Node::Element(element) if HIDDEN_ELEMENTS.contains(&element.name()) => continue,
            Node::Text(fragment) => {
                if let Some(clean) = sanitize_fragment(fragment) {
                    text.push(clean);
                }
            }
            _ => {}
        }

        let children: Vec<_> = node.children().collect();
        stack.extend(children.into_iter().rev());
    }

    text
}

/// Returns true for hrefs starting with `http://` or `https://`
fn is_absolute_web_link(href: &str) -> bool {
    let href = href.trim_start();
    ["http://", "https://"].iter().any(|scheme| {
        href.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// Cleans one text node; `None` means the fragment is dropped
pub fn sanitize_fragment(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains(char::REPLACEMENT_CHARACTER) {
        return None;
    }

    let normalized = normalize_spaces(trimmed);
    let normalized = normalized.trim();
    if normalized.is_empty() {
        return None;
    }

    Some(normalized.to_string())
}

/// Replaces each space, non-breaking space, and double quote with a space
///
/// Applied character by character; runs are not collapsed. The transform is
/// idempotent.
pub fn normalize_spaces(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            ' ' | '\u{00A0}' | '"' => ' ',
            other => other,
        })
        .collect()
}
