//! Lyrics body extraction
//!
//! Lyrics live in a known container as bare text nodes separated by `<br>`,
//! preceded by heading markup (title, artist line). Two patterns are tried in
//! order, then the candidate is cleaned and length-gated. A page where
//! neither pattern yields enough text is "no lyrics", not an error.

use crate::error::Result;
use ego_tree::NodeRef;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::debug;

/// Minimum cleaned length for a candidate to count as lyrics.
const MIN_LYRICS_CHARS: usize = 10;

/// Containers probed for the lyrics body, in order.
const LYRICS_CONTAINERS: [&str; 2] = ["div.lyric-content", "#lyrics"];

/// Extract the lyrics text from a song page.
///
/// Two patterns over the container's direct children, in order:
///
/// 1. Exactly one non-`<br>` element (the heading) plus at least one `<br>`:
///    take everything after the heading.
/// 2. Otherwise scan backward for the last element that still carries text
///    (skipping `<br>` and empty elements) and take everything after it; with
///    no such element the whole container is the candidate.
///
/// Text nodes concatenate as-is and `<br>` maps to a newline. The result is
/// cleaned (whitespace runs collapsed, blank lines limited to one, edges
/// trimmed) and accepted only at [`MIN_LYRICS_CHARS`] characters or more.
pub fn extract_lyrics(html: &str) -> Result<Option<String>> {
    let doc = Html::parse_document(html);

    let Some(container) = find_container(&doc)? else {
        return Ok(None);
    };
    let children: Vec<NodeRef<'_, Node>> = container.children().collect();

    let raw =
        after_single_heading(&children).unwrap_or_else(|| after_last_substantial(&children));

    let cleaned = clean(&raw);
    if cleaned.chars().count() < MIN_LYRICS_CHARS {
        debug!(chars = cleaned.chars().count(), "Lyrics candidate too short");
        return Ok(None);
    }

    Ok(Some(cleaned))
}

fn find_container<'a>(doc: &'a Html) -> Result<Option<ElementRef<'a>>> {
    for css in LYRICS_CONTAINERS {
        let selector = Selector::parse(css)?;
        if let Some(container) = doc.select(&selector).next() {
            return Ok(Some(container));
        }
    }
    Ok(None)
}

/// Pattern 1: a single heading element followed by `<br>`-separated text.
fn after_single_heading(children: &[NodeRef<'_, Node>]) -> Option<String> {
    let mut elements = children
        .iter()
        .enumerate()
        .filter(|(_, node)| is_non_br_element(node));

    let (heading, _) = elements.next()?;
    if elements.next().is_some() {
        return None;
    }

    let breaks = children.iter().filter(|node| is_br(node)).count();
    if breaks == 0 {
        return None;
    }

    Some(concat_nodes(&children[heading + 1..]))
}

/// Pattern 2: everything after the last element that still carries text.
fn after_last_substantial(children: &[NodeRef<'_, Node>]) -> String {
    match children.iter().rposition(|node| is_substantial(node)) {
        Some(boundary) => concat_nodes(&children[boundary + 1..]),
        None => concat_nodes(children),
    }
}

fn is_br(node: &NodeRef<'_, Node>) -> bool {
    matches!(node.value(), Node::Element(el) if el.name() == "br")
}

fn is_non_br_element(node: &NodeRef<'_, Node>) -> bool {
    matches!(node.value(), Node::Element(el) if el.name() != "br")
}

/// A non-`<br>` element with any non-whitespace descendant text.
fn is_substantial(node: &NodeRef<'_, Node>) -> bool {
    if !is_non_br_element(node) {
        return false;
    }
    let mut text = String::new();
    append_node_text(node, &mut text);
    !text.trim().is_empty()
}

fn concat_nodes(nodes: &[NodeRef<'_, Node>]) -> String {
    let mut out = String::new();
    for node in nodes {
        append_node_text(node, &mut out);
    }
    out
}

fn append_node_text(node: &NodeRef<'_, Node>, out: &mut String) {
    match node.value() {
        Node::Text(text) => out.push_str(text),
        Node::Element(el) if el.name() == "br" => out.push('\n'),
        Node::Element(_) => {
            for child in node.children() {
                append_node_text(&child, out);
            }
        }
        _ => {}
    }
}

/// Normalize a raw candidate: per-line horizontal whitespace collapses to
/// single spaces, blank-only lines reduce to at most one separator line, the
/// whole text is edge-trimmed.
fn clean(raw: &str) -> String {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut out = String::with_capacity(unified.len());
    let mut blank_run = 0usize;
    for line in unified.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.trim().to_string()
}
