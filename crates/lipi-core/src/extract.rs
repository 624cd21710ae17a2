//! Visible-text extraction

use crate::filter::{TagSet, Visibility};
use ego_tree::NodeId;
use scraper::{Html, Node, Selector};
use tracing::debug;

/// Filters applied during extraction
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Which fragments count as content
    pub visibility: Visibility,
    /// Elements removed, with their subtrees, before any text is read
    pub removed: TagSet,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            visibility: Visibility::default(),
            removed: TagSet::non_content(),
        }
    }
}

impl ExtractOptions {
    /// Options that also keep text written in the target language's script
    pub fn for_target(lang: &str) -> Self {
        Self {
            visibility: Visibility::for_target(lang),
            ..Default::default()
        }
    }
}

/// Extract the page title from HTML
pub fn extract_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("title").ok()?;

    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|title| !title.is_empty())
}

/// Extract visible text with the default filters
pub fn extract_plain_text(html: &str) -> String {
    extract_plain_text_with(html, &ExtractOptions::default())
}

/// Extract visible text, one fragment per line.
///
/// Non-content elements and comments are detached from the tree first, then
/// the remaining text nodes are read in document order. Fragments are trimmed,
/// kept only if visible, and a fragment equal to the one right before it is
/// dropped.
pub fn extract_plain_text_with(html: &str, options: &ExtractOptions) -> String {
    let mut document = Html::parse_document(html);

    let removed = strip_non_content(&mut document, &options.removed);
    let fragments = visible_fragments(&document, &options.visibility);
    let lines = collapse_adjacent(fragments);
    debug!("Extracted {} lines ({} nodes removed)", lines.len(), removed);

    lines.join("\n").trim().to_string()
}

/// Detach comments and every element named in `removed`. Returns how many
/// subtrees were cut.
fn strip_non_content(document: &mut Html, removed: &TagSet) -> usize {
    let doomed: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|node| match node.value() {
            Node::Comment(_) => true,
            Node::Element(element) => removed.contains(element.name()),
            _ => false,
        })
        .map(|node| node.id())
        .collect();

    for id in &doomed {
        if let Some(mut node) = document.tree.get_mut(*id) {
            node.detach();
        }
    }
    doomed.len()
}

fn visible_fragments<'a>(document: &'a Html, visibility: &Visibility) -> Vec<&'a str> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| match node.value() {
            Node::Text(text) => Some(text.trim()),
            _ => None,
        })
        .filter(|fragment| !fragment.is_empty() && visibility.is_visible(fragment))
        .collect()
}

fn collapse_adjacent(fragments: Vec<&str>) -> Vec<&str> {
    let mut lines: Vec<&str> = Vec::with_capacity(fragments.len());
    for fragment in fragments {
        if lines.last() != Some(&fragment) {
            lines.push(fragment);
        }
    }
    lines
}
