//! Structure-preserving page translation
//!
//! The page is parsed into a `scraper` tree whose nodes live in an arena
//! addressed by [`NodeId`]. Translatable text nodes are recorded as
//! `(NodeId, original text)` pairs in document order, the texts go to the
//! backend as one batch, and the results are written back through the ids.

use super::{translate_texts, Diagnostic, Outcome, TranslateOptions, Translator};
use crate::filter::{TagSet, Visibility};
use crate::{rewrite, LipiError, Result};
use ego_tree::NodeId;
use html5ever::tendril::StrTendril;
use scraper::{Html, Node};
use tracing::{debug, info, warn};
use url::Url;

/// A translatable text node and the text it held when collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTarget {
    pub node: NodeId,
    pub original: String,
}

/// Translate the visible text of `html` in place and return the page with
/// its markup intact.
///
/// URL attributes are made absolute against `base_url` first so the result
/// still loads its assets when served elsewhere. Only a misaligned
/// substitution is fatal; everything else degrades into diagnostics.
pub async fn translate_structured(
    html: &str,
    base_url: &Url,
    translator: &dyn Translator,
    options: &TranslateOptions,
) -> Result<Outcome<String>> {
    let mut document = Html::parse_document(html);
    let mut diagnostics = Vec::new();

    rewrite::absolutize_attributes(&mut document, base_url, &mut diagnostics);

    let targets = collect_targets(&document, &options.visibility, &options.skip_parents);
    if targets.is_empty() {
        debug!("No translatable text on {}", base_url);
        return Ok(Outcome::new(document.html(), diagnostics));
    }

    info!(
        "Translating {} text nodes from {} into {} via {}",
        targets.len(),
        base_url,
        options.target,
        translator.name()
    );
    let originals: Vec<String> = targets.iter().map(|t| t.original.clone()).collect();
    let translated = translate_texts(translator, &originals, options, &mut diagnostics).await;

    let written = substitute(&mut document, &targets, translated, &mut diagnostics)?;
    debug!("Substituted {}/{} text nodes", written, targets.len());

    Ok(Outcome::new(document.html(), diagnostics))
}

/// Collect translatable text nodes in document order.
///
/// Comments are never text nodes here. A text node is skipped when its
/// direct parent is in `skip_parents`, when it is blank, or when it has no
/// visible character.
pub fn collect_targets(
    document: &Html,
    visibility: &Visibility,
    skip_parents: &TagSet,
) -> Vec<TextTarget> {
    document
        .tree
        .root()
        .descendants()
        .filter_map(|node| {
            let Node::Text(text) = node.value() else {
                return None;
            };
            let skipped = node
                .parent()
                .and_then(|parent| parent.value().as_element())
                .is_some_and(|parent| skip_parents.contains(parent.name()));
            if skipped || text.trim().is_empty() || !visibility.is_visible(text) {
                return None;
            }
            Some(TextTarget {
                node: node.id(),
                original: text.to_string(),
            })
        })
        .collect()
}

/// Write `translations` into the nodes named by `targets`, pairwise.
///
/// The two sequences must have the same length; anything else is a pipeline
/// bug and fails the whole call. A node that was detached or is no longer a
/// text node is skipped and reported. Returns how many nodes were written.
pub fn substitute(
    document: &mut Html,
    targets: &[TextTarget],
    translations: Vec<String>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<usize> {
    if targets.len() != translations.len() {
        return Err(LipiError::AlignmentMismatch {
            nodes: targets.len(),
            translations: translations.len(),
        });
    }

    let mut written = 0;
    for (index, (target, translated)) in targets.iter().zip(translations).enumerate() {
        let attached = document
            .tree
            .get(target.node)
            .is_some_and(|node| node.parent().is_some());
        let node = if attached {
            document.tree.get_mut(target.node)
        } else {
            None
        };

        match node {
            Some(mut node) => match node.value() {
                Node::Text(text) => {
                    let replacement = keep_padding(&target.original, &translated);
                    text.text = StrTendril::from(replacement);
                    written += 1;
                }
                _ => {
                    warn!("Node #{} is no longer text, skipping", index);
                    diagnostics.push(Diagnostic::SubstitutionSkipped { index });
                }
            },
            None => {
                warn!("Node #{} was detached, skipping", index);
                diagnostics.push(Diagnostic::SubstitutionSkipped { index });
            }
        }
    }
    Ok(written)
}

/// Backends trim what they return; put the original's surrounding
/// whitespace back so inline text does not run together.
fn keep_padding(original: &str, translated: &str) -> String {
    let core = translated.trim();
    if core.is_empty() {
        return translated.to_string();
    }
    let leading = &original[..original.len() - original.trim_start().len()];
    let trailing = &original[original.trim_end().len()..];
    format!("{leading}{core}{trailing}")
}
