//! Absolute-URL rewriting for resource and link attributes

use crate::translate::Diagnostic;
use ego_tree::NodeId;
use html5ever::tendril::StrTendril;
use scraper::{Html, Node};
use tracing::{debug, warn};
use url::Url;

/// Attributes holding a URL that must keep working once the page is served
/// from somewhere else
pub const URL_ATTRIBUTES: &[&str] = &["href", "src", "action", "data-src", "poster"];

/// Resolve every URL attribute in the document against `base` in place.
///
/// Returns how many attribute values were rewritten. A value that cannot be
/// resolved is left untouched and reported as a diagnostic.
pub fn absolutize_attributes(
    document: &mut Html,
    base: &Url,
    diagnostics: &mut Vec<Diagnostic>,
) -> usize {
    let elements: Vec<NodeId> = document
        .tree
        .root()
        .descendants()
        .filter(|node| node.value().is_element())
        .map(|node| node.id())
        .collect();

    let mut rewritten = 0;
    for id in elements {
        let Some(mut node) = document.tree.get_mut(id) else {
            continue;
        };
        let Node::Element(element) = node.value() else {
            continue;
        };

        for (name, value) in element.attrs.iter_mut() {
            let attribute: &str = &name.local;
            if !URL_ATTRIBUTES.contains(&attribute) {
                continue;
            }
            match base.join(value.trim()) {
                Ok(resolved) => {
                    if resolved.as_str() != &**value {
                        *value = StrTendril::from_slice(resolved.as_str());
                        rewritten += 1;
                    }
                }
                Err(e) => {
                    warn!("Leaving {}=\"{}\" unresolved: {}", attribute, &**value, e);
                    diagnostics.push(Diagnostic::AttributeUnresolved {
                        attribute: attribute.to_string(),
                        value: value.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }
    }

    debug!("Rewrote {} URL attributes against {}", rewritten, base);
    rewritten
}
