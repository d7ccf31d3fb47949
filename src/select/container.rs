//! Content container discovery.

use log::debug;

use crate::config::SelectorConfig;
use crate::dom::css::is_hidden;
use crate::dom::readability::best_content_node;
use crate::dom::{Document, NodeId};

/// Content containers under `root`, outermost only, in document order.
///
/// Primary selectors win; secondary selectors are tried only when no primary
/// container qualifies. With neither, the best readability-scored node is
/// used, then `<body>`, then `root` itself.
pub fn find_containers(doc: &Document, root: NodeId, config: &SelectorConfig) -> Vec<NodeId> {
    for selectors in [&config.primary_containers, &config.secondary_containers] {
        let found = query_all(doc, root, selectors, config);
        if !found.is_empty() {
            return outermost(doc, found);
        }
    }

    if let Some(best) = best_content_node(doc, root) {
        if is_valid_container(doc, best, config) {
            debug!("no container selector matched; using readability pick <{}>", doc.tag(best));
            return vec![best];
        }
    }
    let body = doc
        .descendants(root)
        .find(|&id| doc.node(id).is_element() && doc.tag(id) == "body");
    vec![body.unwrap_or(root)]
}

/// A container must be visible, large enough on screen, and carry enough text.
pub fn is_valid_container(doc: &Document, id: NodeId, config: &SelectorConfig) -> bool {
    if is_hidden(doc, id) {
        return false;
    }
    let rect = doc.bounds(id);
    if rect.width() < config.min_container_width || rect.height() < config.min_container_height {
        return false;
    }
    let chars = doc.text_content(id).trim().chars().count();
    chars >= config.min_container_chars
}

fn query_all(
    doc: &Document,
    root: NodeId,
    selectors: &[String],
    config: &SelectorConfig,
) -> Vec<NodeId> {
    let mut found = Vec::new();
    for selector in selectors {
        let matches = match doc.select(selector) {
            Ok(m) => m,
            Err(e) => {
                debug!("skipping container selector: {e}");
                continue;
            }
        };
        for id in matches {
            if doc.contains(root, id) && !found.contains(&id) && is_valid_container(doc, id, config)
            {
                found.push(id);
            }
        }
    }
    found
}

/// Drop containers nested inside another found container.
fn outermost(doc: &Document, found: Vec<NodeId>) -> Vec<NodeId> {
    let mut kept: Vec<NodeId> = found
        .iter()
        .copied()
        .filter(|&id| !found.iter().any(|&other| other != id && doc.contains(other, id)))
        .collect();
    let positions = doc.document_positions();
    kept.sort_by_key(|id| positions.get(id).copied().unwrap_or(usize::MAX));
    kept
}
