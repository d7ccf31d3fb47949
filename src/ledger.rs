//! Mutation ledger: applies annotation markup and undoes it.
//!
//! The first time an element is touched its inner HTML and text are
//! snapshotted. Later applications never overwrite that snapshot, so
//! restoring always returns to the page as it was before the session.

use std::collections::HashMap;

use log::{debug, warn};

use crate::dom::{Document, MarkupError, NodeId};
use crate::render::annotate::{ANNOTATION_CLASS, MORE_CLASS, ORIGINAL_ATTR};

/// Marker attribute on elements that carry annotations
pub const STATE_ATTR: &str = "data-po-state";
const STATE_ANNOTATED: &str = "annotated";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub original_html: String,
    pub original_text: String,
}

#[derive(Debug, Default)]
pub struct Ledger {
    snapshots: HashMap<NodeId, Snapshot>,
    /// Tracked elements in first-application order
    tracked: Vec<NodeId>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracked(&self, id: NodeId) -> bool {
        self.snapshots.contains_key(&id)
    }

    pub fn snapshot(&self, id: NodeId) -> Option<&Snapshot> {
        self.snapshots.get(&id)
    }

    pub fn tracked(&self) -> &[NodeId] {
        &self.tracked
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Replace the content of `id` with `markup`.
    ///
    /// On a markup error the element is left as it was, but it is still
    /// snapshotted so a later plain-text fallback can be undone.
    pub fn apply(&mut self, doc: &mut Document, id: NodeId, markup: &str) -> Result<(), MarkupError> {
        self.track(doc, id);
        doc.set_inner_html(id, markup)?;
        doc.set_attr(id, STATE_ATTR, STATE_ANNOTATED);
        Ok(())
    }

    /// Replace the content of `id` with plain text.
    pub fn apply_plain(&mut self, doc: &mut Document, id: NodeId, text: &str) {
        self.track(doc, id);
        doc.set_text(id, text);
        doc.set_attr(id, STATE_ATTR, STATE_ANNOTATED);
    }

    fn track(&mut self, doc: &Document, id: NodeId) {
        let tracked = &mut self.tracked;
        self.snapshots.entry(id).or_insert_with(|| {
            tracked.push(id);
            Snapshot {
                original_html: doc.inner_html(id),
                original_text: doc.text_content(id),
            }
        });
    }

    /// Undo every tracked mutation and sweep stray annotation markup.
    ///
    /// Elements removed from the page since they were annotated are skipped.
    /// Calling this again with nothing tracked changes nothing.
    pub fn restore_all(&mut self, doc: &mut Document) {
        let mut restored = 0usize;
        for id in std::mem::take(&mut self.tracked) {
            let Some(snapshot) = self.snapshots.remove(&id) else {
                continue;
            };
            if !doc.is_attached(id) {
                debug!("skipping restore of detached element #{}", id.index());
                continue;
            }
            if let Err(e) = doc.set_inner_html(id, &snapshot.original_html) {
                warn!("restoring element #{} as plain text: {e}", id.index());
                doc.set_text(id, &snapshot.original_text);
            }
            doc.remove_attr(id, STATE_ATTR);
            restored += 1;
        }
        self.snapshots.clear();

        let strays = sweep_strays(doc);
        if restored > 0 || strays > 0 {
            debug!("restored {restored} elements, removed {strays} stray annotations");
        }
    }
}

/// Turn annotation spans left outside tracked elements back into their
/// original text, and drop overflow indicators.
fn sweep_strays(doc: &mut Document) -> usize {
    let mut count = 0;
    for id in doc.elements_with_attr("class") {
        if !doc.is_attached(id) {
            continue;
        }
        let Some(parent) = doc.parent(id) else {
            continue;
        };
        if doc.has_class(id, ANNOTATION_CLASS) {
            let original = doc.attr(id, ORIGINAL_ATTR).unwrap_or("").to_string();
            doc.replace_with_text(id, &original);
            doc.normalize(parent);
            count += 1;
        } else if doc.has_class(id, MORE_CLASS) {
            doc.detach(id);
            doc.normalize(parent);
            count += 1;
        }
    }
    for id in doc.elements_with_attr(STATE_ATTR) {
        doc.remove_attr(id, STATE_ATTR);
    }
    count
}
