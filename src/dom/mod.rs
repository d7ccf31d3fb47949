pub mod css;
pub mod filter;
pub mod parser;
pub mod readability;
pub mod serialize;

use std::collections::{BTreeMap, HashMap};

use log::debug;

use crate::render::layout::Rect;

pub use parser::{FragmentNode, MarkupError, SelectorError};

/// Opaque handle to a node of a [`Document`].
///
/// Handles compare by identity: two elements with identical text are still
/// distinct handles. A handle stays valid after its node is detached, but
/// [`Document::is_attached`] reports `false` from then on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    /// Raw arena slot, useful for logging.
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_index(index: usize) -> Self {
        NodeId(index)
    }
}

/// DOM node classification used to tell page chrome from readable content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Main article/page content
    Content,
    /// Navigation links, menus, breadcrumbs
    Navigation,
    /// Advertisements and sponsored blocks
    Advertisement,
    /// Consent banners, popups, tracking widgets
    Tracker,
    /// Buttons, forms, toolbars
    Interactive,
    /// Footers, sidebars, share bars
    Structural,
    /// Not yet classified
    Unknown,
}

impl Classification {
    /// Whether this classification marks page chrome rather than content.
    pub fn is_chrome(self) -> bool {
        !matches!(self, Classification::Content | Classification::Unknown)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Document,
    Element,
    Text,
}

/// A single node stored in the document arena.
#[derive(Debug, Clone)]
pub struct DomNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    pub text: String,
    pub node_type: NodeType,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    bounds: Option<Rect>,
    pinned: bool,
}

impl DomNode {
    fn document() -> Self {
        Self {
            tag: "#document".into(),
            attributes: BTreeMap::new(),
            text: String::new(),
            node_type: NodeType::Document,
            parent: None,
            children: Vec::new(),
            bounds: None,
            pinned: false,
        }
    }

    fn element(tag: impl Into<String>, attributes: BTreeMap<String, String>) -> Self {
        Self {
            tag: tag.into(),
            attributes,
            text: String::new(),
            node_type: NodeType::Element,
            parent: None,
            children: Vec::new(),
            bounds: None,
            pinned: false,
        }
    }

    fn text(content: impl Into<String>) -> Self {
        Self {
            tag: String::new(),
            attributes: BTreeMap::new(),
            text: content.into(),
            node_type: NodeType::Text,
            parent: None,
            children: Vec::new(),
            bounds: None,
            pinned: false,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(|s| s.as_str())
    }

    pub fn is_element(&self) -> bool {
        self.node_type == NodeType::Element
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// Mutable page document.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. The parsed source
/// is retained so CSS selectors can be evaluated with `scraper` and mapped
/// back onto live nodes.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<DomNode>,
    root: NodeId,
    pub url: String,
    pub title: String,
    source: Option<scraper::Html>,
    source_order: Vec<NodeId>,
    /// Set by structural edits; the selector snapshot no longer covers every element.
    source_stale: bool,
    layout_done: bool,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Empty document holding only the `#document` root.
    pub fn new() -> Self {
        Self {
            nodes: vec![DomNode::document()],
            root: NodeId(0),
            url: String::new(),
            title: String::new(),
            source: None,
            source_order: Vec::new(),
            source_stale: false,
            layout_done: false,
        }
    }

    /// Parse a full HTML page.
    pub fn parse(html: &str, url: &str) -> Self {
        parser::parse_html(html, url)
    }

    pub(crate) fn attach_source(&mut self, source: scraper::Html) {
        let root = self.root;
        self.source_order = self
            .descendants(root)
            .filter(|&id| self.node(id).is_element())
            .collect();
        self.source = Some(source);
        self.source_stale = false;
    }

    /// Re-parse the selector snapshot from the live tree after structural edits.
    ///
    /// Elements created by [`Document::set_inner_html`] or a restore become
    /// visible to [`Document::select`] only once this has run. Returns whether
    /// the snapshot was replaced; when the re-parsed tree does not line up
    /// with the arena the previous snapshot is kept.
    pub fn refresh_source(&mut self) -> bool {
        if !self.source_stale || self.source.is_none() {
            return false;
        }
        self.source_stale = false;

        let source = scraper::Html::parse_document(&self.outer_html(self.root));
        let mut tags = Vec::new();
        parser::for_each_source_element(source.root_element(), &mut |el| {
            tags.push(el.value().name().to_string());
        });
        let live: Vec<NodeId> = self
            .descendants(self.root)
            .filter(|&id| self.node(id).is_element())
            .collect();
        let lines_up = tags.len() == live.len()
            && tags.iter().zip(&live).all(|(tag, &id)| *tag == self.node(id).tag);
        if !lines_up {
            debug!(
                "re-parsed page has {} elements, arena has {}; keeping the old selector snapshot",
                tags.len(),
                live.len()
            );
            return false;
        }
        self.source_order = live;
        self.source = Some(source);
        true
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &DomNode {
        &self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&DomNode> {
        self.nodes.get(id.0)
    }

    /// Total arena size, including detached nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // --- Construction ---

    pub fn create_element(&mut self, tag: &str, attributes: BTreeMap<String, String>) -> NodeId {
        self.nodes.push(DomNode::element(tag.to_ascii_lowercase(), attributes));
        NodeId(self.nodes.len() - 1)
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.nodes.push(DomNode::text(text));
        NodeId(self.nodes.len() - 1)
    }

    /// Append `child` as the last child of `parent`, detaching it first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.source_stale = true;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Materialize a parsed fragment under `parent`.
    pub fn append_fragment(&mut self, parent: NodeId, node: FragmentNode) -> NodeId {
        match node {
            FragmentNode::Text(text) => {
                let id = self.create_text(text);
                self.append_child(parent, id);
                id
            }
            FragmentNode::Element {
                tag,
                attributes,
                children,
            } => {
                let id = self.create_element(&tag, attributes);
                self.append_child(parent, id);
                for child in children {
                    self.append_fragment(id, child);
                }
                id
            }
        }
    }

    /// Remove a node from its parent. The subtree stays in the arena.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent.take() {
            self.nodes[parent.0].children.retain(|&c| c != id);
            self.source_stale = true;
        }
    }

    fn clear_children(&mut self, id: NodeId) {
        let children = std::mem::take(&mut self.nodes[id.0].children);
        self.source_stale |= !children.is_empty();
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    /// Whether the node is still reachable from the document root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        if id == self.root {
            return true;
        }
        self.ancestors(id).any(|a| a == self.root)
    }

    // --- Navigation ---

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    pub fn element_children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .filter(move |&c| self.nodes[c.0].is_element())
    }

    /// Ancestors from the parent upward, excluding the node itself.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            doc: self,
            next: self.nodes[id.0].parent,
        }
    }

    /// Pre-order traversal of the subtree, starting with the node itself.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            doc: self,
            stack: vec![id],
        }
    }

    /// True when `id` is `ancestor` or lies inside it.
    pub fn contains(&self, ancestor: NodeId, id: NodeId) -> bool {
        id == ancestor || self.ancestors(id).any(|a| a == ancestor)
    }

    /// Position of every attached node in document order.
    pub fn document_positions(&self) -> HashMap<NodeId, usize> {
        self.descendants(self.root)
            .enumerate()
            .map(|(pos, id)| (id, pos))
            .collect()
    }

    /// All attached elements satisfying `pred`, in document order.
    pub fn find_elements(&self, pred: impl Fn(&DomNode) -> bool) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|&id| {
                let node = self.node(id);
                node.is_element() && pred(node)
            })
            .collect()
    }

    /// Attached elements carrying attribute `name`, in document order.
    ///
    /// Unlike [`Document::select`] this also sees nodes inserted after parsing.
    pub fn elements_with_attr(&self, name: &str) -> Vec<NodeId> {
        self.find_elements(|n| n.attributes.contains_key(name))
    }

    /// Pre-order position of an attached node, `None` once detached.
    pub fn document_order(&self, id: NodeId) -> Option<usize> {
        self.descendants(self.root).position(|n| n == id)
    }

    // --- Attributes ---

    pub fn tag(&self, id: NodeId) -> &str {
        &self.nodes[id.0].tag
    }

    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.nodes[id.0].attr(name)
    }

    pub fn set_attr(&mut self, id: NodeId, name: &str, value: &str) {
        self.nodes[id.0]
            .attributes
            .insert(name.to_string(), value.to_string());
    }

    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.nodes[id.0].attributes.remove(name)
    }

    pub fn classes(&self, id: NodeId) -> impl Iterator<Item = &str> + '_ {
        self.attr(id, "class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, id: NodeId, class: &str) -> bool {
        self.classes(id).any(|c| c == class)
    }

    // --- Content ---

    /// Concatenated text of every text node in the subtree.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut buf = String::new();
        for node in self.descendants(id) {
            let n = self.node(node);
            if n.node_type == NodeType::Text {
                buf.push_str(&n.text);
            }
        }
        buf
    }

    pub fn inner_html(&self, id: NodeId) -> String {
        serialize::inner_html(self, id)
    }

    pub fn outer_html(&self, id: NodeId) -> String {
        serialize::outer_html(self, id)
    }

    /// Replace the children of `id` with the parsed `markup`.
    ///
    /// The element is left untouched when the markup does not parse cleanly.
    pub fn set_inner_html(&mut self, id: NodeId, markup: &str) -> Result<(), MarkupError> {
        let fragment = parser::parse_fragment(markup)?;
        self.clear_children(id);
        for node in fragment {
            self.append_fragment(id, node);
        }
        Ok(())
    }

    /// Replace the children of `id` with a single text node.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        self.clear_children(id);
        if !text.is_empty() {
            let t = self.create_text(text);
            self.append_child(id, t);
        }
    }

    /// Swap `id` for a text node at the same position. Returns the new node,
    /// or `None` when `id` has no parent.
    pub fn replace_with_text(&mut self, id: NodeId, text: &str) -> Option<NodeId> {
        let parent = self.nodes[id.0].parent?;
        let slot = self.nodes[parent.0].children.iter().position(|&c| c == id)?;
        let replacement = self.create_text(text);
        self.source_stale = true;
        self.nodes[replacement.0].parent = Some(parent);
        self.nodes[parent.0].children[slot] = replacement;
        self.nodes[id.0].parent = None;
        Some(replacement)
    }

    /// Merge adjacent text nodes and drop empty ones across the subtree.
    pub fn normalize(&mut self, id: NodeId) {
        let children = self.nodes[id.0].children.clone();
        let mut merged: Vec<NodeId> = Vec::with_capacity(children.len());
        for child in children {
            if self.nodes[child.0].node_type == NodeType::Text {
                if self.nodes[child.0].text.is_empty() {
                    self.nodes[child.0].parent = None;
                    continue;
                }
                if let Some(&prev) = merged.last() {
                    if self.nodes[prev.0].node_type == NodeType::Text {
                        let text = std::mem::take(&mut self.nodes[child.0].text);
                        self.nodes[prev.0].text.push_str(&text);
                        self.nodes[child.0].parent = None;
                        continue;
                    }
                }
            } else {
                self.normalize(child);
            }
            merged.push(child);
        }
        self.nodes[id.0].children = merged;
    }

    // --- Selectors ---

    /// Evaluate a CSS selector against the parsed page.
    ///
    /// Matches are reported in document order; elements detached since
    /// parsing are skipped. Elements inserted later are only matched after
    /// [`Document::refresh_source`]. Documents built without a source never match.
    pub fn select(&self, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        let parsed = scraper::Selector::parse(selector).map_err(|e| SelectorError::Invalid {
            selector: selector.to_string(),
            reason: e.to_string(),
        })?;
        let Some(source) = &self.source else {
            return Ok(Vec::new());
        };

        let mut matches = Vec::new();
        let mut index = 0usize;
        parser::for_each_source_element(source.root_element(), &mut |el| {
            if parsed.matches(&el) {
                if let Some(&id) = self.source_order.get(index) {
                    if self.is_attached(id) {
                        matches.push(id);
                    }
                }
            }
            index += 1;
        });
        Ok(matches)
    }

    /// [`Document::select`] restricted to descendants of `scope`.
    pub fn select_within(&self, scope: NodeId, selector: &str) -> Result<Vec<NodeId>, SelectorError> {
        Ok(self
            .select(selector)?
            .into_iter()
            .filter(|&id| id != scope && self.contains(scope, id))
            .collect())
    }

    // --- Geometry ---

    /// Laid-out box of a node, or an empty rect when none was computed.
    pub fn bounds(&self, id: NodeId) -> Rect {
        self.nodes[id.0].bounds.unwrap_or_default()
    }

    /// Host-supplied geometry. Pinned boxes survive later layout passes.
    pub fn set_bounds(&mut self, id: NodeId, rect: Rect) {
        let node = &mut self.nodes[id.0];
        node.bounds = Some(rect);
        node.pinned = true;
    }

    pub(crate) fn store_layout(&mut self, id: NodeId, rect: Rect) {
        let node = &mut self.nodes[id.0];
        if !node.pinned {
            node.bounds = Some(rect);
        }
    }

    pub fn has_layout(&self) -> bool {
        self.layout_done
    }

    pub(crate) fn mark_layout_done(&mut self) {
        self.layout_done = true;
    }
}

pub struct Ancestors<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.doc.nodes[current.0].parent;
        Some(current)
    }
}

pub struct Descendants<'a> {
    doc: &'a Document,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        self.stack
            .extend(self.doc.nodes[current.0].children.iter().rev().copied());
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_p(doc: &Document) -> NodeId {
        doc.select("p").unwrap()[0]
    }

    #[test]
    fn text_content_keeps_whitespace() {
        let doc = Document::parse("<html><body><p>One <b>two</b> three</p></body></html>", "");
        assert_eq!(doc.text_content(body_p(&doc)), "One two three");
    }

    #[test]
    fn inner_html_round_trips_through_set_inner_html() {
        let mut doc = Document::parse(
            r#"<html><body><p class="x" id="a">Fish &amp; chips <a href="/m?a=1&amp;b=2">menu</a><br></p></body></html>"#,
            "",
        );
        let p = body_p(&doc);
        let before = doc.inner_html(p);
        doc.set_inner_html(p, &before).unwrap();
        assert_eq!(doc.inner_html(p), before);
        assert!(before.contains("&amp;"));
        assert!(before.contains("<br>"));
    }

    #[test]
    fn malformed_markup_leaves_element_untouched() {
        let mut doc = Document::parse("<html><body><p>Keep me</p></body></html>", "");
        let p = body_p(&doc);
        let err = doc.set_inner_html(p, "<span>broken</span></div>");
        assert!(err.is_err());
        assert_eq!(doc.text_content(p), "Keep me");
    }

    #[test]
    fn inserted_elements_match_after_refresh() {
        let mut doc = Document::parse(r#"<html><body><div id="host">x</div></body></html>"#, "");
        let host = doc.select("#host").unwrap()[0];
        assert!(!doc.refresh_source());

        doc.set_inner_html(host, r#"<p class="new">fresh</p>"#).unwrap();
        assert!(doc.select(".new").unwrap().is_empty());

        assert!(doc.refresh_source());
        let found = doc.select(".new").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(doc.parent(found[0]), Some(host));
        assert_eq!(doc.select("#host").unwrap(), vec![host]);
    }

    #[test]
    fn replace_with_text_and_normalize_merge_siblings() {
        let mut doc = Document::parse("<html><body><p>a <span>b</span> c</p></body></html>", "");
        let p = body_p(&doc);
        let span = doc.select("span").unwrap()[0];
        doc.replace_with_text(span, "B");
        doc.normalize(p);
        assert_eq!(doc.children(p).len(), 1);
        assert_eq!(doc.text_content(p), "a B c");
        assert!(!doc.is_attached(span));
    }

    #[test]
    fn select_skips_detached_elements() {
        let mut doc = Document::parse("<html><body><p>one</p><p>two</p></body></html>", "");
        let first = body_p(&doc);
        doc.detach(first);
        let ps = doc.select("p").unwrap();
        assert_eq!(ps.len(), 1);
        assert_eq!(doc.text_content(ps[0]), "two");
    }

    #[test]
    fn invalid_selector_is_an_error() {
        let doc = Document::parse("<html><body></body></html>", "");
        assert!(matches!(doc.select("p[["), Err(SelectorError::Invalid { .. })));
    }

    #[test]
    fn handles_compare_by_identity() {
        let doc = Document::parse("<html><body><p>same</p><p>same</p></body></html>", "");
        let ps = doc.select("p").unwrap();
        assert_ne!(ps[0], ps[1]);
        assert_eq!(doc.text_content(ps[0]), doc.text_content(ps[1]));
    }
}
