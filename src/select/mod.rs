//! Content selection: which elements of a page are worth proofreading.
//!
//! Runs in four passes: find the content containers, extract typed text
//! blocks from each, filter out chrome and junk, then put the survivors in
//! reading order and cap the list.

pub mod container;
pub mod extract;
pub mod quality;

use std::collections::HashSet;

use log::{debug, warn};

use crate::config::{CategoryLengths, ProofreadConfig, SelectorConfig};
use crate::dom::{Document, NodeId};
use crate::render::layout::Rect;

/// Category of a text block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Heading,
    Paragraph,
    Quote,
    Caption,
    Definition,
    Summary,
    ListItem,
}

impl ContentType {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Some(ContentType::Heading),
            "p" => Some(ContentType::Paragraph),
            "blockquote" => Some(ContentType::Quote),
            "figcaption" | "caption" => Some(ContentType::Caption),
            "dd" | "dt" => Some(ContentType::Definition),
            "summary" => Some(ContentType::Summary),
            "li" => Some(ContentType::ListItem),
            _ => None,
        }
    }

    pub fn min_length(self, lengths: &CategoryLengths) -> usize {
        match self {
            ContentType::Heading => lengths.heading,
            ContentType::Paragraph => lengths.paragraph,
            ContentType::Quote => lengths.quote,
            ContentType::Caption => lengths.caption,
            ContentType::Definition => lengths.definition,
            ContentType::Summary => lengths.summary,
            ContentType::ListItem => lengths.list_item,
        }
    }

    /// Ordering weight within a row; higher comes first.
    ///
    /// Paragraph-heavy containers (blogs, news) put prose above headings,
    /// reference pages the other way round.
    pub fn priority(self, paragraph_heavy: bool) -> u8 {
        match self {
            ContentType::Paragraph if paragraph_heavy => 10,
            ContentType::Heading if paragraph_heavy => 8,
            ContentType::Heading => 10,
            ContentType::Paragraph => 8,
            ContentType::Quote => 7,
            ContentType::ListItem => 6,
            ContentType::Definition => 5,
            ContentType::Caption => 4,
            ContentType::Summary => 3,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Heading => "heading",
            ContentType::Paragraph => "paragraph",
            ContentType::Quote => "quote",
            ContentType::Caption => "caption",
            ContentType::Definition => "definition",
            ContentType::Summary => "summary",
            ContentType::ListItem => "list-item",
        }
    }
}

/// An element chosen for proofreading.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentCandidate {
    pub element: NodeId,
    pub kind: ContentType,
    pub priority: u8,
    pub position: Rect,
    /// Pre-order position in the document, the final tie-break
    pub order: usize,
}

pub struct ContentSelector<'a> {
    config: &'a SelectorConfig,
    viewport_width: f32,
}

impl<'a> ContentSelector<'a> {
    pub fn new(config: &'a ProofreadConfig) -> Self {
        Self {
            config: &config.selector,
            viewport_width: config.viewport_width,
        }
    }

    /// Candidates under `root` in reading order, at most `max_candidates`.
    ///
    /// Relies on element bounds; run layout (or pin host geometry) first.
    pub fn select_candidates(&self, doc: &Document, root: NodeId) -> Vec<ContentCandidate> {
        if !doc.has_layout() {
            warn!("selecting content on a document without layout; every element will look empty");
        }

        let positions = doc.document_positions();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for container in container::find_containers(doc, root, self.config) {
            let blocks = extract::extract_blocks(doc, container, self.config);
            let paragraph_heavy = extract::is_paragraph_heavy(&blocks);
            debug!(
                "container <{}> yields {} blocks (paragraph-heavy: {})",
                doc.tag(container),
                blocks.len(),
                paragraph_heavy
            );

            for block in blocks {
                if let Err(reason) =
                    quality::check(doc, &block, container, self.config, self.viewport_width)
                {
                    debug!("rejecting <{}>: {}", doc.tag(block.element), reason);
                    continue;
                }
                if !seen.insert(block.element) {
                    continue;
                }
                candidates.push(ContentCandidate {
                    element: block.element,
                    kind: block.kind,
                    priority: block.kind.priority(paragraph_heavy),
                    position: doc.bounds(block.element),
                    order: positions.get(&block.element).copied().unwrap_or(usize::MAX),
                });
            }
        }

        let candidates = drop_enclosing(doc, candidates);
        let mut ordered = reading_order(candidates, self.config.same_row_threshold);
        ordered.truncate(self.config.max_candidates);
        ordered
    }
}

/// Element handles of the selected candidates, in order.
pub fn selected_elements(candidates: &[ContentCandidate]) -> Vec<NodeId> {
    candidates.iter().map(|c| c.element).collect()
}

/// A block that wraps another selected block would be proofread twice.
fn drop_enclosing(doc: &Document, candidates: Vec<ContentCandidate>) -> Vec<ContentCandidate> {
    let ids: HashSet<NodeId> = candidates.iter().map(|c| c.element).collect();
    candidates
        .into_iter()
        .filter(|c| {
            !ids.iter()
                .any(|&other| other != c.element && doc.contains(c.element, other))
        })
        .collect()
}

/// Sort top to bottom, left to right, then by priority and document order.
///
/// Positions closer than `threshold` pixels count as the same row (or column).
fn reading_order(mut candidates: Vec<ContentCandidate>, threshold: f32) -> Vec<ContentCandidate> {
    candidates.sort_by(|a, b| {
        a.position
            .top
            .total_cmp(&b.position.top)
            .then(a.order.cmp(&b.order))
    });

    let mut rows: Vec<Vec<ContentCandidate>> = Vec::new();
    for candidate in candidates {
        match rows.last_mut() {
            Some(row) if candidate.position.top - row[0].position.top < threshold => {
                row.push(candidate)
            }
            _ => rows.push(vec![candidate]),
        }
    }

    let mut ordered = Vec::new();
    for mut row in rows {
        row.sort_by(|a, b| a.position.left.total_cmp(&b.position.left));
        let mut column = 0usize;
        let mut column_left = row.first().map(|c| c.position.left).unwrap_or_default();
        let mut keyed: Vec<(usize, ContentCandidate)> = Vec::with_capacity(row.len());
        for candidate in row {
            if candidate.position.left - column_left >= threshold {
                column += 1;
                column_left = candidate.position.left;
            }
            keyed.push((column, candidate));
        }
        keyed.sort_by(|(ca, a), (cb, b)| {
            ca.cmp(cb)
                .then(b.priority.cmp(&a.priority))
                .then(a.order.cmp(&b.order))
        });
        ordered.extend(keyed.into_iter().map(|(_, c)| c));
    }
    ordered
}
