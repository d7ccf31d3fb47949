//! Readability-style container scoring.
//!
//! Scores element subtrees by text length, text density, link density,
//! tag semantics and class/id hints. Used to pick a content container when
//! none of the configured container selectors matches.

use crate::dom::filter::{classify_element, link_density};
use crate::dom::{Classification, Document, NodeId};

/// Score a single element for content-richness.
pub fn score_node(doc: &Document, id: NodeId) -> f32 {
    let text = doc.text_content(id);
    let text_len = text.trim().chars().count() as f32;

    if text_len < 25.0 {
        return -1.0;
    }

    let mut score: f32 = 0.0;

    // Text length (log-scale, capped)
    score += text_len.ln().min(8.0);

    // Text density bonus
    let nodes = doc.descendants(id).count().max(1) as f32;
    score += (text_len / nodes).min(50.0) * 0.3;

    // Link density penalty
    score -= link_density(doc, id) * 25.0;

    // Tag bonuses / penalties
    match doc.tag(id) {
        "article" | "main" => score += 10.0,
        "section" => score += 5.0,
        "blockquote" | "pre" => score += 3.0,
        "div" => score += 1.0,
        "nav" | "aside" => score -= 10.0,
        "footer" | "header" => score -= 5.0,
        "form" => score -= 5.0,
        _ => {}
    }

    match classify_element(doc, id) {
        Classification::Content => score += 8.0,
        Classification::Navigation | Classification::Advertisement => score -= 8.0,
        Classification::Structural | Classification::Tracker => score -= 5.0,
        _ => {}
    }

    // Paragraph count bonus
    let p_count = doc.element_children(id).filter(|&c| doc.tag(c) == "p").count();
    score += p_count as f32 * 2.0;

    score
}

/// The highest-scoring element below `root` whose score clears the minimum threshold.
pub fn best_content_node(doc: &Document, root: NodeId) -> Option<NodeId> {
    let mut best_score = 5.0f32; // minimum threshold
    let mut best = None;
    for id in doc.descendants(root) {
        if !doc.node(id).is_element() {
            continue;
        }
        let s = score_node(doc, id);
        if s > best_score {
            best_score = s;
            best = Some(id);
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn article_scores_higher_than_nav() {
        let html = format!(
            "<html><body><nav><a href='/'>Link 1</a><a href='/'>Link 2</a></nav>\
             <article><p>{}</p><p>{}</p></article></body></html>",
            "paragraph one ".repeat(10),
            "paragraph two ".repeat(10)
        );
        let doc = Document::parse(&html, "");
        let article = doc.select("article").unwrap()[0];
        let nav = doc.select("nav").unwrap()[0];
        assert!(score_node(&doc, article) > score_node(&doc, nav));
    }

    #[test]
    fn best_node_is_the_article() {
        let html = format!(
            "<html><body><div class='sidebar'><a href='/'>Home</a></div>\
             <article><p>{}</p><p>{}</p></article><footer>Copyright</footer></body></html>",
            "Long article text. ".repeat(15),
            "More article text. ".repeat(15)
        );
        let doc = Document::parse(&html, "");
        let article = doc.select("article").unwrap()[0];
        assert_eq!(best_content_node(&doc, doc.root()), Some(article));
    }
}
