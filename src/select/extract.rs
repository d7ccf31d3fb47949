//! Typed text block extraction within a container.

use crate::config::SelectorConfig;
use crate::dom::filter::has_content_indicator;
use crate::dom::{Document, NodeId};
use crate::render::layout::is_block_tag;
use crate::select::ContentType;

/// Content indicators let text this much shorter than the category minimum through
const INDICATOR_LENGTH_FACTOR: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct TextBlock {
    pub element: NodeId,
    pub kind: ContentType,
    /// Trimmed text content
    pub text: String,
    /// The element or an ancestor is marked as content by class/id
    pub content_hint: bool,
}

/// Every element of a known category under `container` (itself included)
/// that is long enough and not a structural wrapper.
pub fn extract_blocks(doc: &Document, container: NodeId, config: &SelectorConfig) -> Vec<TextBlock> {
    let mut blocks = Vec::new();
    for id in doc.descendants(container) {
        if !doc.node(id).is_element() {
            continue;
        }
        let Some(kind) = ContentType::from_tag(doc.tag(id)) else {
            continue;
        };

        let block_children = doc
            .element_children(id)
            .filter(|&c| is_block_tag(doc.tag(c)))
            .count();
        if block_children > config.max_child_elements {
            continue;
        }

        let text = doc.text_content(id).trim().to_string();
        let content_hint = has_content_indicator(doc, id);
        let mut min = kind.min_length(&config.min_lengths) as f32;
        if content_hint {
            min *= INDICATOR_LENGTH_FACTOR;
        }
        if (text.chars().count() as f32) < min {
            continue;
        }

        blocks.push(TextBlock {
            element: id,
            kind,
            text,
            content_hint,
        });
    }
    blocks
}

/// Blog-like containers: mostly `<p>`, or a solid run of paragraphs.
pub fn is_paragraph_heavy(blocks: &[TextBlock]) -> bool {
    if blocks.is_empty() {
        return false;
    }
    let paragraphs = blocks
        .iter()
        .filter(|b| b.kind == ContentType::Paragraph)
        .count();
    let ratio = paragraphs as f32 / blocks.len() as f32;
    ratio >= 0.6 || (paragraphs >= 5 && ratio > 0.4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocks(html: &str) -> Vec<TextBlock> {
        let doc = Document::parse(html, "");
        let body = doc.select("body").unwrap()[0];
        extract_blocks(&doc, body, &SelectorConfig::default())
    }

    #[test]
    fn applies_category_minimums() {
        let out = blocks(
            "<html><body><h2>Too short</h2><h2>Long enough heading</h2><p>Tiny paragraph.</p><li>A list item that is long enough</li></body></html>",
        );
        let kinds: Vec<ContentType> = out.iter().map(|b| b.kind).collect();
        assert_eq!(kinds, vec![ContentType::Heading, ContentType::ListItem]);
    }

    #[test]
    fn content_indicator_relaxes_length() {
        // 26 chars: under 30, over 24
        let out = blocks(
            r#"<html><body><div class="entry-content"><p>Twenty six characters here</p></div></body></html>"#,
        );
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn wrappers_with_many_blocks_are_skipped() {
        let items: String = (0..6)
            .map(|i| format!("<p>Nested paragraph {i} with plenty of text.</p>"))
            .collect();
        let out = blocks(&format!(
            "<html><body><blockquote>{items}</blockquote></body></html>"
        ));
        assert!(out.iter().all(|b| b.kind == ContentType::Paragraph));
        assert_eq!(out.len(), 6);
    }

    fn block(kind: ContentType) -> TextBlock {
        TextBlock {
            element: NodeId::from_index(0),
            kind,
            text: String::new(),
            content_hint: false,
        }
    }

    #[test]
    fn paragraph_heavy_thresholds() {
        use ContentType::*;
        assert!(is_paragraph_heavy(&[block(Paragraph), block(Paragraph), block(Heading)]));
        assert!(!is_paragraph_heavy(&[block(Paragraph), block(Heading)]));
        let mixed: Vec<TextBlock> = [Paragraph; 5]
            .into_iter()
            .chain([Heading; 3])
            .chain([ListItem; 4])
            .map(block)
            .collect();
        // 5 of 12 is 0.42
        assert!(is_paragraph_heavy(&mixed));
        assert!(!is_paragraph_heavy(&[]));
    }
}
