use crate::dom::css::{self, StyleProps};
use crate::dom::{Document, NodeId, NodeType};

/// Page-space bounding box of a laid-out node
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
    pub right: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            top,
            left,
            bottom: top + height,
            right: left + width,
        }
    }

    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    pub fn height(&self) -> f32 {
        self.bottom - self.top
    }

    pub fn is_empty(&self) -> bool {
        self.width() <= 0.0 || self.height() <= 0.0
    }
}

const BLOCK_TAGS: &[&str] = &[
    "html",
    "body",
    "div",
    "p",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "ul",
    "ol",
    "li",
    "dl",
    "dt",
    "dd",
    "table",
    "caption",
    "tr",
    "td",
    "th",
    "form",
    "section",
    "article",
    "aside",
    "main",
    "header",
    "footer",
    "nav",
    "blockquote",
    "pre",
    "figure",
    "figcaption",
    "details",
    "summary",
    "hr",
];

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}

/// Elements that never produce a box
const NON_RENDERED_TAGS: &[&str] = &[
    "head", "script", "style", "noscript", "template", "meta", "link", "title",
];

const DEFAULT_FONT_SIZE: f32 = 16.0;

/// Per-tag vertical margins (top, bottom) in pixels.
fn tag_margins(tag: &str) -> (f32, f32) {
    match tag {
        "h1" => (24.0, 16.0),
        "h2" => (20.0, 12.0),
        "h3" | "h4" => (16.0, 10.0),
        "h5" | "h6" => (12.0, 8.0),
        "p" => (4.0, 10.0),
        "ul" | "ol" | "dl" => (8.0, 8.0),
        "li" | "dt" | "dd" => (2.0, 2.0),
        "section" | "article" | "main" => (16.0, 16.0),
        "nav" | "header" | "footer" => (12.0, 12.0),
        "blockquote" | "figure" => (12.0, 12.0),
        "pre" => (8.0, 8.0),
        "hr" => (8.0, 8.0),
        _ => (0.0, 0.0),
    }
}

/// Per-tag padding in pixels.
fn tag_padding(tag: &str, is_block: bool) -> f32 {
    match tag {
        "section" | "article" | "main" | "aside" => 16.0,
        "nav" | "header" | "footer" => 12.0,
        "blockquote" => 20.0,
        _ if is_block => 4.0,
        _ => 0.0,
    }
}

fn font_size_for(tag: &str, parent_font_size: f32) -> f32 {
    match tag {
        "h1" => 32.0,
        "h2" => 24.0,
        "h3" => 20.0,
        "h4" => 18.0,
        "h5" | "h6" => 16.0,
        "small" | "figcaption" | "caption" => 12.0,
        _ => parent_font_size,
    }
}

/// Estimated height of wrapped text in a box of the given width.
fn text_height(text: &str, width: f32, font_size: f32) -> f32 {
    let line_height = font_size * 1.4;
    let chars_per_line = (width / (font_size * 0.6)).max(1.0) as usize;
    let chars = text.chars().count();
    let lines = (chars as f32 / chars_per_line as f32).ceil().max(1.0);
    lines * line_height
}

/// Compute page-space boxes for every node (simple top-to-bottom block model).
///
/// Boxes pinned with [`Document::set_bounds`] are left as they are.
pub fn compute_layout(doc: &mut Document, viewport_width: f32) {
    let root = doc.root();
    let mut cursor_y = 0.0;
    layout_node(doc, root, 0.0, &mut cursor_y, viewport_width, DEFAULT_FONT_SIZE);
    doc.mark_layout_done();
}

/// Lay the document out unless a layout pass already ran.
pub fn ensure_layout(doc: &mut Document, viewport_width: f32) {
    if !doc.has_layout() {
        compute_layout(doc, viewport_width);
    }
}

fn layout_node(
    doc: &mut Document,
    id: NodeId,
    x: f32,
    cursor_y: &mut f32,
    available_width: f32,
    parent_font_size: f32,
) {
    let node_type = doc.node(id).node_type;
    match node_type {
        NodeType::Document => {
            for child in doc.children(id).to_vec() {
                layout_node(doc, child, x, cursor_y, available_width, parent_font_size);
            }
            return;
        }
        NodeType::Text => {
            let text = &doc.node(id).text;
            let height = if text.trim().is_empty() {
                0.0
            } else {
                text_height(text, available_width, parent_font_size)
            };
            doc.store_layout(id, Rect::new(x, *cursor_y, available_width, height));
            *cursor_y += height;
            return;
        }
        NodeType::Element => {}
    }

    // Hidden subtrees take no space
    if NON_RENDERED_TAGS.contains(&doc.tag(id)) || css::hides_self(doc, id) {
        collapse_subtree(doc, id, x, *cursor_y);
        return;
    }

    let tag = doc.tag(id).to_string();
    let style = css::style_of(doc, id);
    let is_block = BLOCK_TAGS.contains(&tag.as_str());
    let font_size = font_size_for(&tag, parent_font_size);
    let width = style.width.unwrap_or(available_width);

    if style.is_out_of_flow() && (style.left.is_some() || style.top.is_some()) {
        let mut local_y = style.top.unwrap_or(*cursor_y);
        let left = style.left.unwrap_or(x);
        layout_box(doc, id, &tag, &style, left, &mut local_y, width, font_size, is_block);
        return;
    }

    let (margin_top, margin_bottom) = tag_margins(&tag);
    if is_block {
        *cursor_y += margin_top;
    }
    layout_box(doc, id, &tag, &style, x, cursor_y, width, font_size, is_block);
    if is_block {
        *cursor_y += margin_bottom;
    }
}

#[allow(clippy::too_many_arguments)]
fn layout_box(
    doc: &mut Document,
    id: NodeId,
    tag: &str,
    style: &StyleProps,
    x: f32,
    cursor_y: &mut f32,
    width: f32,
    font_size: f32,
    is_block: bool,
) {
    let start_y = *cursor_y;
    let padding = tag_padding(tag, is_block);
    *cursor_y += padding;

    let child_x = x + padding;
    let child_width = (width - padding * 2.0).max(0.0);

    if has_block_child(doc, id) {
        for child in doc.children(id).to_vec() {
            layout_node(doc, child, child_x, cursor_y, child_width, font_size);
        }
    } else {
        // Inline formatting context: the whole run wraps as one paragraph
        let line_top = *cursor_y;
        let text = doc.text_content(id);
        if !text.trim().is_empty() {
            *cursor_y += text_height(&text, child_width, font_size);
        }
        let line_box = Rect::new(child_x, line_top, child_width, *cursor_y - line_top);
        let inner: Vec<NodeId> = doc.descendants(id).skip(1).collect();
        for d in inner {
            doc.store_layout(d, line_box);
        }
    }

    *cursor_y += padding;

    let mut height = *cursor_y - start_y;
    if let Some(h) = style.height {
        height = h;
        *cursor_y = start_y + h;
    }
    doc.store_layout(id, Rect::new(x, start_y, width, height));
}

fn has_block_child(doc: &Document, id: NodeId) -> bool {
    doc.element_children(id)
        .any(|c| BLOCK_TAGS.contains(&doc.tag(c)))
}

fn collapse_subtree(doc: &mut Document, id: NodeId, x: f32, y: f32) {
    let subtree: Vec<NodeId> = doc.descendants(id).collect();
    for d in subtree {
        doc.store_layout(d, Rect::new(x, y, 0.0, 0.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laid_out(html: &str) -> Document {
        let mut doc = Document::parse(html, "");
        compute_layout(&mut doc, 1000.0);
        doc
    }

    #[test]
    fn blocks_stack_top_to_bottom() {
        let doc = laid_out("<html><body><h1>Title text</h1><p>First paragraph</p><p>Second</p></body></html>");
        let h1 = doc.select("h1").unwrap()[0];
        let ps = doc.select("p").unwrap();
        assert!(doc.bounds(h1).bottom <= doc.bounds(ps[0]).top);
        assert!(doc.bounds(ps[0]).bottom <= doc.bounds(ps[1]).top);
        assert!(!doc.bounds(ps[0]).is_empty());
    }

    #[test]
    fn hidden_elements_collapse() {
        let doc = laid_out(r#"<html><body><p style="display:none">Hidden paragraph</p></body></html>"#);
        let p = doc.select("p").unwrap()[0];
        assert!(doc.bounds(p).is_empty());
    }

    #[test]
    fn absolute_offsets_place_boxes_off_canvas() {
        let doc = laid_out(
            r#"<html><body><p style="position:absolute; left:-9999px">Screen reader only text</p></body></html>"#,
        );
        let p = doc.select("p").unwrap()[0];
        assert!(doc.bounds(p).right < 0.0);
    }

    #[test]
    fn pinned_bounds_survive_layout() {
        let mut doc = Document::parse("<html><body><p>Pinned</p></body></html>", "");
        let p = doc.select("p").unwrap()[0];
        let pinned = Rect::new(10.0, 500.0, 300.0, 40.0);
        doc.set_bounds(p, pinned);
        compute_layout(&mut doc, 1000.0);
        assert_eq!(doc.bounds(p), pinned);
    }

    #[test]
    fn long_text_wraps_to_more_lines() {
        assert!(text_height(&"word ".repeat(100), 300.0, 16.0) > text_height("word", 300.0, 16.0));
    }
}
