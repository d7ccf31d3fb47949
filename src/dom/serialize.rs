//! Deterministic HTML serialization for the document arena.
//!
//! Attributes come out sorted by name, so serializing, re-parsing and
//! serializing again yields the same string.

use crate::dom::{Document, NodeId, NodeType};

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Elements whose text the tokenizer reads verbatim, so it is written unescaped.
const RAW_TEXT_TAGS: &[&str] = &[
    "style", "script", "xmp", "iframe", "noembed", "noframes", "plaintext", "noscript",
];

/// Elements where the parser drops a newline directly after the start tag.
const LEADING_NEWLINE_TAGS: &[&str] = &["pre", "textarea", "listing"];

/// Escape text content for HTML output.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape a double-quoted attribute value.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn inner_html(doc: &Document, id: NodeId) -> String {
    let mut out = String::new();
    let raw = is_raw_text_parent(doc, id);
    for &child in doc.children(id) {
        write_node(doc, child, raw, &mut out);
    }
    out
}

pub fn outer_html(doc: &Document, id: NodeId) -> String {
    if doc.node(id).node_type == NodeType::Document {
        return inner_html(doc, id);
    }
    let mut out = String::new();
    let raw = doc
        .parent(id)
        .map(|parent| is_raw_text_parent(doc, parent))
        .unwrap_or(false);
    write_node(doc, id, raw, &mut out);
    out
}

fn is_raw_text_parent(doc: &Document, id: NodeId) -> bool {
    let node = doc.node(id);
    node.node_type == NodeType::Element && RAW_TEXT_TAGS.contains(&node.tag.as_str())
}

fn write_node(doc: &Document, id: NodeId, raw_text: bool, out: &mut String) {
    let node = doc.node(id);
    match node.node_type {
        NodeType::Text if raw_text => out.push_str(&node.text),
        NodeType::Text => out.push_str(&escape_text(&node.text)),
        NodeType::Document => {
            for &child in node.children() {
                write_node(doc, child, false, out);
            }
        }
        NodeType::Element => {
            out.push('<');
            out.push_str(&node.tag);
            for (name, value) in &node.attributes {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
            out.push('>');
            let tag = node.tag.as_str();
            if VOID_TAGS.contains(&tag) {
                return;
            }
            if LEADING_NEWLINE_TAGS.contains(&tag) {
                let first = node.children().first().map(|&c| doc.node(c));
                if first.is_some_and(|c| c.node_type == NodeType::Text && c.text.starts_with('\n')) {
                    out.push('\n');
                }
            }
            let raw = RAW_TEXT_TAGS.contains(&tag);
            for &child in node.children() {
                write_node(doc, child, raw, out);
            }
            out.push_str("</");
            out.push_str(&node.tag);
            out.push('>');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_text_and_attributes() {
        assert_eq!(escape_text("a < b & c"), "a &lt; b &amp; c");
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
    }

    #[test]
    fn attributes_are_sorted() {
        let doc = Document::parse(r#"<html><body><p title="t" class="c" id="i">x</p></body></html>"#, "");
        let p = doc.select("p").unwrap()[0];
        assert_eq!(doc.outer_html(p), r#"<p class="c" id="i" title="t">x</p>"#);
    }

    #[test]
    fn void_elements_have_no_end_tag() {
        let doc = Document::parse("<html><body><p>a<br>b<img src=\"x.png\"></p></body></html>", "");
        let p = doc.select("p").unwrap()[0];
        assert_eq!(doc.inner_html(p), r#"a<br>b<img src="x.png">"#);
    }

    #[test]
    fn pre_keeps_its_leading_newline() {
        let doc = Document::parse("<html><body><div><pre>\n\ncode</pre></div></body></html>", "");
        let div = doc.select("div").unwrap()[0];
        assert_eq!(doc.inner_html(div), "<pre>\n\ncode</pre>");
    }

    #[test]
    fn raw_text_is_not_escaped() {
        let doc = Document::parse("<html><body><div><xmp>a &amp; b</xmp></div></body></html>", "");
        let div = doc.select("div").unwrap()[0];
        assert_eq!(doc.inner_html(div), "<xmp>a &amp; b</xmp>");
        let xmp = doc.select("xmp").unwrap()[0];
        assert_eq!(doc.text_content(xmp), "a &amp; b");
    }
}
