use std::collections::BTreeMap;

use scraper::{ElementRef, Html, Node};
use thiserror::Error;

use crate::dom::Document;

/// Tags whose children are dropped (script/invisible content)
const SKIP_CHILDREN: &[&str] = &["script", "style", "noscript", "svg", "template"];

/// Owned parse result for one node of a markup fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        children: Vec<FragmentNode>,
    },
    Text(String),
}

/// Markup that html5ever could only parse with errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarkupError {
    #[error("malformed markup: {0}")]
    Malformed(String),
}

/// A CSS selector `scraper` refuses to parse.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("unsupported selector `{selector}`: {reason}")]
    Invalid { selector: String, reason: String },
}

/// Parse a raw HTML page into a [`Document`].
pub fn parse_html(html: &str, url: &str) -> Document {
    let source = Html::parse_document(html);

    // Extract <title>
    let title = scraper::Selector::parse("title")
        .ok()
        .and_then(|sel| source.select(&sel).next())
        .map(|el| el.text().collect::<String>())
        .unwrap_or_default();

    let mut doc = Document::new();
    doc.url = url.to_string();
    doc.title = title.trim().to_string();

    let tree = convert_element(source.root_element());
    let root = doc.root();
    doc.append_fragment(root, tree);
    doc.attach_source(source);
    doc
}

/// Parse a markup fragment in `<body>` context.
///
/// Any parse error reported by html5ever rejects the whole fragment.
pub fn parse_fragment(markup: &str) -> Result<Vec<FragmentNode>, MarkupError> {
    let fragment = Html::parse_fragment(markup);
    if let Some(first) = fragment.errors.first() {
        return Err(MarkupError::Malformed(first.to_string()));
    }
    Ok(convert_children(fragment.root_element()))
}

/// Visit every source element in the same pre-order `parse_html` converts them.
pub(crate) fn for_each_source_element<'a, F>(el: ElementRef<'a>, f: &mut F)
where
    F: FnMut(ElementRef<'a>),
{
    f(el);
    if SKIP_CHILDREN.contains(&el.value().name()) {
        return;
    }
    for child in el.children() {
        if let Some(child_el) = ElementRef::wrap(child) {
            for_each_source_element(child_el, f);
        }
    }
}

fn convert_element(el: ElementRef<'_>) -> FragmentNode {
    let tag = el.value().name().to_ascii_lowercase();
    let attributes: BTreeMap<String, String> = el
        .value()
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let children = if SKIP_CHILDREN.contains(&tag.as_str()) {
        Vec::new()
    } else {
        convert_children(el)
    };

    FragmentNode::Element {
        tag,
        attributes,
        children,
    }
}

fn convert_children(el: ElementRef<'_>) -> Vec<FragmentNode> {
    let mut children = Vec::new();
    for child_ref in el.children() {
        match child_ref.value() {
            Node::Element(_) => {
                if let Some(child_el) = ElementRef::wrap(child_ref) {
                    children.push(convert_element(child_el));
                }
            }
            Node::Text(t) => {
                // Whitespace-only runs are kept: text concatenation must stay lossless.
                if !t.text.is_empty() {
                    children.push(FragmentNode::Text(t.text.to_string()));
                }
            }
            _ => {}
        }
    }
    children
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_html() {
        let html = r#"
        <html>
            <head><title>Test Page</title></head>
            <body>
                <h1>Hello, proofreader</h1>
                <p>Content paragraph</p>
            </body>
        </html>
        "#;

        let doc = parse_html(html, "https://example.com");
        assert_eq!(doc.title, "Test Page");
        assert_eq!(doc.url, "https://example.com");
        assert!(doc.node_count() > 4);
    }

    #[test]
    fn strips_script_children() {
        let html = r#"
        <html><body>
            <p>Visible</p>
            <script>alert("hidden");</script>
        </body></html>
        "#;

        let doc = parse_html(html, "https://example.com");
        let text = doc.text_content(doc.root());
        assert!(text.contains("Visible"));
        assert!(!text.contains("alert"));
    }

    #[test]
    fn source_order_lines_up_across_skipped_subtrees() {
        let html = r#"<html><body><svg><g><path/></g></svg><p>after svg</p></body></html>"#;
        let doc = parse_html(html, "");
        let ps = doc.select("p").unwrap();
        assert_eq!(ps.len(), 1);
        assert_eq!(doc.text_content(ps[0]), "after svg");
    }

    #[test]
    fn fragment_keeps_text_and_elements() {
        let nodes = parse_fragment(r#"Hi <span class="a">there</span>!"#).unwrap();
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes[0], FragmentNode::Text("Hi ".into()));
        assert!(matches!(&nodes[1], FragmentNode::Element { tag, .. } if tag == "span"));
    }

    #[test]
    fn stray_end_tag_is_rejected() {
        assert!(parse_fragment("<span>ok</span></div>").is_err());
    }
}
