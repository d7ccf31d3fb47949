//! Lightweight CSS property extraction.
//!
//! Parses inline `style=""` attributes and extracts the handful of
//! properties that decide whether text is visible and where it sits.

use crate::dom::{Document, NodeId};

/// Extracted CSS visibility and placement properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleProps {
    pub display: Option<String>,
    pub visibility: Option<String>,
    pub opacity: Option<f32>,
    pub position: Option<String>,
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
}

impl StyleProps {
    /// `display:none`, `visibility:hidden|collapse` or a fully transparent box.
    pub fn hides(&self) -> bool {
        self.display.as_deref() == Some("none")
            || matches!(self.visibility.as_deref(), Some("hidden") | Some("collapse"))
            || self.opacity.is_some_and(|o| o <= 0.01)
    }

    /// Absolutely or fixed positioned boxes are taken out of normal flow.
    pub fn is_out_of_flow(&self) -> bool {
        matches!(self.position.as_deref(), Some("absolute") | Some("fixed"))
    }
}

/// Parse an inline `style="..."` attribute value.
pub fn parse_inline_style(style: &str) -> StyleProps {
    let mut props = StyleProps::default();
    for decl in style.split(';') {
        let Some((prop, val)) = decl.split_once(':') else {
            continue;
        };
        let prop = prop.trim().to_ascii_lowercase();
        let val = val
            .trim()
            .trim_end_matches("!important")
            .trim()
            .to_ascii_lowercase();
        match prop.as_str() {
            "display" => props.display = Some(val),
            "visibility" => props.visibility = Some(val),
            "opacity" => props.opacity = val.parse::<f32>().ok(),
            "position" => props.position = Some(val),
            "left" => props.left = parse_css_size(&val),
            "top" => props.top = parse_css_size(&val),
            "width" => props.width = parse_css_size(&val),
            "height" => props.height = parse_css_size(&val),
            _ => {}
        }
    }
    props
}

/// Inline style of an element (empty when it carries none).
pub fn style_of(doc: &Document, id: NodeId) -> StyleProps {
    doc.attr(id, "style")
        .map(parse_inline_style)
        .unwrap_or_default()
}

/// Whether the element itself hides its subtree.
pub fn hides_self(doc: &Document, id: NodeId) -> bool {
    let node = doc.node(id);
    if !node.is_element() {
        return false;
    }
    node.attributes.contains_key("hidden")
        || node.attr("aria-hidden") == Some("true")
        || style_of(doc, id).hides()
}

/// Whether the element or any of its ancestors is hidden.
pub fn is_hidden(doc: &Document, id: NodeId) -> bool {
    hides_self(doc, id) || doc.ancestors(id).any(|a| hides_self(doc, a))
}

/// Parse a CSS size value (px or plain number). Relative units are read as px.
fn parse_css_size(val: &str) -> Option<f32> {
    let v = val.trim();
    let num_str = v
        .trim_end_matches("px")
        .trim_end_matches("rem")
        .trim_end_matches("em");
    num_str.trim().parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_inline() {
        let props = parse_inline_style("display: none; opacity: 0.5; left: -9999px; width: 20em");
        assert_eq!(props.display.as_deref(), Some("none"));
        assert_eq!(props.opacity, Some(0.5));
        assert_eq!(props.left, Some(-9999.0));
        assert_eq!(props.width, Some(20.0));
    }

    #[test]
    fn detects_hiding_styles() {
        assert!(parse_inline_style("visibility:hidden").hides());
        assert!(parse_inline_style("opacity: 0").hides());
        assert!(parse_inline_style("DISPLAY: NONE !important").hides());
        assert!(!parse_inline_style("display: block; opacity: 1").hides());
    }

    #[test]
    fn hidden_ancestor_hides_descendants() {
        let doc = Document::parse(
            r#"<html><body><div style="display:none"><p>gone</p></div><p hidden>also</p><p>shown</p></body></html>"#,
            "",
        );
        let ps = doc.select("p").unwrap();
        assert!(is_hidden(&doc, ps[0]));
        assert!(is_hidden(&doc, ps[1]));
        assert!(!is_hidden(&doc, ps[2]));
    }
}
