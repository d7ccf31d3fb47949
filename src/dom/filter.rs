use crate::dom::{Classification, Document, NodeId, NodeType};

/// Class/id words that mark advertising blocks
const AD_WORDS: &[&str] = &[
    "ad",
    "ads",
    "advert",
    "adverts",
    "advertisement",
    "banner",
    "sponsor",
    "sponsored",
    "promoted",
    "promo",
    "commercial",
    "adsense",
    "doubleclick",
    "taboola",
    "outbrain",
    "prebid",
    "dfp",
    "gpt",
];

/// Class/id words for consent banners, popups and tracking widgets
const TRACKER_WORDS: &[&str] = &[
    "tracker",
    "tracking",
    "analytics",
    "pixel",
    "beacon",
    "cookie",
    "cookies",
    "consent",
    "gdpr",
    "ccpa",
    "popup",
    "modal",
    "overlay",
    "newsletter",
    "subscribe",
];

/// Class/id words for navigation chrome
const NAV_WORDS: &[&str] = &[
    "nav",
    "navbar",
    "navigation",
    "menu",
    "menubar",
    "breadcrumb",
    "breadcrumbs",
    "pagination",
    "pager",
    "toc",
    "skip",
    "tabs",
];

/// Class/id words for structural chrome
const STRUCTURAL_WORDS: &[&str] = &[
    "footer",
    "masthead",
    "sidebar",
    "widget",
    "share",
    "social",
    "comment",
    "comments",
    "related",
    "toolbar",
    "copyright",
];

/// Class/id words that vouch for readable content
const CONTENT_WORDS: &[&str] = &[
    "content", "article", "post", "entry", "story", "prose", "body-text", "main-text", "markdown",
];

/// Split class and id into lowercase words on any non-alphanumeric boundary.
fn hint_words(doc: &Document, id: NodeId) -> Vec<String> {
    let combined = format!(
        "{} {}",
        doc.attr(id, "class").unwrap_or(""),
        doc.attr(id, "id").unwrap_or("")
    )
    .to_lowercase();
    combined
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn hint_string(doc: &Document, id: NodeId) -> String {
    format!(
        "{} {}",
        doc.attr(id, "class").unwrap_or(""),
        doc.attr(id, "id").unwrap_or("")
    )
    .to_lowercase()
}

/// Classify a single element using tag and class/id heuristics.
pub fn classify_element(doc: &Document, id: NodeId) -> Classification {
    let node = doc.node(id);
    if node.node_type != NodeType::Element {
        return Classification::Unknown;
    }

    // --- Tag-based classification ---
    match node.tag.as_str() {
        "nav" | "menu" => return Classification::Navigation,
        "footer" | "aside" => return Classification::Structural,
        "button" | "input" | "textarea" | "select" | "form" | "label" | "dialog" => {
            return Classification::Interactive;
        }
        "script" | "noscript" | "iframe" => return Classification::Tracker,
        _ => {}
    }

    match node.attr("role") {
        Some("navigation") | Some("menu") | Some("menubar") | Some("tablist") => {
            return Classification::Navigation;
        }
        Some("banner") | Some("contentinfo") | Some("complementary") => {
            return Classification::Structural;
        }
        Some("dialog") | Some("alertdialog") => return Classification::Tracker,
        _ => {}
    }

    // --- Data attributes that indicate ads ---
    if node
        .attributes
        .keys()
        .any(|k| k.starts_with("data-ad") || k.starts_with("data-tracking"))
    {
        return Classification::Advertisement;
    }

    // --- Class/ID word matching ---
    let words = hint_words(doc, id);
    let has = |list: &[&str]| words.iter().any(|w| list.contains(&w.as_str()));
    if has(AD_WORDS) {
        return Classification::Advertisement;
    }
    if has(TRACKER_WORDS) {
        return Classification::Tracker;
    }
    if has(NAV_WORDS) {
        return Classification::Navigation;
    }
    if has(STRUCTURAL_WORDS) {
        return Classification::Structural;
    }

    // --- Link density heuristic ---
    if link_density(doc, id) > 0.6 && doc.element_children(id).count() > 3 {
        return Classification::Navigation;
    }

    if has_content_hint(doc, id) {
        return Classification::Content;
    }

    Classification::Unknown
}

/// Whether the element's own class/id vouches for content.
fn has_content_hint(doc: &Document, id: NodeId) -> bool {
    let hints = hint_string(doc, id);
    let words = hint_words(doc, id);
    CONTENT_WORDS
        .iter()
        .any(|kw| words.iter().any(|w| w == kw) || (kw.contains('-') && hints.contains(kw)))
}

/// Whether the element, or an ancestor below `scope`, is page chrome.
pub fn is_chrome(doc: &Document, id: NodeId, scope: Option<NodeId>) -> bool {
    if classify_element(doc, id).is_chrome() {
        return true;
    }
    doc.ancestors(id)
        .take_while(|&a| Some(a) != scope)
        .any(|a| classify_element(doc, a).is_chrome())
}

/// Whether the element or any ancestor carries a content indicator class/id.
pub fn has_content_indicator(doc: &Document, id: NodeId) -> bool {
    has_content_hint(doc, id) || doc.ancestors(id).any(|a| has_content_hint(doc, a))
}

/// Ratio of link text to total text in the subtree.
pub fn link_density(doc: &Document, id: NodeId) -> f32 {
    let total = visible_chars(&doc.text_content(id)) as f32;
    if total == 0.0 {
        return 0.0;
    }
    let link_text: usize = doc
        .descendants(id)
        .filter(|&d| d != id && doc.tag(d) == "a")
        .filter(|&d| !doc.ancestors(d).take_while(|&a| a != id).any(|a| doc.tag(a) == "a"))
        .map(|d| visible_chars(&doc.text_content(d)))
        .sum();
    link_text as f32 / total
}

fn visible_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}
