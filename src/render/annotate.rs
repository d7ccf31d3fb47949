//! Inline annotation markup.
//!
//! Turns an edit script (diff path) or a list of correction spans (span path)
//! into HTML where every visible correction is a `<span class="po-annotation">`
//! carrying `data-po-original`, `data-po-corrected`, `data-po-type` and
//! `data-po-tooltip`. Whitespace-only changes are written as plain text.

use crate::config::RenderConfig;
use crate::correction::span::{normalize, CorrectionSpan, CorrectionType, SpanIndex};
use crate::dom::serialize::{escape_attr, escape_text};
use crate::text::align::{EditKind, EditOp};

/// Class carried by every annotation element
pub const ANNOTATION_CLASS: &str = "po-annotation";
/// Class of the overflow indicator
pub const MORE_CLASS: &str = "po-more";
/// Attribute holding the original text of an annotation
pub const ORIGINAL_ATTR: &str = "data-po-original";

const PREPOSITIONS: &[&str] = &[
    "in", "on", "at", "to", "for", "of", "with", "by", "from", "about", "into", "onto",
];

/// One rendered correction, listed alongside the markup for sidebars.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub kind: EditKind,
    pub original: String,
    pub corrected: String,
    pub category: CorrectionType,
    pub explanation: Option<String>,
}

impl Annotation {
    /// Tooltip payload: category label, plus the explanation when present.
    pub fn tooltip(&self) -> String {
        match &self.explanation {
            Some(e) if !e.trim().is_empty() => format!("{}: {}", self.category.label(), e.trim()),
            _ => self.category.label().to_string(),
        }
    }
}

/// Render result for one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnnotationFragment {
    pub markup: String,
    pub annotations: Vec<Annotation>,
    /// Changes past the annotation cap, rendered as plain corrected text
    pub truncated: usize,
}

/// The two shapes a service answer can be rendered from.
pub enum RenderInput<'a> {
    /// Aligned edit script, optionally decorated by service spans
    Diff {
        ops: &'a [EditOp],
        spans: &'a SpanIndex,
    },
    /// Span-level corrections against the original text
    Spans(&'a [CorrectionSpan]),
}

pub struct AnnotationRenderer {
    max_annotations: usize,
}

impl AnnotationRenderer {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            max_annotations: config.max_annotations,
        }
    }

    pub fn render(&self, original: &str, input: RenderInput<'_>) -> AnnotationFragment {
        match input {
            RenderInput::Diff { ops, spans } => self.render_diff(ops, spans),
            RenderInput::Spans(spans) => self.render_spans(original, spans),
        }
    }

    /// Render an edit script. Original byte offsets are tracked so each change
    /// can borrow category and explanation from an overlapping service span.
    pub fn render_diff(&self, ops: &[EditOp], spans: &SpanIndex) -> AnnotationFragment {
        let mut out = MarkupWriter::new(self.max_annotations);
        let mut pos = 0usize;

        for op in ops {
            match op {
                EditOp::Equal(text) => {
                    out.plain(text);
                    pos += text.len();
                }
                EditOp::Delete(text) => {
                    if !is_blank(text) {
                        let span = spans.lookup(pos, pos + text.len());
                        out.annotate(build(EditKind::Delete, text, "", span));
                    }
                    pos += text.len();
                }
                EditOp::Insert(text) => {
                    if is_blank(text) {
                        out.plain(text);
                    } else {
                        let span = spans.lookup(pos, pos);
                        out.annotate(build(EditKind::Insert, "", text, span));
                    }
                }
                EditOp::Replace {
                    original,
                    corrected,
                } => {
                    if is_blank(original) && is_blank(corrected) {
                        out.plain(corrected);
                    } else {
                        let span = spans.lookup(pos, pos + original.len());
                        out.annotate(build(EditKind::Replace, original, corrected, span));
                    }
                    pos += original.len();
                }
            }
        }
        out.finish()
    }

    /// Render span corrections directly: gaps are copied verbatim and each
    /// merged span wraps its original text.
    pub fn render_spans(&self, original: &str, spans: &[CorrectionSpan]) -> AnnotationFragment {
        let mut out = MarkupWriter::new(self.max_annotations);
        let mut pos = 0usize;

        for span in normalize(spans) {
            let Some(segment) = original.get(span.start_index..span.end_index) else {
                continue;
            };
            if span.start_index < pos {
                continue;
            }
            out.plain(&original[pos..span.start_index]);

            let corrected = span.correction_text.as_str();
            if segment == corrected {
                out.plain(segment);
            } else if is_blank(segment) && is_blank(corrected) {
                out.plain(corrected);
            } else {
                let kind = if corrected.is_empty() {
                    EditKind::Delete
                } else {
                    EditKind::Replace
                };
                out.annotate(build(kind, segment, corrected, Some(&span)));
            }
            pos = span.end_index;
        }
        out.plain(&original[pos..]);
        out.finish()
    }
}

fn build(
    kind: EditKind,
    original: &str,
    corrected: &str,
    span: Option<&CorrectionSpan>,
) -> Annotation {
    let category = match span.map(|s| s.kind) {
        Some(kind) if kind != CorrectionType::Other => kind,
        _ => infer_category(kind, original, corrected),
    };
    Annotation {
        kind,
        original: original.to_string(),
        corrected: corrected.to_string(),
        category,
        explanation: span.and_then(|s| s.explanation.clone()),
    }
}

struct MarkupWriter {
    markup: String,
    annotations: Vec<Annotation>,
    truncated: usize,
    max: usize,
}

impl MarkupWriter {
    fn new(max: usize) -> Self {
        Self {
            markup: String::new(),
            annotations: Vec::new(),
            truncated: 0,
            max,
        }
    }

    fn plain(&mut self, text: &str) {
        self.markup.push_str(&escape_text(text));
    }

    fn annotate(&mut self, annotation: Annotation) {
        if self.annotations.len() >= self.max {
            self.truncated += 1;
            self.plain(&annotation.corrected);
            return;
        }

        let (class, content) = match annotation.kind {
            EditKind::Delete => ("po-delete", annotation.original.as_str()),
            EditKind::Insert => ("po-insert", annotation.corrected.as_str()),
            _ => ("po-replace", annotation.corrected.as_str()),
        };
        self.markup.push_str(&format!(
            r#"<span class="{ANNOTATION_CLASS} {class}" data-po-index="{}" {ORIGINAL_ATTR}="{}" data-po-corrected="{}" data-po-type="{}" data-po-tooltip="{}">{}</span>"#,
            self.annotations.len(),
            escape_attr(&annotation.original),
            escape_attr(&annotation.corrected),
            annotation.category.as_str(),
            escape_attr(&annotation.tooltip()),
            escape_text(content),
        ));
        self.annotations.push(annotation);
    }

    fn finish(mut self) -> AnnotationFragment {
        if self.truncated > 0 {
            self.markup.push_str(&format!(
                r#"<span class="{MORE_CLASS}">+{} more changes</span>"#,
                self.truncated
            ));
        }
        AnnotationFragment {
            markup: self.markup,
            annotations: self.annotations,
            truncated: self.truncated,
        }
    }
}

fn is_blank(text: &str) -> bool {
    text.chars().all(char::is_whitespace)
}

fn is_punctuation_only(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| !c.is_alphanumeric() && !c.is_whitespace())
}

fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| c.is_alphanumeric()).collect()
}

/// Best-effort category when the service gave none for this change.
fn infer_category(kind: EditKind, original: &str, corrected: &str) -> CorrectionType {
    let o = original.trim();
    let c = corrected.trim();
    match kind {
        EditKind::Insert if is_punctuation_only(c) => CorrectionType::Punctuation,
        EditKind::Insert => CorrectionType::MissingWords,
        EditKind::Delete if is_punctuation_only(o) => CorrectionType::Punctuation,
        EditKind::Delete => CorrectionType::Grammar,
        EditKind::Equal => CorrectionType::Other,
        EditKind::Replace => {
            if o.to_lowercase() == c.to_lowercase() {
                return CorrectionType::Capitalization;
            }
            if (is_punctuation_only(o) || o.is_empty()) && (is_punctuation_only(c) || c.is_empty())
            {
                return CorrectionType::Punctuation;
            }
            if strip_punctuation(o) == strip_punctuation(c) {
                return CorrectionType::Punctuation;
            }
            let single_words = !o.contains(char::is_whitespace) && !c.contains(char::is_whitespace);
            if single_words {
                let (lo, lc) = (o.to_lowercase(), c.to_lowercase());
                if PREPOSITIONS.contains(&lo.as_str()) && PREPOSITIONS.contains(&lc.as_str()) {
                    return CorrectionType::Preposition;
                }
                if edit_distance(&lo, &lc) <= 2 {
                    return CorrectionType::Spelling;
                }
            }
            CorrectionType::Grammar
        }
    }
}

fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
