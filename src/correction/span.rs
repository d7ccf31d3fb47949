//! Span-level corrections reported by the correction service.
//!
//! Offsets are UTF-8 byte offsets into the original text. Services that count
//! UTF-16 code units are converted with [`to_byte_offsets`] first.

use std::fmt;

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};

/// Category of a correction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CorrectionType {
    Spelling,
    Grammar,
    Punctuation,
    Capitalization,
    Preposition,
    MissingWords,
    #[default]
    Other,
}

impl CorrectionType {
    /// Parse a service-provided category; unknown labels map to `Other`.
    pub fn parse(label: &str) -> Self {
        let normalized: String = label
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c == '_' || c == ' ' { '-' } else { c })
            .collect();
        match normalized.as_str() {
            "spelling" | "typo" => CorrectionType::Spelling,
            "grammar" => CorrectionType::Grammar,
            "punctuation" => CorrectionType::Punctuation,
            "capitalization" | "capitalisation" | "caps" => CorrectionType::Capitalization,
            "preposition" => CorrectionType::Preposition,
            "missing-words" | "missing-word" => CorrectionType::MissingWords,
            _ => CorrectionType::Other,
        }
    }

    /// Value used in the `data-po-type` attribute.
    pub fn as_str(self) -> &'static str {
        match self {
            CorrectionType::Spelling => "spelling",
            CorrectionType::Grammar => "grammar",
            CorrectionType::Punctuation => "punctuation",
            CorrectionType::Capitalization => "capitalization",
            CorrectionType::Preposition => "preposition",
            CorrectionType::MissingWords => "missing-words",
            CorrectionType::Other => "other",
        }
    }

    /// Human label for tooltips.
    pub fn label(self) -> &'static str {
        match self {
            CorrectionType::Spelling => "Spelling",
            CorrectionType::Grammar => "Grammar",
            CorrectionType::Punctuation => "Punctuation",
            CorrectionType::Capitalization => "Capitalization",
            CorrectionType::Preposition => "Preposition",
            CorrectionType::MissingWords => "Missing words",
            CorrectionType::Other => "Other",
        }
    }
}

impl fmt::Display for CorrectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for CorrectionType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(CorrectionType::parse(&label))
    }
}

/// One service-reported correction of `original[start_index..end_index]`.
///
/// `start_index` and `end_index` are UTF-8 byte offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectionSpan {
    pub start_index: usize,
    pub end_index: usize,
    #[serde(rename = "correction", alias = "correctionText")]
    pub correction_text: String,
    #[serde(rename = "type", default)]
    pub kind: CorrectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl CorrectionSpan {
    pub fn new(start_index: usize, end_index: usize, correction_text: impl Into<String>) -> Self {
        Self {
            start_index,
            end_index,
            correction_text: correction_text.into(),
            kind: CorrectionType::Other,
            explanation: None,
        }
    }

    pub fn with_kind(mut self, kind: CorrectionType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_explanation(mut self, explanation: impl Into<String>) -> Self {
        self.explanation = Some(explanation.into());
        self
    }

    /// Does this span touch the original byte range `[start, end)`?
    ///
    /// An empty range (an insertion point) matches spans that contain or border it.
    pub fn overlaps(&self, start: usize, end: usize) -> bool {
        if start == end {
            self.start_index <= start && start <= self.end_index
        } else {
            self.start_index < end && start < self.end_index
        }
    }
}

/// Drop spans that cannot index `original`: inverted, empty, out of range,
/// or splitting a UTF-8 character.
pub fn validate_spans(original: &str, spans: Vec<CorrectionSpan>) -> Vec<CorrectionSpan> {
    spans
        .into_iter()
        .filter(|span| {
            let ok = span.start_index < span.end_index
                && span.end_index <= original.len()
                && original.is_char_boundary(span.start_index)
                && original.is_char_boundary(span.end_index);
            if !ok {
                warn!(
                    "dropping correction span {}..{} outside text of {} bytes",
                    span.start_index,
                    span.end_index,
                    original.len()
                );
            }
            ok
        })
        .collect()
}

/// Unit of the offsets a correction service reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OffsetUnit {
    #[default]
    Utf8,
    /// UTF-16 code units, the way browser text APIs count
    Utf16,
}

/// Rewrite spans counted in `unit` into byte offsets of `original`.
///
/// An offset that falls inside a character maps past the end of the text,
/// so [`validate_spans`] drops the span.
pub fn to_byte_offsets(
    original: &str,
    spans: Vec<CorrectionSpan>,
    unit: OffsetUnit,
) -> Vec<CorrectionSpan> {
    if unit == OffsetUnit::Utf8 {
        return spans;
    }

    // (utf-16 offset, byte offset) at every character boundary
    let mut boundaries = Vec::with_capacity(original.len() + 1);
    let mut units = 0usize;
    for (byte, ch) in original.char_indices() {
        boundaries.push((units, byte));
        units += ch.len_utf16();
    }
    boundaries.push((units, original.len()));

    let to_byte = |offset: usize| {
        boundaries
            .binary_search_by_key(&offset, |&(u, _)| u)
            .map(|i| boundaries[i].1)
            .unwrap_or(usize::MAX)
    };
    spans
        .into_iter()
        .map(|mut span| {
            span.start_index = to_byte(span.start_index);
            span.end_index = to_byte(span.end_index);
            span
        })
        .collect()
}

/// Separator between correction texts of overlapping spans.
pub const MERGE_SEPARATOR: &str = " / ";

/// Sort spans and merge every overlapping or touching pair.
///
/// Touching spans (`next.start == current.end`) cover disjoint text, so their
/// corrections concatenate directly. Truly overlapping spans join their
/// correction texts with [`MERGE_SEPARATOR`]; which sub-range produced which
/// part is lost.
pub fn normalize(spans: &[CorrectionSpan]) -> Vec<CorrectionSpan> {
    let mut sorted = spans.to_vec();
    sorted.sort_by_key(|s| (s.start_index, s.end_index));

    let mut merged: Vec<CorrectionSpan> = Vec::with_capacity(sorted.len());
    let mut iter = sorted.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };

    for next in iter {
        if next.start_index <= current.end_index {
            merge_into(&mut current, next);
        } else {
            merged.push(std::mem::replace(&mut current, next));
        }
    }
    merged.push(current);
    merged
}

fn merge_into(current: &mut CorrectionSpan, next: CorrectionSpan) {
    let touching = next.start_index == current.end_index;
    if next.correction_text != current.correction_text || touching {
        if !touching && !current.correction_text.is_empty() && !next.correction_text.is_empty() {
            current.correction_text.push_str(MERGE_SEPARATOR);
        }
        current.correction_text.push_str(&next.correction_text);
    }
    current.end_index = current.end_index.max(next.end_index);

    if current.kind == CorrectionType::Other {
        current.kind = next.kind;
    }
    match (&mut current.explanation, next.explanation) {
        (Some(existing), Some(extra)) if *existing != extra => {
            existing.push_str("; ");
            existing.push_str(&extra);
        }
        (slot @ None, Some(extra)) => *slot = Some(extra),
        _ => {}
    }
}

/// Apply normalized spans to `original` by splicing right to left.
pub fn apply_spans(original: &str, spans: &[CorrectionSpan]) -> String {
    let mut out = original.to_string();
    for span in normalize(spans).iter().rev() {
        if span.end_index <= out.len()
            && out.is_char_boundary(span.start_index)
            && out.is_char_boundary(span.end_index)
        {
            out.replace_range(span.start_index..span.end_index, &span.correction_text);
        }
    }
    out
}

/// Lookup of normalized spans by original-text range, for decorating diff segments.
#[derive(Debug, Clone, Default)]
pub struct SpanIndex {
    spans: Vec<CorrectionSpan>,
}

impl SpanIndex {
    pub fn new(spans: &[CorrectionSpan]) -> Self {
        Self {
            spans: normalize(spans),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// First span overlapping the original byte range `[start, end)`.
    pub fn lookup(&self, start: usize, end: usize) -> Option<&CorrectionSpan> {
        self.spans.iter().find(|s| s.overlaps(start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ranges(spans: &[CorrectionSpan]) -> Vec<(usize, usize)> {
        spans.iter().map(|s| (s.start_index, s.end_index)).collect()
    }

    #[test]
    fn merges_overlapping_spans() {
        let spans = vec![
            CorrectionSpan::new(20, 25, "e"),
            CorrectionSpan::new(0, 5, "a"),
            CorrectionSpan::new(4, 9, "b"),
        ];
        let out = normalize(&spans);
        assert_eq!(ranges(&out), vec![(0, 9), (20, 25)]);
        assert_eq!(out[0].correction_text, "a / b");
    }

    #[test]
    fn touching_spans_merge_without_separator() {
        let spans = vec![
            CorrectionSpan::new(0, 5, "There"),
            CorrectionSpan::new(5, 6, ","),
        ];
        let out = normalize(&spans);
        assert_eq!(ranges(&out), vec![(0, 6)]);
        assert_eq!(out[0].correction_text, "There,");
    }

    #[test]
    fn merge_keeps_first_specific_type_and_joins_explanations() {
        let spans = vec![
            CorrectionSpan::new(0, 4, "x").with_explanation("first"),
            CorrectionSpan::new(2, 6, "y")
                .with_kind(CorrectionType::Grammar)
                .with_explanation("second"),
        ];
        let out = normalize(&spans);
        assert_eq!(out[0].kind, CorrectionType::Grammar);
        assert_eq!(out[0].explanation.as_deref(), Some("first; second"));
    }

    #[test]
    fn empty_input_is_empty() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn validate_drops_bad_offsets() {
        let text = "héllo";
        let spans = vec![
            CorrectionSpan::new(0, 1, "H"),
            CorrectionSpan::new(2, 3, "e"),
            CorrectionSpan::new(3, 3, "x"),
            CorrectionSpan::new(4, 99, "x"),
        ];
        assert_eq!(ranges(&validate_spans(text, spans)), vec![(0, 1)]);
    }

    #[test]
    fn utf16_offsets_map_to_bytes() {
        let text = "Café 😀 teh end";
        let spans = vec![
            CorrectionSpan::new(8, 11, "the"),
            // Lands between the surrogates of the emoji
            CorrectionSpan::new(6, 8, "x"),
        ];
        let converted = validate_spans(text, to_byte_offsets(text, spans, OffsetUnit::Utf16));
        assert_eq!(ranges(&converted), vec![(11, 14)]);
        assert_eq!(apply_spans(text, &converted), "Café 😀 the end");

        let bytes = vec![CorrectionSpan::new(11, 14, "the")];
        assert_eq!(to_byte_offsets(text, bytes.clone(), OffsetUnit::Utf8), bytes);
    }

    #[test]
    fn apply_spans_splices_corrections() {
        let text = "Their are two erors";
        let spans = vec![
            CorrectionSpan::new(14, 19, "errors"),
            CorrectionSpan::new(0, 5, "There"),
        ];
        assert_eq!(apply_spans(text, &spans), "There are two errors");
    }

    #[test]
    fn parses_service_json() {
        let json = r#"{"startIndex": 0, "endIndex": 5, "correction": "There", "type": "Missing Words"}"#;
        let span: CorrectionSpan = serde_json::from_str(json).unwrap();
        assert_eq!(span.kind, CorrectionType::MissingWords);
        assert_eq!(span.correction_text, "There");
        assert!(span.explanation.is_none());
    }

    #[test]
    fn unknown_type_is_other() {
        assert_eq!(CorrectionType::parse("style"), CorrectionType::Other);
        assert_eq!(CorrectionType::parse("CAPS"), CorrectionType::Capitalization);
    }

    #[test]
    fn index_finds_overlapping_span() {
        let index = SpanIndex::new(&[CorrectionSpan::new(14, 19, "errors")
            .with_kind(CorrectionType::Spelling)]);
        assert_eq!(
            index.lookup(14, 19).map(|s| s.kind),
            Some(CorrectionType::Spelling)
        );
        assert!(index.lookup(0, 5).is_none());
        assert!(index.lookup(19, 19).is_some());
    }

    fn arb_spans() -> impl Strategy<Value = Vec<CorrectionSpan>> {
        prop::collection::vec((0usize..60, 1usize..12, "[a-z]{0,3}"), 0..12).prop_map(|raw| {
            raw.into_iter()
                .map(|(start, len, text)| CorrectionSpan::new(start, start + len, text))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(spans in arb_spans()) {
            let once = normalize(&spans);
            let twice = normalize(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn output_is_sorted_and_disjoint(spans in arb_spans()) {
            let out = normalize(&spans);
            for pair in out.windows(2) {
                prop_assert!(pair[0].end_index < pair[1].start_index);
            }
            for s in &out {
                prop_assert!(s.start_index < s.end_index);
            }
        }
    }
}
