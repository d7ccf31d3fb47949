//! Token-level alignment via longest common subsequence.
//!
//! `dp[i][j]` holds the LCS length of the suffixes `original[i..]` and
//! `corrected[j..]`. The table is filled from the bottom-right corner and
//! the script is read forward from `(0, 0)`. On a tie between dropping the
//! original token and taking the corrected one, the original token is
//! deleted first, so a substitution always reads as delete-then-insert.
//!
//! Cost is O(n·m) in time and memory. Callers align single text blocks,
//! never whole documents.

use crate::text::tokenizer::Token;

/// Kind of an [`EditOp`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditKind {
    Equal,
    Insert,
    Delete,
    Replace,
}

/// One coalesced run of the edit script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Equal(String),
    Insert(String),
    Delete(String),
    /// A delete run immediately followed by an insert run
    Replace { original: String, corrected: String },
}

impl EditOp {
    pub fn kind(&self) -> EditKind {
        match self {
            EditOp::Equal(_) => EditKind::Equal,
            EditOp::Insert(_) => EditKind::Insert,
            EditOp::Delete(_) => EditKind::Delete,
            EditOp::Replace { .. } => EditKind::Replace,
        }
    }

    /// Text this op consumes from the original.
    pub fn original(&self) -> Option<&str> {
        match self {
            EditOp::Equal(t) | EditOp::Delete(t) => Some(t),
            EditOp::Replace { original, .. } => Some(original),
            EditOp::Insert(_) => None,
        }
    }

    /// Text this op contributes to the corrected string.
    pub fn corrected(&self) -> Option<&str> {
        match self {
            EditOp::Equal(t) | EditOp::Insert(t) => Some(t),
            EditOp::Replace { corrected, .. } => Some(corrected),
            EditOp::Delete(_) => None,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, EditOp::Equal(_))
    }
}

/// Compute the edit script turning `original` into `corrected`.
pub fn align(original: &[Token], corrected: &[Token]) -> Vec<EditOp> {
    let n = original.len();
    let m = corrected.len();

    // Degenerate inputs never touch the table
    if n == 0 && m == 0 {
        return Vec::new();
    }
    if n == 0 {
        return vec![EditOp::Insert(join(corrected))];
    }
    if m == 0 {
        return vec![EditOp::Delete(join(original))];
    }

    let width = m + 1;
    let mut dp = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            dp[i * width + j] = if original[i].text == corrected[j].text {
                dp[(i + 1) * width + j + 1] + 1
            } else {
                dp[(i + 1) * width + j].max(dp[i * width + j + 1])
            };
        }
    }

    let mut builder = ScriptBuilder::default();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if original[i].text == corrected[j].text {
            builder.push(EditKind::Equal, &original[i].text);
            i += 1;
            j += 1;
        } else if dp[(i + 1) * width + j] >= dp[i * width + j + 1] {
            builder.push(EditKind::Delete, &original[i].text);
            i += 1;
        } else {
            builder.push(EditKind::Insert, &corrected[j].text);
            j += 1;
        }
    }
    for token in &original[i..] {
        builder.push(EditKind::Delete, &token.text);
    }
    for token in &corrected[j..] {
        builder.push(EditKind::Insert, &token.text);
    }
    builder.finish()
}

/// Does the script change anything?
pub fn has_changes(ops: &[EditOp]) -> bool {
    ops.iter().any(|op| !op.is_equal())
}

fn join(tokens: &[Token]) -> String {
    tokens.iter().map(|t| t.text.as_str()).collect()
}

/// Coalesces per-token steps into runs and pairs delete→insert into replace.
#[derive(Default)]
struct ScriptBuilder {
    ops: Vec<EditOp>,
    run: Option<(EditKind, String)>,
}

impl ScriptBuilder {
    fn push(&mut self, kind: EditKind, text: &str) {
        match &mut self.run {
            Some((k, buf)) if *k == kind => buf.push_str(text),
            _ => {
                self.flush();
                self.run = Some((kind, text.to_string()));
            }
        }
    }

    fn flush(&mut self) {
        let Some((kind, text)) = self.run.take() else {
            return;
        };
        let op = match kind {
            EditKind::Equal => EditOp::Equal(text),
            EditKind::Delete => EditOp::Delete(text),
            EditKind::Insert => match self.ops.pop() {
                Some(EditOp::Delete(original)) => EditOp::Replace {
                    original,
                    corrected: text,
                },
                Some(prev) => {
                    self.ops.push(prev);
                    EditOp::Insert(text)
                }
                None => EditOp::Insert(text),
            },
            EditKind::Replace => unreachable!("replace runs are synthesized, never pushed"),
        };
        self.ops.push(op);
    }

    fn finish(mut self) -> Vec<EditOp> {
        self.flush();
        self.ops
    }
}
