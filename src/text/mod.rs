pub mod align;
pub mod tokenizer;

pub use align::{align, EditKind, EditOp};
pub use tokenizer::{tokenize, Token, TokenKind};
