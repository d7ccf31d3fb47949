//! Word / punctuation / whitespace tokenizer.
//!
//! Tokens are the atomic units of the diff. Concatenating the token texts
//! always reproduces the input exactly.

/// Kind of a diff token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Letters/digits/underscore, with internal apostrophes (`don't`)
    Word,
    /// A run of characters that are neither word nor whitespace
    Punctuation,
    /// A run of whitespace
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Whitespace
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_apostrophe(c: char) -> bool {
    matches!(c, '\'' | '\u{2019}')
}

fn classify(c: char) -> TokenKind {
    if is_word_char(c) {
        TokenKind::Word
    } else if c.is_whitespace() {
        TokenKind::Whitespace
    } else {
        TokenKind::Punctuation
    }
}

/// Split `text` into maximal word, punctuation and whitespace runs.
pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut start = 0;
    let mut current: Option<TokenKind> = None;

    while let Some((idx, c)) = chars.next() {
        let mut kind = classify(c);

        // An apostrophe between two word characters stays inside the word
        if current == Some(TokenKind::Word) && is_apostrophe(c) {
            if let Some(&(_, next)) = chars.peek() {
                if is_word_char(next) {
                    kind = TokenKind::Word;
                }
            }
        }

        match current {
            Some(k) if k == kind => {}
            Some(k) => {
                tokens.push(Token::new(k, &text[start..idx]));
                start = idx;
                current = Some(kind);
            }
            None => {
                start = idx;
                current = Some(kind);
            }
        }
    }

    if let Some(k) = current {
        tokens.push(Token::new(k, &text[start..]));
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn splits_words_punctuation_and_spaces() {
        let tokens = tokenize("Hello, world!  Bye...");
        assert_eq!(
            texts(&tokens),
            vec!["Hello", ",", " ", "world", "!", "  ", "Bye", "..."]
        );
        assert_eq!(tokens[1].kind, TokenKind::Punctuation);
        assert_eq!(tokens[5].kind, TokenKind::Whitespace);
    }

    #[test]
    fn keeps_internal_apostrophes() {
        let tokens = tokenize("don't 'quote' it’s");
        assert_eq!(
            texts(&tokens),
            vec!["don't", " ", "'", "quote", "'", " ", "it’s"]
        );
    }

    #[test]
    fn trailing_apostrophe_is_punctuation() {
        assert_eq!(texts(&tokenize("dogs' bowls")), vec!["dogs", "'", " ", "bowls"]);
    }

    #[test]
    fn empty_input_yields_no_tokens() {
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn unicode_words() {
        assert_eq!(texts(&tokenize("naïve café")), vec!["naïve", " ", "café"]);
    }

    proptest! {
        #[test]
        fn concatenation_reproduces_input(s in "\\PC*") {
            let joined: String = tokenize(&s).iter().map(|t| t.text.as_str()).collect();
            prop_assert_eq!(joined, s);
        }

        #[test]
        fn adjacent_tokens_differ_in_kind(s in "[a-z' ,.!\n]{0,40}") {
            let tokens = tokenize(&s);
            for pair in tokens.windows(2) {
                prop_assert_ne!(pair[0].kind, pair[1].kind);
            }
        }
    }
}
