//! Lexical analysis: splitting a line into segments and a segment into tokens.
//!
//! Words are whitespace-delimited. An operator character glued to a word
//! (`cmd>file`, `a|b`) is pulled out into a token of its own so later passes
//! can reason token by token instead of character by character.

use std::fmt;

/// An operator that separates words inside a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// The pipe operator, `|`.
    Pipe,
    /// Input redirection symbol, `<`.
    RedirectIn,
    /// Output redirection symbol, `>`.
    RedirectOut,
}

impl Operator {
    /// Extraction order used by [`tokenize`].
    pub const ALL: [Operator; 3] = [Operator::Pipe, Operator::RedirectOut, Operator::RedirectIn];

    pub fn as_char(self) -> char {
        match self {
            Operator::Pipe => '|',
            Operator::RedirectIn => '<',
            Operator::RedirectOut => '>',
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Represents a token resulting from lexical analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Plain text; a program name, an argument or a redirect target.
    Word(String),
    /// A standalone operator.
    Op(Operator),
}

impl Token {
    pub fn word(s: impl Into<String>) -> Self {
        Token::Word(s.into())
    }

    pub fn is_op(&self, op: Operator) -> bool {
        matches!(self, Token::Op(o) if *o == op)
    }
}

/// Character that separates concurrently launched segments.
pub const SEGMENT_SEPARATOR: char = '&';

/// Split a command line on `&` into trimmed, non-empty segments.
pub fn split_segments(line: &str) -> Vec<&str> {
    line.split(SEGMENT_SEPARATOR)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split a segment into whitespace-delimited words without looking at operators.
pub fn split_words(segment: &str) -> Vec<Token> {
    segment.split_whitespace().map(Token::word).collect()
}

/// Pull the first occurrence of `op` out of the word that contains it.
///
/// The first word containing `op`'s character is split at every occurrence of
/// that character. Empty fragments are dropped; the non-empty ones are spliced
/// back at the word's position with an operator token standing in for each
/// occurrence, so a word consisting only of the operator becomes exactly one
/// operator token.
///
/// # Returns
/// The index of the first spliced token, or `None` when no word contains `op`.
/// That token is an operator when the word starts with `op` (`|wc` yields
/// `[Op(Pipe), Word("wc")]` at the returned index).
pub fn extract_operator(tokens: &mut Vec<Token>, op: Operator) -> Option<usize> {
    let ch = op.as_char();
    let index = tokens
        .iter()
        .position(|t| matches!(t, Token::Word(w) if w.contains(ch)))?;

    let Token::Word(word) = tokens.remove(index) else {
        unreachable!("position() only matches words");
    };

    let mut spliced = Vec::new();
    for (n, fragment) in word.split(ch).enumerate() {
        if n > 0 {
            spliced.push(Token::Op(op));
        }
        if !fragment.is_empty() {
            spliced.push(Token::word(fragment));
        }
    }
    tokens.splice(index..index, spliced);
    Some(index)
}

/// Tokenize a segment, extracting every fused `|`, `>` and `<`.
pub fn tokenize(segment: &str) -> Vec<Token> {
    let mut tokens = split_words(segment);
    for op in Operator::ALL {
        while extract_operator(&mut tokens, op).is_some() {}
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(s: &str) -> Token {
        Token::word(s)
    }

    #[test]
    fn test_split_segments_drops_empty() {
        assert_eq!(split_segments("sleep 1 & sleep 2"), vec!["sleep 1", "sleep 2"]);
        assert_eq!(split_segments(" & ls &&  "), vec!["ls"]);
        assert!(split_segments("   ").is_empty());
    }

    #[test]
    fn test_extract_fused_redirect() {
        let mut tokens = split_words("echo hi>out.txt");
        let idx = extract_operator(&mut tokens, Operator::RedirectOut);
        assert_eq!(idx, Some(1));
        assert_eq!(
            tokens,
            vec![w("echo"), w("hi"), Token::Op(Operator::RedirectOut), w("out.txt")]
        );
    }

    #[test]
    fn test_extract_not_found() {
        let mut tokens = split_words("ls -la");
        assert_eq!(extract_operator(&mut tokens, Operator::Pipe), None);
        assert_eq!(tokens, vec![w("ls"), w("-la")]);
    }

    #[test]
    fn test_isolated_operator_survives() {
        let mut tokens = split_words("ls | wc");
        assert_eq!(extract_operator(&mut tokens, Operator::Pipe), Some(1));
        assert_eq!(tokens, vec![w("ls"), Token::Op(Operator::Pipe), w("wc")]);
        // Already extracted; nothing left to find.
        assert_eq!(extract_operator(&mut tokens, Operator::Pipe), None);
    }

    #[test]
    fn test_leading_and_trailing_fragments() {
        let mut tokens = split_words("ls |wc");
        assert_eq!(extract_operator(&mut tokens, Operator::Pipe), Some(1));
        assert_eq!(tokens[1..], [Token::Op(Operator::Pipe), w("wc")]);

        let mut tokens = split_words("ls|");
        extract_operator(&mut tokens, Operator::Pipe);
        assert_eq!(tokens, vec![w("ls"), Token::Op(Operator::Pipe)]);
    }

    #[test]
    fn test_double_pipe_in_one_word() {
        let mut tokens = split_words("ls||wc");
        extract_operator(&mut tokens, Operator::Pipe);
        assert_eq!(
            tokens,
            vec![w("ls"), Token::Op(Operator::Pipe), Token::Op(Operator::Pipe), w("wc")]
        );
    }

    #[test]
    fn test_tokenize_mixed() {
        let tokens = tokenize("sort<in.txt|uniq -c>out.txt");
        assert_eq!(
            tokens,
            vec![
                w("sort"),
                Token::Op(Operator::RedirectIn),
                w("in.txt"),
                Token::Op(Operator::Pipe),
                w("uniq"),
                w("-c"),
                Token::Op(Operator::RedirectOut),
                w("out.txt"),
            ]
        );
    }

    #[test]
    fn test_tokenize_keeps_equals_in_words() {
        let tokens = tokenize("ls --color=auto");
        assert_eq!(tokens, vec![w("ls"), w("--color=auto")]);
    }
}
