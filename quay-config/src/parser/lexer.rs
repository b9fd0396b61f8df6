//! Lexer for Quayfiles (Caddyfile syntax)
//!
//! Tokenizes the brace-delimited site configuration language.
//!
//! Key features:
//! - Whitespace sensitive (newlines terminate directive lines)
//! - Directives are just Words
//! - { } for blocks, {token} for substitution placeholders
//! - "..." and '...' for quoted strings
//! - # for comments, emitted as tokens so partial input stays lexable
//!
//! The lexer is deliberately lenient: anything it cannot classify (an
//! unterminated quote, say) degrades to a `Word` over the offending slice
//! instead of failing. Structural errors are the parser's job, which keeps
//! this layer usable on incomplete editor input.

use logos::{Logos, Span};
use std::fmt;

/// Source location as a byte range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub start: usize,
    pub end: usize,
}

impl From<Span> for Location {
    fn from(span: Span) -> Self {
        Self {
            start: span.start,
            end: span.end,
        }
    }
}

/// A token with its location in the source
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Location,
}

impl<T> Spanned<T> {
    pub fn new(value: T, span: impl Into<Location>) -> Self {
        Self {
            value,
            span: span.into(),
        }
    }
}

/// Token types for the Quayfile syntax
#[derive(Logos, Debug, Clone, PartialEq)]
pub enum Token {
    // Spaces and tabs separate tokens but are never emitted.
    #[regex(r"[ \t\f]+", logos::skip)]
    Whitespace,

    /// Comment from `#` to end of line, newline not included. Emitted
    /// rather than skipped: the parser drops full-line comments, and inline
    /// comments survive inside a directive's verbatim source span.
    #[regex(r"#[^\n]*", |lex| lex.slice().to_string())]
    Comment(String),

    // ============================================================
    // Structural
    // ============================================================
    #[token("{")]
    OpenBrace,

    #[token("}")]
    CloseBrace,

    #[regex(r"\r?\n")]
    Newline,

    // ============================================================
    // Values
    // ============================================================
    /// Quoted string literal, double- or single-quoted, with backslash
    /// escapes. The payload is the unescaped content.
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len()-1])
    })]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| {
        let s = lex.slice();
        unescape_string(&s[1..s.len()-1])
    })]
    QuotedString(String),

    /// Substitution placeholder such as `{host}` or `{$PORT}`.
    ///
    /// Distinguished from a block brace by context: a brace run with no
    /// internal whitespace closes on the same line, so longest-match lexing
    /// picks the placeholder; a lone `{` stays a block delimiter. The
    /// payload keeps the braces so the text round-trips unchanged.
    #[regex(r"\{[^ \t\r\n{}]+\}", |lex| lex.slice().to_string())]
    Placeholder(String),

    /// Generic word: unquoted arguments, numbers, addresses, paths. The
    /// lexer needs no numeric semantics; `:8080` and `10.0.0.1` are words.
    #[regex(r#"[^ \t\r\n\f{}#"']+"#, |lex| lex.slice().to_string())]
    Word(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::OpenBrace => write!(f, "{{"),
            Token::CloseBrace => write!(f, "}}"),
            Token::Newline => write!(f, "\\n"),
            Token::Comment(s) => write!(f, "{}", s),
            Token::QuotedString(s) => write!(f, "\"{}\"", s),
            Token::Placeholder(s) => write!(f, "{}", s),
            Token::Word(s) => write!(f, "{}", s),
            Token::Whitespace => write!(f, " "),
        }
    }
}

/// Unescape a quoted string body
fn unescape_string(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => result.push('\n'),
                Some('r') => result.push('\r'),
                Some('t') => result.push('\t'),
                Some('\\') => result.push('\\'),
                Some('"') => result.push('"'),
                Some('\'') => result.push('\''),
                Some(c) => {
                    result.push('\\');
                    result.push(c);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Tokenize a Quayfile source string.
///
/// Never fails: slices logos cannot match are handed to the parser as
/// `Word` tokens, so incomplete constructs surface as structural errors
/// with positions instead of lexer failures.
pub fn tokenize(source: &str) -> Vec<Spanned<Token>> {
    let mut tokens = Vec::new();

    for (result, span) in Token::lexer(source).spanned() {
        match result {
            Ok(Token::Whitespace) => continue,
            Ok(token) => tokens.push(Spanned::new(token, span.clone())),
            Err(()) => {
                let slice = source[span.clone()].to_string();
                tokens.push(Spanned::new(Token::Word(slice), span.clone()));
            }
        }
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(source: &str) -> Vec<Token> {
        tokenize(source).into_iter().map(|s| s.value).collect()
    }

    #[test]
    fn test_basic_directive() {
        let tokens = values("reverse_proxy localhost:8080");
        assert_eq!(tokens[0], Token::Word("reverse_proxy".to_string()));
        assert_eq!(tokens[1], Token::Word("localhost:8080".to_string()));
    }

    #[test]
    fn test_block() {
        let tokens = values("example.com {\n  root *\n}");
        assert_eq!(
            tokens,
            vec![
                Token::Word("example.com".to_string()),
                Token::OpenBrace,
                Token::Newline,
                Token::Word("root".to_string()),
                Token::Word("*".to_string()),
                Token::Newline,
                Token::CloseBrace,
            ]
        );
    }

    #[test]
    fn test_quotes_and_comments() {
        let source = "# header\nroot \"/var/www/my site\" # inline\n";
        let tokens = values(source);
        assert_eq!(tokens[0], Token::Comment("# header".to_string()));
        assert_eq!(tokens[2], Token::Word("root".to_string()));
        assert_eq!(
            tokens[3],
            Token::QuotedString("/var/www/my site".to_string())
        );
        assert_eq!(tokens[4], Token::Comment("# inline".to_string()));
    }

    #[test]
    fn test_single_quotes_and_escapes() {
        let tokens = values(r#"respond 'hello "world"' "a\"b""#);
        assert_eq!(tokens[1], Token::QuotedString("hello \"world\"".to_string()));
        assert_eq!(tokens[2], Token::QuotedString("a\"b".to_string()));
    }

    #[test]
    fn test_placeholder_vs_block_brace() {
        let tokens = values("redir https://{host}{uri} {\n}");
        assert_eq!(tokens[0], Token::Word("redir".to_string()));
        assert_eq!(tokens[1], Token::Word("https://".to_string()));
        assert_eq!(tokens[2], Token::Placeholder("{host}".to_string()));
        assert_eq!(tokens[3], Token::Placeholder("{uri}".to_string()));
        assert_eq!(tokens[4], Token::OpenBrace);
    }

    #[test]
    fn test_env_placeholder() {
        let tokens = values("bind {$BIND_ADDR}");
        assert_eq!(tokens[1], Token::Placeholder("{$BIND_ADDR}".to_string()));
    }

    #[test]
    fn test_unterminated_quote_degrades_to_word() {
        // lenient: no panic, no error, the stray quote comes through as a
        // word the parser can point at
        let tokens = values("respond \"unterminated");
        assert_eq!(tokens[0], Token::Word("respond".to_string()));
        assert!(tokens[1..]
            .iter()
            .all(|t| matches!(t, Token::Word(_))));
    }

    #[test]
    fn test_spans_index_source() {
        let source = "a.com {\n}";
        let tokens = tokenize(source);
        let open = &tokens[1];
        assert_eq!(&source[open.span.start..open.span.end], "{");
    }
}
