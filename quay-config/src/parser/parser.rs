//! Quayfile block parser
//!
//! Line-oriented recursive descent over the token stream. Builds the
//! `Document` tree: an optional global options block, then site blocks,
//! each holding directives that may carry one nested brace body (the type
//! recurses, so deeper nesting parses too).
//!
//! Parsing is all-or-nothing. On malformed input the typed error carries
//! the offending line and byte span and no partial document escapes, so an
//! editor reparsing on every keystroke can keep its last good tree.

use crate::parser::lexer::{tokenize, Location, Spanned, Token};
use quay_core::document::{next_id, Directive, Document, SiteBlock, TAG_MARKER};
use thiserror::Error;

/// Parser error types
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unmatched '}}' at line {line}")]
    UnmatchedClose { line: usize, span: Location },

    #[error("unclosed block opened at line {line}")]
    UnclosedBlock { line: usize, span: Location },

    #[error("site address list at line {line} is missing its opening '{{'")]
    MissingBlockOpen { line: usize, span: Location },

    #[error("expected {expected} at line {line}, found {found}")]
    Unexpected {
        line: usize,
        expected: String,
        found: String,
        span: Location,
    },
}

impl ParseError {
    /// Byte span of the offending source region, for diagnostics.
    pub fn span(&self) -> Location {
        match self {
            ParseError::UnmatchedClose { span, .. }
            | ParseError::UnclosedBlock { span, .. }
            | ParseError::MissingBlockOpen { span, .. }
            | ParseError::Unexpected { span, .. } => *span,
        }
    }

    /// 1-based line number of the offending source region.
    pub fn line(&self) -> usize {
        match self {
            ParseError::UnmatchedClose { line, .. }
            | ParseError::UnclosedBlock { line, .. }
            | ParseError::MissingBlockOpen { line, .. }
            | ParseError::Unexpected { line, .. } => *line,
        }
    }
}

type ParseResult<T> = Result<T, ParseError>;

/// Parser state
pub struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Spanned<Token>>,
    pos: usize,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            tokens: tokenize(source),
            pos: 0,
        }
    }

    /// Parse the entire Quayfile into a `Document`.
    pub fn parse(&mut self) -> ParseResult<Document> {
        let mut doc = Document::new();

        self.skip_blank();

        // A leading lone `{` with no preceding address list opens the
        // global options block.
        if matches!(self.peek(), Some(Token::OpenBrace)) {
            let open = self.current_span();
            self.advance();
            let (directives, _) = self.parse_block_body(open)?;
            doc.global_options = directives;
        }

        loop {
            self.skip_blank();
            if self.is_eof() {
                break;
            }
            doc.site_blocks.push(self.parse_site_block()?);
        }

        tracing::debug!(
            site_blocks = doc.site_blocks.len(),
            global_options = doc.global_options.len(),
            "parsed document"
        );
        Ok(doc)
    }

    // ========================================
    // Site blocks
    // ========================================

    fn parse_site_block(&mut self) -> ParseResult<SiteBlock> {
        let header = self.current_span();
        let mut parts: Vec<String> = Vec::new();

        // Address tokens up to the opening brace, all on one line.
        let open = loop {
            match self.peek() {
                Some(Token::Word(w)) => {
                    parts.push(w.clone());
                    self.advance();
                }
                Some(Token::QuotedString(s)) => {
                    parts.push(s.clone());
                    self.advance();
                }
                Some(Token::Placeholder(p)) => {
                    parts.push(p.clone());
                    self.advance();
                }
                Some(Token::OpenBrace) => {
                    let span = self.current_span();
                    if parts.is_empty() {
                        return Err(ParseError::Unexpected {
                            line: self.line_at(span.start),
                            expected: "a site address".to_string(),
                            found: "'{'".to_string(),
                            span,
                        });
                    }
                    self.advance();
                    break span;
                }
                Some(Token::CloseBrace) => {
                    let span = self.current_span();
                    return Err(ParseError::UnmatchedClose {
                        line: self.line_at(span.start),
                        span,
                    });
                }
                Some(Token::Newline) | Some(Token::Comment(_)) | None => {
                    return Err(ParseError::MissingBlockOpen {
                        line: self.line_at(header.start),
                        span: header,
                    });
                }
                Some(Token::Whitespace) => unreachable!("whitespace is skipped by the lexer"),
            }
        };

        let addresses = split_addresses(&parts);
        let (mut directives, _) = self.parse_block_body(open)?;

        // The reserved tag directive on the first line belongs to the
        // block, not the directive list.
        let tag = if directives
            .first()
            .is_some_and(|d| d.name == TAG_MARKER && !d.args.is_empty())
        {
            let mut marker = directives.remove(0);
            Some(marker.args.remove(0))
        } else {
            None
        };

        Ok(SiteBlock {
            id: next_id(),
            addresses,
            directives,
            tag,
        })
    }

    // ========================================
    // Directives
    // ========================================

    /// Parse directives until the `}` matching `open`. Returns the
    /// directives and the span of the closing brace.
    fn parse_block_body(&mut self, open: Location) -> ParseResult<(Vec<Directive>, Location)> {
        let mut directives = Vec::new();

        loop {
            self.skip_blank();
            match self.peek() {
                None => {
                    return Err(ParseError::UnclosedBlock {
                        line: self.line_at(open.start),
                        span: open,
                    });
                }
                Some(Token::CloseBrace) => {
                    let close = self.current_span();
                    self.advance();
                    return Ok((directives, close));
                }
                _ => directives.push(self.parse_directive()?),
            }
        }
    }

    fn parse_directive(&mut self) -> ParseResult<Directive> {
        let start = self.current_span();
        let name = match self.peek() {
            Some(Token::Word(w)) => w.clone(),
            Some(Token::QuotedString(s)) => s.clone(),
            Some(Token::Placeholder(p)) => p.clone(),
            other => {
                return Err(ParseError::Unexpected {
                    line: self.line_at(start.start),
                    expected: "a directive name".to_string(),
                    found: describe(other),
                    span: start,
                });
            }
        };
        self.advance();

        let mut args = Vec::new();
        let mut block = None;
        let mut end = start.end;

        loop {
            match self.peek() {
                Some(Token::Word(w)) => {
                    args.push(w.clone());
                    end = self.current_span().end;
                    self.advance();
                }
                Some(Token::QuotedString(s)) => {
                    args.push(s.clone());
                    end = self.current_span().end;
                    self.advance();
                }
                Some(Token::Placeholder(p)) => {
                    args.push(p.clone());
                    end = self.current_span().end;
                    self.advance();
                }
                Some(Token::Comment(_)) => {
                    // Inline comment: not an argument, but part of the
                    // directive's verbatim span.
                    end = self.current_span().end;
                    self.advance();
                }
                Some(Token::OpenBrace) => {
                    let open = self.current_span();
                    self.advance();
                    let (body, close) = self.parse_block_body(open)?;
                    block = Some(body);
                    end = close.end;
                    break;
                }
                Some(Token::Newline) | Some(Token::CloseBrace) | None => break,
                Some(Token::Whitespace) => unreachable!("whitespace is skipped by the lexer"),
            }
        }

        let raw_text = self.source[start.start..end].to_string();
        Ok(Directive {
            id: next_id(),
            name,
            args,
            block,
            raw_text: Some(raw_text),
        })
    }

    // ========================================
    // Token utilities
    // ========================================

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.value)
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    /// Skip newlines and full-line comments between directives.
    fn skip_blank(&mut self) {
        while matches!(self.peek(), Some(Token::Newline) | Some(Token::Comment(_))) {
            self.advance();
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_span(&self) -> Location {
        self.tokens.get(self.pos).map(|s| s.span).unwrap_or(Location {
            start: self.source.len(),
            end: self.source.len(),
        })
    }

    fn line_at(&self, offset: usize) -> usize {
        self.source[..offset.min(self.source.len())]
            .bytes()
            .filter(|b| *b == b'\n')
            .count()
            + 1
    }
}

fn describe(token: Option<&Token>) -> String {
    match token {
        Some(t) => format!("'{}'", t),
        None => "end of input".to_string(),
    }
}

/// Split header tokens into trimmed, comma-separated addresses.
fn split_addresses(parts: &[String]) -> Vec<String> {
    parts
        .join(" ")
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parse a Quayfile source string into a `Document`.
pub fn parse(source: &str) -> Result<Document, ParseError> {
    let mut parser = Parser::new(source);
    parser.parse()
}
