//! Parser module for Quayfiles
//!
//! This module provides the lexer and block parser for the Quayfile
//! configuration language.

pub mod lexer;
pub mod parser;

pub use lexer::{tokenize, Location, Spanned, Token};
pub use parser::{parse, ParseError, Parser};
