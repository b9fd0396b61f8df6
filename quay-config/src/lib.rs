//! Quayfile configuration engine
//!
//! This crate turns raw Caddyfile-style configuration text into the
//! editable [`Document`](quay_core::Document) tree and back:
//!
//! - [`tokenize`]: raw text → lenient token stream
//! - [`parse`]: token stream → `Document` (all-or-nothing, typed errors)
//! - [`serialize`]: `Document` → text, preserving unedited source spans
//! - [`validate`]: cheap structural gate that runs before a parse or save
//! - [`to_container`] / [`from_container`]: the wildcard container/service
//!   view over a qualifying site block
//!
//! # Example
//!
//! ```rust,ignore
//! use quay_config::{parse, serialize};
//!
//! let doc = parse("example.com {\n\treverse_proxy localhost:8080\n}\n")?;
//! assert_eq!(serialize(&doc), "example.com {\n\treverse_proxy localhost:8080\n}\n");
//! ```

pub mod container;
pub mod parser;
pub mod serialize;
pub mod validate;

pub use container::{from_container, is_container, to_container, Decomposed, Inconsistency};
pub use parser::{parse, tokenize, Location, ParseError, Spanned, Token};
pub use serialize::serialize;
pub use validate::{validate, ValidationReport};
