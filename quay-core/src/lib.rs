//! Core document model for Quay
//!
//! A Quayfile is a Caddyfile-style, brace-delimited site configuration.
//! This crate holds the owned document tree that the engine crates parse
//! into and serialize from, the error taxonomy, and the seams toward the
//! collaborators that persist a Quayfile or push it to a running server.

pub mod container;
pub mod document;
pub mod error;
pub mod store;

pub use container::{Container, Service};
pub use document::{Directive, Document, SiteBlock, TAG_MARKER};
pub use error::{Error, PushError, Result};
pub use store::{AdminGateway, ConfigStore, FileStore};
