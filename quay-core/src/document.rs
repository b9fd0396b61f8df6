//! Document tree for Quayfile configuration
//!
//! This module defines the editable document model: a `Document` owns an
//! ordered list of site blocks (plus an optional global options block), a
//! `SiteBlock` owns an ordered list of directives, and a `Directive` may
//! own a nested directive body of its own.
//!
//! Ids are synthetic and process-local. Re-parsing the same text assigns
//! fresh ids, so callers that need identity across edits must key on a
//! block's tag or its structural position instead.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Reserved directive name that tags a block for external addressing.
///
/// When it appears as the first line of a site block the parser lifts it
/// into [`SiteBlock::tag`]; inside a handler body the container model lifts
/// it into a service tag.
pub const TAG_MARKER: &str = "@id";

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate the next synthetic id.
///
/// Ids are unique within the process only; they carry no meaning across
/// re-parses of edited text.
pub fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// One parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Directives of the leading brace block with no address list, if any.
    pub global_options: Vec<Directive>,

    /// Site blocks in source order.
    pub site_blocks: Vec<SiteBlock>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a site block by its explicit tag.
    pub fn site_block_by_tag(&self, tag: &str) -> Option<&SiteBlock> {
        self.site_blocks.iter().find(|b| b.tag.as_deref() == Some(tag))
    }

    /// Remove a site block by synthetic id, returning it if present.
    pub fn remove_site_block(&mut self, id: u64) -> Option<SiteBlock> {
        let idx = self.site_blocks.iter().position(|b| b.id == id)?;
        Some(self.site_blocks.remove(idx))
    }
}

/// A top-level block binding one or more addresses to a directive list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteBlock {
    /// Synthetic, process-local id.
    pub id: u64,

    /// Comma-separated bind patterns from the block header, split and
    /// trimmed: hostnames, wildcard hostnames, host:port pairs, bare ports.
    pub addresses: Vec<String>,

    /// Body directives in source order. All addresses share this one list.
    pub directives: Vec<Directive>,

    /// Stable identifier from a leading tag directive, if present.
    /// Serialized back as the first line of the body.
    pub tag: Option<String>,
}

impl SiteBlock {
    pub fn new(addresses: Vec<String>) -> Self {
        Self {
            id: next_id(),
            addresses,
            directives: Vec::new(),
            tag: None,
        }
    }

    pub fn with_directives(mut self, directives: Vec<Directive>) -> Self {
        self.directives = directives;
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }
}

/// One configuration statement: a name, its arguments, and an optional
/// nested body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Directive {
    /// Synthetic, process-local id.
    pub id: u64,

    /// Directive name. A leading `@` marks a named matcher rather than an
    /// action.
    pub name: String,

    /// Arguments following the name, unquoted and unescaped.
    pub args: Vec<String>,

    /// Nested brace body, when the directive carries one. The type is
    /// genuinely recursive; nothing limits the depth.
    pub block: Option<Vec<Directive>>,

    /// Verbatim source span, present while the directive is unedited. The
    /// serializer prefers this over re-deriving text so that spacing,
    /// quoting, and inline comments survive a round trip. Structural edits
    /// through the `edit_*` helpers clear it.
    pub raw_text: Option<String>,
}

impl Directive {
    /// A fresh directive with no source backing; the serializer will derive
    /// its text from `name` and `args`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            name: name.into(),
            args: Vec::new(),
            block: None,
            raw_text: None,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_block(mut self, block: Vec<Directive>) -> Self {
        self.block = Some(block);
        self
    }

    /// True when the name denotes a named matcher.
    pub fn is_matcher(&self) -> bool {
        self.name.starts_with('@')
    }

    /// Rename the directive, dropping its verbatim source text.
    pub fn edit_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.raw_text = None;
    }

    /// Replace the argument list, dropping the verbatim source text.
    pub fn edit_args(&mut self, args: Vec<String>) {
        self.args = args;
        self.raw_text = None;
    }

    /// Mutable access to the nested body (created if absent). Counts as a
    /// structural edit, so the verbatim source text is dropped.
    pub fn edit_block(&mut self) -> &mut Vec<Directive> {
        self.raw_text = None;
        self.block.get_or_insert_with(Vec::new)
    }
}
