//! Container and service view types
//!
//! A wildcard site block that routes through named host matchers and
//! mutually-exclusive `handle` blocks can be read as a *container*: one
//! shared policy plus a set of named sub-services. These are the derived
//! types for that view; the decomposition and recomposition live in the
//! engine crate. A container is never stored, only the raw text is.

use crate::document::{next_id, Directive};
use serde::{Deserialize, Serialize};

/// Derived view of a wildcard site block: shared configuration plus the
/// named services carved out of its handler blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    /// Synthetic, process-local id.
    pub id: u64,

    /// The wildcard bind pattern the services hang off of.
    pub wildcard_address: String,

    /// Directives shared by every service. Never includes matcher or
    /// `handle` directives.
    pub shared_config: Vec<Directive>,

    /// Services in source order.
    pub services: Vec<Service>,
}

impl Container {
    pub fn new(wildcard_address: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            wildcard_address: wildcard_address.into(),
            shared_config: Vec::new(),
            services: Vec::new(),
        }
    }

    /// Find a service by matcher name.
    pub fn service(&self, matcher_name: &str) -> Option<&Service> {
        self.services.iter().find(|s| s.matcher_name == matcher_name)
    }
}

/// One named matcher and its handler body inside a container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Synthetic, process-local id.
    pub id: u64,

    /// Matcher name without the `@` prefix.
    pub matcher_name: String,

    /// Hostname the matcher selects. Empty when the handler references a
    /// matcher that was never defined.
    pub hostname: String,

    /// Service-local tag lifted from a leading tag directive in the
    /// handler body, if present.
    pub tag: Option<String>,

    /// Handler body in source order, minus the tag directive.
    pub directives: Vec<Directive>,
}

impl Service {
    pub fn new(matcher_name: impl Into<String>, hostname: impl Into<String>) -> Self {
        Self {
            id: next_id(),
            matcher_name: matcher_name.into(),
            hostname: hostname.into(),
            tag: None,
            directives: Vec::new(),
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
