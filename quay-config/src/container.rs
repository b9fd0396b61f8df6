//! Container/service decomposition
//!
//! A site block follows the container convention when it binds a wildcard
//! address and routes through mutually-exclusive `handle` blocks selected
//! by named host matchers:
//!
//! ```text
//! *.example.com {
//!     tls internal
//!     @api host api.example.com
//!     handle @api {
//!         reverse_proxy localhost:9000
//!     }
//!     handle {
//!         abort
//!     }
//! }
//! ```
//!
//! This module recognizes that shape, splits it into shared configuration
//! plus named services, and rebuilds an equivalent block from the split.
//! The rebuilt block is deny-by-default: a hostname matching the wildcard
//! but claimed by no service must hit a fallback `handle` that rejects it,
//! so recomposition appends one when it is missing. That synthetic
//! fallback is the one place text is regenerated rather than preserved.

use quay_core::container::{Container, Service};
use quay_core::document::{next_id, Directive, SiteBlock, TAG_MARKER};
use std::collections::HashMap;
use thiserror::Error;

/// Directive name of the mutually-exclusive handler blocks.
const HANDLE: &str = "handle";

/// Matcher property that selects by request host.
const HOST_PROPERTY: &str = "host";

/// Body of the synthetic deny-all fallback.
const DENY_DIRECTIVE: &str = "abort";

/// Non-fatal findings from a decomposition. Surfaced to the caller, never
/// returned as `Err`: the container view degrades gracefully instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Inconsistency {
    /// A `handle` references a matcher no directive defines. The service
    /// is still produced, with an empty hostname.
    #[error("handle references undefined matcher @{matcher}")]
    UndefinedMatcher { matcher: String },

    /// A tag directive appeared where a tag was already established.
    #[error("duplicate tag directive {tag:?}")]
    DuplicateTag { tag: String },
}

/// A decomposed container together with its findings.
#[derive(Debug, Clone)]
pub struct Decomposed {
    pub container: Container,
    pub findings: Vec<Inconsistency>,
}

/// True when the block follows the container convention: a wildcard
/// address plus at least one top-level `handle`, with or without matcher
/// arguments. A freshly-created container holding only the fallback
/// `handle` qualifies.
pub fn is_container(block: &SiteBlock) -> bool {
    block.addresses.iter().any(|a| a.contains('*'))
        && block.directives.iter().any(|d| d.name == HANDLE)
}

/// Decompose a qualifying site block into its container view. Returns
/// `None` for blocks that do not follow the convention.
pub fn to_container(block: &SiteBlock) -> Option<Decomposed> {
    if !is_container(block) {
        return None;
    }
    let wildcard_address = block
        .addresses
        .iter()
        .find(|a| a.contains('*'))?
        .clone();

    let mut findings = Vec::new();

    // Pass 1: host matchers feed the name -> hostname map; everything else
    // that is neither a matcher nor a handler is shared configuration.
    let mut hostnames: HashMap<&str, &str> = HashMap::new();
    let mut shared_config = Vec::new();

    for directive in &block.directives {
        if directive.name == HANDLE {
            continue;
        }
        if directive.name == TAG_MARKER {
            // a site-level tag lives on the block itself; one left in the
            // directive list is a stray
            if let Some(tag) = directive.args.first() {
                findings.push(Inconsistency::DuplicateTag { tag: tag.clone() });
            }
            continue;
        }
        if let Some(matcher) = directive.name.strip_prefix('@') {
            if directive.args.len() >= 2 && directive.args[0] == HOST_PROPERTY {
                hostnames.insert(matcher, directive.args[1].as_str());
            }
            continue;
        }
        shared_config.push(directive.clone());
    }

    // Pass 2: each handle with a single matcher reference becomes a
    // service. The zero-argument handle is the fallback, not a service.
    let mut services = Vec::new();

    for directive in &block.directives {
        if directive.name != HANDLE {
            continue;
        }
        let [arg] = directive.args.as_slice() else {
            continue;
        };
        let Some(matcher_name) = arg.strip_prefix('@') else {
            continue;
        };

        let hostname = match hostnames.get(matcher_name) {
            Some(host) => (*host).to_string(),
            None => {
                findings.push(Inconsistency::UndefinedMatcher {
                    matcher: matcher_name.to_string(),
                });
                String::new()
            }
        };

        let mut directives = directive.block.clone().unwrap_or_default();
        let tag = if directives
            .first()
            .is_some_and(|d| d.name == TAG_MARKER && !d.args.is_empty())
        {
            let mut marker = directives.remove(0);
            Some(marker.args.remove(0))
        } else {
            None
        };
        if tag.is_some() {
            for stray in directives.iter().filter(|d| d.name == TAG_MARKER) {
                findings.push(Inconsistency::DuplicateTag {
                    tag: stray.args.first().cloned().unwrap_or_default(),
                });
            }
        }

        services.push(Service {
            id: next_id(),
            matcher_name: matcher_name.to_string(),
            hostname,
            tag,
            directives,
        });
    }

    tracing::debug!(
        address = %wildcard_address,
        services = services.len(),
        findings = findings.len(),
        "decomposed container"
    );

    Some(Decomposed {
        container: Container {
            id: next_id(),
            wildcard_address,
            shared_config,
            services,
        },
        findings,
    })
}

/// Rebuild a site block from a container view.
///
/// Emits shared configuration first, then per service a regenerated
/// matcher directive immediately followed by its handler block, then the
/// deny-all fallback unless one is already present.
pub fn from_container(container: &Container) -> SiteBlock {
    let mut directives = container.shared_config.clone();

    for service in &container.services {
        directives.push(
            Directive::new(format!("@{}", service.matcher_name)).with_args(vec![
                HOST_PROPERTY.to_string(),
                service.hostname.clone(),
            ]),
        );

        let mut body = Vec::new();
        if let Some(tag) = &service.tag {
            body.push(Directive::new(TAG_MARKER).with_args(vec![tag.clone()]));
        }
        body.extend(service.directives.iter().cloned());

        directives.push(
            Directive::new(HANDLE)
                .with_args(vec![format!("@{}", service.matcher_name)])
                .with_block(body),
        );
    }

    let has_fallback = directives
        .iter()
        .any(|d| d.name == HANDLE && d.args.is_empty());
    if !container.services.is_empty() && !has_fallback {
        directives.push(Directive::new(HANDLE).with_block(vec![Directive::new(DENY_DIRECTIVE)]));
    }

    SiteBlock {
        id: next_id(),
        addresses: vec![container.wildcard_address.clone()],
        directives,
        tag: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn first_block(source: &str) -> SiteBlock {
        parse(source).unwrap().site_blocks.remove(0)
    }

    const CONTAINER: &str = "*.example.com {\n\ttls internal\n\tencode gzip\n\t@api host api.example.com\n\thandle @api {\n\t\treverse_proxy localhost:9000\n\t}\n\t@web host web.example.com\n\thandle @web {\n\t\t@id storefront\n\t\treverse_proxy localhost:3000\n\t}\n\thandle {\n\t\tabort\n\t}\n}\n";

    #[test]
    fn test_detection_requires_wildcard_and_handle() {
        assert!(is_container(&first_block(CONTAINER)));

        // wildcard but no handle
        let block = first_block("*.example.com {\n\trespond 200\n}\n");
        assert!(!is_container(&block));

        // handle but no wildcard
        let block =
            first_block("example.com {\n\thandle {\n\t\trespond 200\n\t}\n}\n");
        assert!(!is_container(&block));
    }

    #[test]
    fn test_fallback_only_block_is_a_container() {
        let block = first_block("*.example.com {\n\thandle {\n\t\tabort\n\t}\n}\n");
        assert!(is_container(&block));

        let decomposed = to_container(&block).unwrap();
        assert!(decomposed.container.services.is_empty());
        assert!(decomposed.findings.is_empty());
    }

    #[test]
    fn test_non_container_decomposes_to_none() {
        let block = first_block("example.com {\n\trespond 200\n}\n");
        assert!(to_container(&block).is_none());
    }

    #[test]
    fn test_decomposition_splits_shared_and_services() {
        let decomposed = to_container(&first_block(CONTAINER)).unwrap();
        let container = &decomposed.container;

        assert_eq!(container.wildcard_address, "*.example.com");

        // shared config keeps order and excludes matchers and handles
        let shared: Vec<&str> = container
            .shared_config
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(shared, vec!["tls", "encode"]);

        assert_eq!(container.services.len(), 2);
        let api = &container.services[0];
        assert_eq!(api.matcher_name, "api");
        assert_eq!(api.hostname, "api.example.com");
        assert!(api.tag.is_none());
        assert_eq!(api.directives.len(), 1);

        let web = &container.services[1];
        assert_eq!(web.hostname, "web.example.com");
        assert_eq!(web.tag.as_deref(), Some("storefront"));
        assert_eq!(web.directives.len(), 1);

        assert!(decomposed.findings.is_empty());
    }

    #[test]
    fn test_undefined_matcher_degrades_to_empty_hostname() {
        let block = first_block(
            "*.example.com {\n\thandle @ghost {\n\t\trespond 404\n\t}\n}\n",
        );
        let decomposed = to_container(&block).unwrap();

        let service = &decomposed.container.services[0];
        assert_eq!(service.matcher_name, "ghost");
        assert_eq!(service.hostname, "");
        assert_eq!(
            decomposed.findings,
            vec![Inconsistency::UndefinedMatcher {
                matcher: "ghost".to_string()
            }]
        );
    }

    #[test]
    fn test_fallback_handle_is_not_a_service() {
        let decomposed = to_container(&first_block(CONTAINER)).unwrap();
        assert!(decomposed
            .container
            .services
            .iter()
            .all(|s| !s.matcher_name.is_empty()));
        assert_eq!(decomposed.container.services.len(), 2);
    }

    #[test]
    fn test_recomposition_orders_matcher_before_handle() {
        let decomposed = to_container(&first_block(CONTAINER)).unwrap();
        let rebuilt = from_container(&decomposed.container);

        let names: Vec<(String, Vec<String>)> = rebuilt
            .directives
            .iter()
            .map(|d| (d.name.clone(), d.args.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("tls".to_string(), vec!["internal".to_string()]),
                ("encode".to_string(), vec!["gzip".to_string()]),
                ("@api".to_string(), vec!["host".to_string(), "api.example.com".to_string()]),
                ("handle".to_string(), vec!["@api".to_string()]),
                ("@web".to_string(), vec!["host".to_string(), "web.example.com".to_string()]),
                ("handle".to_string(), vec!["@web".to_string()]),
                ("handle".to_string(), vec![]),
            ]
        );
    }

    #[test]
    fn test_recomposition_is_deny_by_default() {
        let mut container = Container::new("*.svc.example.com");
        container
            .services
            .push(Service::new("api", "api.svc.example.com"));

        let rebuilt = from_container(&container);
        let fallbacks: Vec<&Directive> = rebuilt
            .directives
            .iter()
            .filter(|d| d.name == "handle" && d.args.is_empty())
            .collect();

        assert_eq!(fallbacks.len(), 1);
        assert_eq!(rebuilt.directives.last().unwrap().name, "handle");
        let body = fallbacks[0].block.as_ref().unwrap();
        assert_eq!(body[0].name, "abort");
        // regenerated for the safety invariant, never from preserved text
        assert!(fallbacks[0].raw_text.is_none());
    }

    #[test]
    fn test_existing_fallback_is_not_duplicated() {
        let decomposed = to_container(&first_block(CONTAINER)).unwrap();
        // CONTAINER's own fallback was dropped in decomposition, so shared
        // config cannot smuggle one in; rebuild and count anyway
        let rebuilt = from_container(&decomposed.container);
        let count = rebuilt
            .directives
            .iter()
            .filter(|d| d.name == "handle" && d.args.is_empty())
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_no_services_means_no_synthetic_fallback() {
        let container = Container::new("*.example.com");
        let rebuilt = from_container(&container);
        assert!(rebuilt.directives.is_empty());
    }

    #[test]
    fn test_service_tag_survives_recomposition() {
        let decomposed = to_container(&first_block(CONTAINER)).unwrap();
        let rebuilt = from_container(&decomposed.container);

        let handle_web = rebuilt
            .directives
            .iter()
            .find(|d| d.name == "handle" && d.args == vec!["@web".to_string()])
            .unwrap();
        let body = handle_web.block.as_ref().unwrap();
        assert_eq!(body[0].name, TAG_MARKER);
        assert_eq!(body[0].args, vec!["storefront".to_string()]);
    }

    #[test]
    fn test_shared_directives_keep_raw_text_through_the_cycle() {
        let decomposed = to_container(&first_block(CONTAINER)).unwrap();
        let rebuilt = from_container(&decomposed.container);
        // user-authored shared config is preserved verbatim
        assert_eq!(rebuilt.directives[0].raw_text.as_deref(), Some("tls internal"));
        // convention directives are regenerated
        assert!(rebuilt.directives[2].raw_text.is_none());
    }
}
