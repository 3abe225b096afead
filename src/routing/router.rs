//! Path-to-function route table.
//!
//! # Responsibilities
//! - Store compiled path bindings, most specific first
//! - Resolve an inbound path to a logical function name
//! - Fall back to the wildcard binding when nothing else matches
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - Stable sort: bindings of equal specificity keep load order. Which of
//!   two such bindings wins is not a guaranteed property
//! - A prefix configured twice keeps its first position, last function wins

use crate::config::PathMapping;
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::WILDCARD_PATH;

/// A compiled path binding.
#[derive(Debug, Clone)]
pub struct Route {
    pub matcher: PathPrefixMatcher,
    pub function: String,
}

/// Ordered path bindings plus an optional wildcard.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    wildcard: Option<String>,
}

impl RouteTable {
    /// Compile bindings from configuration.
    pub fn from_config(mappings: &[PathMapping]) -> Self {
        let mut routes: Vec<Route> = Vec::with_capacity(mappings.len());
        let mut wildcard = None;

        for mapping in mappings {
            if mapping.path == WILDCARD_PATH {
                wildcard = Some(mapping.function.clone());
                continue;
            }
            match routes.iter_mut().find(|r| r.matcher.prefix() == mapping.path) {
                Some(existing) => existing.function = mapping.function.clone(),
                None => routes.push(Route {
                    matcher: PathPrefixMatcher::new(mapping.path.clone()),
                    function: mapping.function.clone(),
                }),
            }
        }

        routes.sort_by(|a, b| b.matcher.specificity().cmp(&a.matcher.specificity()));

        Self { routes, wildcard }
    }

    /// Resolve the function bound to the most specific matching prefix.
    pub fn resolve_function(&self, path: &str) -> Option<&str> {
        self.routes
            .iter()
            .find(|r| r.matcher.matches(path))
            .map(|r| r.function.as_str())
            .or(self.wildcard.as_deref())
    }

    /// Compiled bindings in evaluation order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn wildcard(&self) -> Option<&str> {
        self.wildcard.as_deref()
    }
}
