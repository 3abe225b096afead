//! Path prefix matching.
//!
//! # Design Decisions
//! - Matching is a raw, case-sensitive `starts_with` on the request path
//! - Specificity is the number of `/`-delimited segments in the prefix
//! - No regex to guarantee O(n) matching

/// Matches the request path against a configured prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPrefixMatcher {
    prefix: String,
    segments: usize,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let segments = segment_count(&prefix);
        Self { prefix, segments }
    }

    /// Returns true if the path starts with this prefix.
    pub fn matches(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of `/`-delimited segments; higher is more specific.
    pub fn specificity(&self) -> usize {
        self.segments
    }
}

fn segment_count(path: &str) -> usize {
    path.split('/').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");
        assert!(matcher.matches("/api/v1"));
        assert!(matcher.matches("/api"));
        assert!(!matcher.matches("/images"));
        assert!(!matcher.matches("/API"));
    }

    #[test]
    fn test_specificity() {
        assert!(PathPrefixMatcher::new("/a/b/c").specificity() > PathPrefixMatcher::new("/a/b").specificity());
        assert_eq!(PathPrefixMatcher::new("/a").specificity(), PathPrefixMatcher::new("/b").specificity());
    }
}
