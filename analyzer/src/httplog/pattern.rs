//! URI pattern normalization

use crate::config::AlpConfig;
use regex::Regex;
use tracing::warn;

/// Placeholder for a purely numeric path segment
pub const ID_PLACEHOLDER: &str = ":id";

/// Replace every all-digit path segment with `:id`.
///
/// The query string stays attached to the last segment, so `/users/42?x=1`
/// is left as-is. Applying this to its own output is a no-op.
pub fn normalize_numeric(uri: &str) -> String {
    uri.split('/')
        .map(|segment| {
            if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
                ID_PLACEHOLDER
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Operator-defined matching groups, compiled once
#[derive(Debug, Clone, Default)]
pub struct UriPatterns {
    /// (label, regex) in declaration order
    groups: Vec<(String, Regex)>,
}

impl UriPatterns {
    /// Compile the matching groups. Invalid expressions are skipped with a
    /// warning; labels keep the 1-based position from the config file.
    pub fn compile(config: &AlpConfig) -> Self {
        let groups = config
            .matching_groups
            .iter()
            .enumerate()
            .filter_map(|(i, pattern)| match Regex::new(pattern) {
                Ok(re) => Some((format!("group_{}: {}", i + 1, pattern), re)),
                Err(e) => {
                    warn!("Invalid regex pattern in ALP config: {}: {}", pattern, e);
                    None
                }
            })
            .collect();
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Label of the first matching group, if any
    pub fn matching_label(&self, uri: &str) -> Option<&str> {
        self.groups
            .iter()
            .find(|(_, re)| re.is_match(uri))
            .map(|(label, _)| label.as_str())
    }

    /// First matching group label, else the numeric-id normalization
    pub fn normalize(&self, uri: &str) -> String {
        match self.matching_label(uri) {
            Some(label) => label.to_string(),
            None => normalize_numeric(uri),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns(groups: &[&str]) -> UriPatterns {
        UriPatterns::compile(&AlpConfig {
            matching_groups: groups.iter().map(|s| s.to_string()).collect(),
        })
    }

    #[test]
    fn test_numeric_segments() {
        assert_eq!(normalize_numeric("/users/42"), "/users/:id");
        assert_eq!(normalize_numeric("/users/42/posts/7"), "/users/:id/posts/:id");
        assert_eq!(normalize_numeric("/a/1/2/"), "/a/:id/:id/");
        assert_eq!(normalize_numeric("/v2/items"), "/v2/items");
        assert_eq!(normalize_numeric("/users/42?x=1"), "/users/42?x=1");
        assert_eq!(normalize_numeric(""), "");
        assert_eq!(normalize_numeric("/"), "/");
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for uri in ["/users/:id", "/users/42/posts", "/1/2/3", "/static/app.js"] {
            let once = normalize_numeric(uri);
            assert_eq!(normalize_numeric(&once), once);
        }
    }

    #[test]
    fn test_first_matching_group_wins() {
        let p = patterns(&["^/api/users/.*", "^/api/.*"]);
        assert_eq!(p.normalize("/api/users/9"), "group_1: ^/api/users/.*");
        assert_eq!(p.normalize("/api/items/9"), "group_2: ^/api/.*");
        assert_eq!(p.normalize("/other/9"), "/other/:id");
    }

    #[test]
    fn test_invalid_group_is_skipped() {
        let p = patterns(&["([unclosed", "^/ok$"]);
        assert_eq!(p.len(), 1);
        // label keeps the position from the config
        assert_eq!(p.normalize("/ok"), "group_2: ^/ok$");
    }

    #[test]
    fn test_empty_patterns() {
        let p = UriPatterns::default();
        assert!(p.is_empty());
        assert_eq!(p.normalize("/users/1"), "/users/:id");
    }
}
