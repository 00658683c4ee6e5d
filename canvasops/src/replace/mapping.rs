use std::collections::HashSet;

use crate::core::error::{CanvasOpsError, Result};
use crate::core::types::UrlMapping;

/// Result of running every mapping over one body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub body: String,
    /// Mappings that matched, in mapping order
    pub applied: Vec<UrlMapping>,
}

impl Substitution {
    pub fn changed(&self) -> bool {
        !self.applied.is_empty()
    }
}

/// Literal substring substitution over a fixed, ordered mapping list
#[derive(Debug, Clone)]
pub struct MappingEngine {
    mappings: Vec<UrlMapping>,
}

impl MappingEngine {
    /// Keep the active mappings in their given order.
    ///
    /// Duplicate old values are kept (later ones see the text produced by
    /// earlier ones) and only reported through a warning.
    pub fn new(mappings: Vec<UrlMapping>) -> Result<Self> {
        let mappings: Vec<UrlMapping> = mappings.into_iter().filter(UrlMapping::is_active).collect();
        if mappings.is_empty() {
            return Err(CanvasOpsError::validation("no mappings provided"));
        }

        let mut seen = HashSet::new();
        for mapping in &mappings {
            if !seen.insert(mapping.old_value.as_str()) {
                tracing::warn!(
                    "Duplicate mapping for '{}'; mappings apply in order",
                    mapping.old_value
                );
            }
        }

        Ok(Self { mappings })
    }

    pub fn mappings(&self) -> &[UrlMapping] {
        &self.mappings
    }

    pub fn apply(&self, body: &str) -> Substitution {
        apply_mappings(body, &self.mappings)
    }
}

/// For each mapping in order, replace every non-overlapping occurrence of
/// `old_value` in the current body. A later mapping can match text that an
/// earlier one inserted.
pub fn apply_mappings(body: &str, mappings: &[UrlMapping]) -> Substitution {
    let mut current = body.to_string();
    let mut applied = Vec::new();

    for mapping in mappings {
        if mapping.old_value.is_empty() || !current.contains(&mapping.old_value) {
            continue;
        }
        current = current.replace(&mapping.old_value, &mapping.new_value);
        applied.push(mapping.clone());
    }

    Substitution {
        body: current,
        applied,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count_occurrences(haystack: &str, needle: &str) -> usize {
        haystack.matches(needle).count()
    }

    fn m(old: &str, new: &str) -> UrlMapping {
        UrlMapping::new(old, new)
    }

    #[test]
    fn test_no_match_is_not_an_error() {
        let result = apply_mappings("hello world", &[m("xyz", "abc")]);
        assert_eq!(result.body, "hello world");
        assert!(result.applied.is_empty());
        assert!(!result.changed());
    }

    #[test]
    fn test_replaces_every_occurrence() {
        let body = r#"<a href="http://old.example.com/a">http://old.example.com/a</a> http://old.example.com"#;
        let old = "http://old.example.com";
        let k = count_occurrences(body, old);
        assert_eq!(k, 3);

        let result = apply_mappings(body, &[m(old, "https://new.example.com")]);
        assert_eq!(count_occurrences(&result.body, old), 0);
        assert_eq!(count_occurrences(&result.body, "https://new.example.com"), k);
        assert_eq!(result.applied, vec![m(old, "https://new.example.com")]);
    }

    #[test]
    fn test_non_overlapping_occurrences() {
        assert_eq!(count_occurrences("aaaa", "aa"), 2);
        let result = apply_mappings("aaaa", &[m("aa", "b")]);
        assert_eq!(result.body, "bb");

        let result = apply_mappings("aaa", &[m("aa", "b")]);
        assert_eq!(result.body, "ba");
    }

    #[test]
    fn test_literal_not_regex() {
        let result = apply_mappings("a.b and axb", &[m("a.b", "X")]);
        assert_eq!(result.body, "X and axb");
    }

    #[test]
    fn test_applied_follows_mapping_order_and_only_matches() {
        let mappings = vec![m("one", "1"), m("missing", "?"), m("two", "2")];
        let result = apply_mappings("two one two", &mappings);
        assert_eq!(result.body, "2 1 2");
        assert_eq!(result.applied, vec![m("one", "1"), m("two", "2")]);
    }

    #[test]
    fn test_later_mapping_sees_earlier_output() {
        let mappings = vec![m("http://a", "http://b"), m("http://b", "http://c")];
        let result = apply_mappings("go to http://a", &mappings);
        assert_eq!(result.body, "go to http://c");
        assert_eq!(result.applied.len(), 2);
    }

    #[test]
    fn test_engine_rejects_empty_and_inactive() {
        assert!(MappingEngine::new(Vec::new()).unwrap_err().is_validation());

        let err = MappingEngine::new(vec![m("", "x"), m("y", "")]).unwrap_err();
        assert_eq!(err.to_string(), "Validation error: no mappings provided");
    }

    #[test]
    fn test_engine_keeps_duplicates_in_order() {
        let engine = MappingEngine::new(vec![m("a", "b"), m("", "z"), m("a", "c")]).unwrap();
        assert_eq!(engine.mappings().len(), 2);

        let result = engine.apply("a");
        assert_eq!(result.body, "b");
        assert_eq!(result.applied, vec![m("a", "b")]);
    }
}
