//! Memoized value lookups for rendering and editing.

use std::collections::HashMap;

use crate::document::DocumentSet;

/// Cache of `(document, key) -> display value`.
///
/// Any mutation of the document set clears the whole cache.
#[derive(Debug, Clone, Default)]
pub struct LookupCache {
    entries: HashMap<(String, String), String>,
}

impl LookupCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Value of `key` in document `name`, as an editable string.
    ///
    /// Unknown documents and unknown keys both yield an empty string.
    pub fn get(&mut self, documents: &DocumentSet, name: &str, key: &str) -> String {
        let cache_key = (name.to_string(), key.to_string());
        if let Some(value) = self.entries.get(&cache_key) {
            tracing::trace!(name, key, "Lookup cache hit");
            return value.clone();
        }

        let value = documents.value(name, key).map(crate::value::Leaf::display).unwrap_or_default();
        self.entries.insert(cache_key, value.clone());
        value
    }

    /// Writes through to the document set and drops every cached value.
    ///
    /// Returns whether the document existed.
    pub fn set(&mut self, documents: &mut DocumentSet, name: &str, key: &str, value: &str) -> bool {
        let updated = documents.update(name, key, value);
        self.invalidate();
        updated
    }

    pub fn invalidate(&mut self) {
        if !self.entries.is_empty() {
            tracing::trace!(entries = self.entries.len(), "Invalidating lookup cache");
        }
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;
    use serde_json::json;

    use super::*;
    use crate::document::ParsedDocument;
    use crate::value::Node;

    #[fixture]
    fn documents() -> DocumentSet {
        let mut set = DocumentSet::default();
        set.upload_batch(vec![
            ParsedDocument::new("A", Node::from(json!({ "a": "1", "n": 5 }))),
            ParsedDocument::new("B", Node::from(json!({ "b": "2" }))),
        ]);
        set
    }

    #[rstest]
    #[gtest]
    fn test_get_reads_and_caches(documents: DocumentSet) {
        let mut cache = LookupCache::new();

        expect_that!(cache.get(&documents, "A", "a"), eq("1"));
        expect_that!(cache.get(&documents, "A", "n"), eq("5"));
        expect_that!(cache.get(&documents, "A", "b"), eq(""));
        expect_that!(cache.len(), eq(3));
    }

    #[rstest]
    #[case::unknown_document("Z", "a")]
    #[case::unknown_key("A", "zzz")]
    #[gtest]
    fn test_get_missing_is_empty(documents: DocumentSet, #[case] name: &str, #[case] key: &str) {
        let mut cache = LookupCache::new();

        expect_that!(cache.get(&documents, name, key), eq(""));
    }

    #[rstest]
    #[gtest]
    fn test_set_invalidates_everything(mut documents: DocumentSet) {
        let mut cache = LookupCache::new();
        cache.get(&documents, "A", "a");
        cache.get(&documents, "B", "b");

        let updated = cache.set(&mut documents, "A", "a", "hello");

        expect_that!(updated, eq(true));
        expect_that!(cache.is_empty(), eq(true));
        expect_that!(cache.get(&documents, "A", "a"), eq("hello"));
        expect_that!(cache.get(&documents, "B", "b"), eq("2"));
    }

    #[rstest]
    #[gtest]
    fn test_set_unknown_document(mut documents: DocumentSet) {
        let mut cache = LookupCache::new();

        expect_that!(cache.set(&mut documents, "Z", "a", "x"), eq(false));
        expect_that!(cache.get(&documents, "Z", "a"), eq(""));
    }
}
