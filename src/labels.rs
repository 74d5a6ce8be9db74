//! Per-key language availability.
//!
//! The index lists, for every flat key, the documents that brought the key
//! themselves. Keys a document only has through backfill do not count, so the
//! index tells which languages actually ship a key.

use indexmap::IndexMap;
use serde::Serialize;

use crate::db::EditorDatabase;
use crate::document::DocumentSet;

/// Keys one document brought at upload time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Contribution {
    pub name: String,
    pub keys: Vec<String>,
}

/// Salsa input holding the key contributions of every document, in set order.
#[salsa::input]
pub struct KeyContributions {
    #[returns(ref)]
    pub entries: Vec<Contribution>,
}

/// Mapping from flat key to the names of the documents that contributed it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    labels: IndexMap<String, Vec<String>>,
}

/// One row of [`LabelIndex::view`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelEntry {
    pub key: String,
    pub languages: Vec<String>,
}

impl LabelIndex {
    /// Builds the index. Keys keep first-contribution order; names keep document order.
    #[must_use]
    pub fn compute(contributions: &[Contribution]) -> Self {
        let mut labels: IndexMap<String, Vec<String>> = IndexMap::new();
        for contribution in contributions {
            for key in &contribution.keys {
                labels.entry(key.clone()).or_default().push(contribution.name.clone());
            }
        }
        Self { labels }
    }

    /// Documents that contributed `key`; empty for unknown keys.
    #[must_use]
    pub fn languages(&self, key: &str) -> &[String] {
        self.labels.get(key).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.labels.iter().map(|(key, names)| (key.as_str(), names.as_slice()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Ordered `(key, languages)` rows for rendering.
    #[must_use]
    pub fn view(&self) -> Vec<LabelEntry> {
        self.labels
            .iter()
            .map(|(key, names)| LabelEntry { key: key.clone(), languages: names.clone() })
            .collect()
    }
}

/// Key contributions of a document set, in set order.
#[must_use]
pub fn contributions_of(documents: &DocumentSet) -> Vec<Contribution> {
    documents
        .documents()
        .iter()
        .map(|document| Contribution {
            name: document.name().to_string(),
            keys: document.contributed().iter().cloned().collect(),
        })
        .collect()
}

/// Memoized label index over the current contributions.
#[salsa::tracked]
pub fn label_index(db: &dyn EditorDatabase, contributions: KeyContributions) -> LabelIndex {
    let entries = contributions.entries(db);
    tracing::debug!(documents = entries.len(), "Computing label index");
    LabelIndex::compute(entries)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use salsa::Setter;
    use serde_json::json;

    use super::*;
    use crate::db::EditorDatabaseImpl;
    use crate::document::ParsedDocument;
    use crate::value::Node;

    fn contribution(name: &str, keys: &[&str]) -> Contribution {
        Contribution { name: name.to_string(), keys: keys.iter().map(|k| (*k).to_string()).collect() }
    }

    #[googletest::test]
    fn test_compute_ignores_backfilled_keys() {
        let mut set = DocumentSet::default();
        set.upload_batch(vec![
            ParsedDocument::new("A", Node::from(json!({ "a": "1", "b": "2" }))),
            ParsedDocument::new("B", Node::from(json!({ "b": "3", "c": "4" }))),
        ]);

        let index = LabelIndex::compute(&contributions_of(&set));

        expect_that!(index.languages("a").to_vec(), elements_are![eq("A")]);
        expect_that!(index.languages("b").to_vec(), elements_are![eq("A"), eq("B")]);
        expect_that!(index.languages("c").to_vec(), elements_are![eq("B")]);
        expect_that!(index.languages("missing").to_vec(), is_empty());
    }

    #[googletest::test]
    fn test_compute_orders_by_document_not_name() {
        let index = LabelIndex::compute(&[
            contribution("zh", &["title"]),
            contribution("de", &["body", "title"]),
        ]);

        let keys: Vec<_> = index.iter().map(|(key, _)| key.to_string()).collect();
        expect_that!(keys, elements_are![eq("title"), eq("body")]);
        expect_that!(index.languages("title").to_vec(), elements_are![eq("zh"), eq("de")]);
    }

    #[googletest::test]
    fn test_view_rows() {
        let index = LabelIndex::compute(&[contribution("en", &["a"])]);

        let view = index.view();

        assert_eq!(view, vec![LabelEntry { key: "a".to_string(), languages: vec!["en".to_string()] }]);
    }

    #[googletest::test]
    fn test_label_index_follows_input_changes() {
        let mut db = EditorDatabaseImpl::default();
        let input = KeyContributions::new(&db, vec![contribution("en", &["a"])]);

        let first = label_index(&db, input);
        expect_that!(first.languages("a").to_vec(), elements_are![eq("en")]);
        assert_eq!(label_index(&db, input), first);

        input.set_entries(&mut db).to(vec![contribution("en", &["a"]), contribution("ja", &["a"])]);

        let second = label_index(&db, input);
        expect_that!(second.languages("a").to_vec(), elements_are![eq("en"), eq("ja")]);
    }
}
