//! Conversion between nested translation documents and flat key maps.

use indexmap::IndexMap;
use thiserror::Error;

use crate::value::{
    Leaf,
    Node,
};

/// Flat translation map (e.g., `"common.hello" -> "Hello"`), in first-encounter order.
pub type FlatMap = IndexMap<String, Leaf>;

/// Errors raised while rebuilding a nested document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnflattenError {
    /// Two flat keys disagree about whether `path` holds a value or a nested object
    /// (e.g., both `x` and `x.y` are present).
    #[error("Key '{key}' conflicts with the value already stored at '{path}'")]
    PathConflict { key: String, path: String },
}

/// Flatten a nested document into a dot-separated key map.
///
/// Only mappings are descended into. Arrays, scalars, `null` and empty
/// mappings become leaves as they are, so the document can be rebuilt without
/// loss. A root that is not a mapping has no keys and yields an empty map.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use i18n_bulk_editor::flatten::flatten;
/// use i18n_bulk_editor::value::{Leaf, Node};
///
/// let doc = Node::from(json!({
///     "common": {
///         "hello": "Hello",
///         "goodbye": "Goodbye"
///     }
/// }));
///
/// let flat = flatten(&doc, ".");
/// assert_eq!(flat.get("common.hello"), Some(&Leaf::text("Hello")));
/// assert_eq!(flat.get("common.goodbye"), Some(&Leaf::text("Goodbye")));
/// ```
#[must_use]
pub fn flatten(node: &Node, separator: &str) -> FlatMap {
    let mut result = FlatMap::new();
    if let Node::Mapping(map) = node {
        flatten_mapping(map, separator, None, &mut result);
    }
    result
}

fn flatten_mapping(
    map: &IndexMap<String, Node>,
    separator: &str,
    prefix: Option<&str>,
    result: &mut FlatMap,
) {
    for (key, value) in map {
        let full_key = prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
        match value {
            Node::Mapping(children) if children.is_empty() => {
                result.insert(full_key, Leaf::EmptyMapping);
            }
            Node::Mapping(children) => {
                flatten_mapping(children, separator, Some(&full_key), result);
            }
            Node::Null => {
                result.insert(full_key, Leaf::Null);
            }
            Node::Scalar(scalar) => {
                result.insert(full_key, Leaf::Scalar(scalar.clone()));
            }
            Node::Sequence(items) => {
                result.insert(full_key, Leaf::Sequence(items.clone()));
            }
        }
    }
}

/// Rebuild the nested document from a flat key map.
///
/// Keys are split on `separator` and intermediate objects are created as
/// needed, in the order keys are first seen. An empty-mapping leaf merges with
/// any object built at the same path.
///
/// # Errors
/// [`UnflattenError::PathConflict`] when one key is a strict prefix of another
/// (`x` and `x.y`), since the result could hold only one of them.
pub fn unflatten(flat: &FlatMap, separator: &str) -> Result<Node, UnflattenError> {
    let mut root = IndexMap::new();
    for (key, leaf) in flat {
        insert_path(&mut root, key, separator, leaf)?;
    }
    Ok(Node::Mapping(root))
}

fn insert_path(
    root: &mut IndexMap<String, Node>,
    key: &str,
    separator: &str,
    leaf: &Leaf,
) -> Result<(), UnflattenError> {
    let mut segments = key.split(separator).peekable();
    let mut walked: Vec<&str> = Vec::new();
    let mut current = root;

    while let Some(segment) = segments.next() {
        walked.push(segment);
        let conflict =
            || UnflattenError::PathConflict { key: key.to_string(), path: walked.join(separator) };

        if segments.peek().is_none() {
            if let Some(Node::Mapping(_)) = current.get(segment) {
                return if matches!(leaf, Leaf::EmptyMapping) { Ok(()) } else { Err(conflict()) };
            }
            current.insert(segment.to_string(), leaf.clone().into());
            return Ok(());
        }

        current = match current
            .entry(segment.to_string())
            .or_insert_with(|| Node::Mapping(IndexMap::new()))
        {
            Node::Mapping(children) => children,
            Node::Null | Node::Scalar(_) | Node::Sequence(_) => return Err(conflict()),
        };
    }

    Ok(())
}

/// True when `child` lies strictly below `parent` (`a.b` below `a`).
#[must_use]
pub fn is_nested_path(parent: &str, child: &str, separator: &str) -> bool {
    child
        .strip_prefix(parent)
        .is_some_and(|rest| rest.len() > separator.len() && rest.starts_with(separator))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::{
        Value,
        json,
    };

    use super::*;

    fn node(value: Value) -> Node {
        Node::from(value)
    }

    #[googletest::test]
    fn test_flatten_simple() {
        let result = flatten(&node(json!({ "hello": "Hello", "goodbye": "Goodbye" })), ".");

        expect_that!(result.get("hello"), some(eq(&Leaf::text("Hello"))));
        expect_that!(result.get("goodbye"), some(eq(&Leaf::text("Goodbye"))));
        expect_that!(result.len(), eq(2));
    }

    #[googletest::test]
    fn test_flatten_nested() {
        let json = json!({
            "common": {
                "hello": "Hello",
                "goodbye": "Goodbye"
            },
            "errors": {
                "notFound": "Not found"
            }
        });

        let result = flatten(&node(json), ".");

        let keys: Vec<_> = result.keys().cloned().collect();
        expect_that!(
            keys,
            elements_are![eq("common.hello"), eq("common.goodbye"), eq("errors.notFound")]
        );
        expect_that!(result.get("errors.notFound"), some(eq(&Leaf::text("Not found"))));
    }

    #[googletest::test]
    fn test_flatten_keeps_arrays_as_leaves() {
        let json = json!({ "menu": { "items": ["item1", { "nested": "no" }] } });

        let result = flatten(&node(json), ".");

        expect_that!(result.len(), eq(1));
        expect_that!(
            result.get("menu.items").map(Leaf::display),
            some(eq(r#"["item1",{"nested":"no"}]"#))
        );
    }

    #[googletest::test]
    fn test_flatten_keeps_non_string_leaves() {
        let json = json!({ "count": 3, "enabled": false, "missing": null });

        let result = flatten(&node(json), ".");

        expect_that!(result.get("count").map(Leaf::display), some(eq("3")));
        expect_that!(result.get("enabled").map(Leaf::display), some(eq("false")));
        expect_that!(result.get("missing"), some(eq(&Leaf::Null)));
    }

    #[googletest::test]
    fn test_flatten_keeps_empty_object() {
        let result = flatten(&node(json!({ "a": {}, "b": "x" })), ".");

        let keys: Vec<_> = result.keys().cloned().collect();
        expect_that!(keys, elements_are![eq("a"), eq("b")]);
        expect_that!(result.get("a"), some(eq(&Leaf::EmptyMapping)));
    }

    #[rstest]
    #[case::object_first(&["a", "a.b"])]
    #[case::object_last(&["a.b", "a"])]
    fn test_unflatten_empty_object_merges_with_children(#[case] order: &[&str]) {
        let mut flat = FlatMap::new();
        for key in order {
            let leaf = if *key == "a" { Leaf::EmptyMapping } else { Leaf::text("x") };
            flat.insert((*key).to_string(), leaf);
        }

        let result = unflatten(&flat, ".").unwrap();

        assert_eq!(Value::from(result), json!({ "a": { "b": "x" } }));
    }

    #[rstest]
    #[case::string(json!("text"))]
    #[case::array(json!(["a", "b"]))]
    #[case::null(json!(null))]
    fn test_flatten_non_object_root_is_empty(#[case] root: Value) {
        assert!(flatten(&node(root), ".").is_empty());
    }

    #[googletest::test]
    fn test_flatten_custom_separator() {
        let result = flatten(&node(json!({ "a": { "b": "c" } })), "::");

        expect_that!(result.get("a::b"), some(eq(&Leaf::text("c"))));
    }

    #[googletest::test]
    fn test_unflatten_nested() {
        let mut flat = FlatMap::new();
        flat.insert("x.y".to_string(), Leaf::text("1"));
        flat.insert("x.z".to_string(), Leaf::text("2"));

        let result = unflatten(&flat, ".").unwrap();

        assert_eq!(Value::from(result), json!({ "x": { "y": "1", "z": "2" } }));
    }

    #[rstest]
    #[case::flat(json!({ "a": "1", "b": "2" }))]
    #[case::nested(json!({ "common": { "hello": "Hello", "deep": { "er": "x" } }, "top": "t" }))]
    #[case::arrays(json!({ "list": ["a", ["b", 1]], "objs": [{ "k": "v" }] }))]
    #[case::scalars(json!({ "n": 1.25, "b": true, "z": null, "s": "" }))]
    #[case::empty(json!({}))]
    #[case::empty_nested(json!({ "a": {}, "b": "x" }))]
    #[case::empty_deep(json!({ "a": { "b": {} } }))]
    #[case::order(json!({ "z": { "b": "1", "a": "2" }, "a": "3" }))]
    fn test_round_trip(#[case] value: Value) {
        let flat = flatten(&node(value.clone()), ".");
        let rebuilt = unflatten(&flat, ".").unwrap();

        // Value equality ignores key order, so compare the serialized form as well.
        assert_eq!(Value::from(rebuilt.clone()), value);
        assert_eq!(serde_json::to_string(&rebuilt).unwrap(), value.to_string());
    }

    #[googletest::test]
    fn test_unflatten_conflict_leaf_then_object() {
        let mut flat = FlatMap::new();
        flat.insert("x".to_string(), Leaf::text("1"));
        flat.insert("x.y".to_string(), Leaf::text("2"));

        let result = unflatten(&flat, ".");

        assert_eq!(
            result,
            Err(UnflattenError::PathConflict { key: "x.y".to_string(), path: "x".to_string() })
        );
    }

    #[googletest::test]
    fn test_unflatten_conflict_object_then_leaf() {
        let mut flat = FlatMap::new();
        flat.insert("a.b.c".to_string(), Leaf::text("1"));
        flat.insert("a.b".to_string(), Leaf::text("2"));

        let result = unflatten(&flat, ".");

        assert_eq!(
            result,
            Err(UnflattenError::PathConflict { key: "a.b".to_string(), path: "a.b".to_string() })
        );
    }

    #[rstest]
    #[case::child("a", "a.b", true)]
    #[case::grandchild("a", "a.b.c", true)]
    #[case::same("a", "a", false)]
    #[case::sibling_prefix("a", "ab.c", false)]
    #[case::parent("a.b", "a", false)]
    fn test_is_nested_path(#[case] parent: &str, #[case] child: &str, #[case] expected: bool) {
        assert_eq!(is_nested_path(parent, child, "."), expected);
    }

    #[googletest::test]
    fn test_unflatten_conflict_message() {
        let error = UnflattenError::PathConflict { key: "x.y".to_string(), path: "x".to_string() };

        expect_that!(error.to_string(), contains_substring("'x.y'"));
        expect_that!(error.to_string(), contains_substring("'x'"));
    }
}
