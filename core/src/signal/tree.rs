//! Depth-first search over untyped payload trees.
//!
//! The walker knows nothing about notification schemas. Callers pass a leaf
//! predicate that decides, per named field, whether it yields a value.

use serde_json::Value;

pub trait TreeNode {
    /// Visits every direct child, passing its field name when it has one.
    fn for_each_child<'a>(&'a self, visit: &mut dyn FnMut(Option<&'a str>, &'a Self));
}

impl TreeNode for Value {
    fn for_each_child<'a>(&'a self, visit: &mut dyn FnMut(Option<&'a str>, &'a Self)) {
        match self {
            Value::Object(map) => {
                for (key, child) in map {
                    visit(Some(key.as_str()), child);
                }
            }
            Value::Array(items) => {
                for child in items {
                    visit(None, child);
                }
            }
            _ => {}
        }
    }
}

/// Collects every value `leaf` extracts from a named field, at any depth.
pub fn collect_leaves<'a, N, T, F>(root: &'a N, leaf: F) -> Vec<T>
where
    N: TreeNode,
    F: Fn(&str, &'a N) -> Option<T>,
{
    let mut found = Vec::new();
    walk(root, &leaf, &mut found);
    found
}

fn walk<'a, N, T>(node: &'a N, leaf: &dyn Fn(&str, &'a N) -> Option<T>, found: &mut Vec<T>)
where
    N: TreeNode,
{
    node.for_each_child(&mut |key, child| {
        if let Some(value) = key.and_then(|key| leaf(key, child)) {
            found.push(value);
        }
        walk(child, leaf, found);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn strings_named<'a>(root: &'a Value, field: &str) -> Vec<&'a str> {
        collect_leaves(root, |key, node: &'a Value| {
            if key == field {
                node.as_str()
            } else {
                None
            }
        })
    }

    #[test]
    fn finds_fields_at_every_depth() {
        let payload = json!({
            "Value": "top",
            "Message": {
                "Data": { "SimpleItem": { "Name": "IsMotion", "Value": "deep" } }
            }
        });
        let mut found = strings_named(&payload, "Value");
        found.sort();
        assert_eq!(found, vec!["deep", "top"]);
    }

    #[test]
    fn descends_through_arrays() {
        let payload = json!({
            "Items": [
                { "Value": "a" },
                [ { "Value": "b" } ]
            ]
        });
        assert_eq!(strings_named(&payload, "Value"), vec!["a", "b"]);
    }

    #[test]
    fn scalars_have_no_children() {
        assert!(strings_named(&json!("Value"), "Value").is_empty());
        assert!(strings_named(&Value::Null, "Value").is_empty());
    }
}
