pub mod factors;
pub mod metadata;

use serde_json::Value;

use crate::error::DatasetError;

/// Walk `path` through nested objects.
///
/// A missing key ends the walk with `Ok(None)`; anything other than an object
/// standing where the path needs to descend is an error.
fn descend<'a>(root: &'a Value, path: &[&str]) -> Result<Option<&'a Value>, DatasetError> {
    let mut node = root;
    for (depth, key) in path.iter().enumerate() {
        let Value::Object(map) = node else {
            return Err(DatasetError::UnexpectedShape {
                path: describe(&path[..depth]),
            });
        };
        match map.get(*key) {
            Some(next) => node = next,
            None => return Ok(None),
        }
    }
    Ok(Some(node))
}

fn describe(path: &[&str]) -> String {
    if path.is_empty() {
        "<root>".to_string()
    } else {
        path.join(".")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descend_stops_at_missing_key() {
        let doc = json!({ "a": { "b": 1 } });
        assert_eq!(descend(&doc, &["a", "b"]).unwrap(), Some(&json!(1)));
        assert_eq!(descend(&doc, &["a", "x", "y"]).unwrap(), None);
    }

    #[test]
    fn descend_rejects_scalar_parent() {
        let doc = json!({ "a": null });
        match descend(&doc, &["a", "b"]) {
            Err(DatasetError::UnexpectedShape { path }) => assert_eq!(path, "a"),
            other => panic!("unexpected {:?}", other),
        }
        let root = json!([1, 2]);
        match descend(&root, &["a"]) {
            Err(DatasetError::UnexpectedShape { path }) => assert_eq!(path, "<root>"),
            other => panic!("unexpected {:?}", other),
        }
    }
}
