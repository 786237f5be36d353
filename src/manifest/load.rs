//! Manifest loading and shape validation.
//!
//! The raw document is parsed once into a [`ManifestNode`] tree; later stages
//! never look at untyped values again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;

use super::ManifestNode;

/// Manifest loading errors
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("IO error when reading `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid JSON in `{}`", .0.display())]
    Json(PathBuf, #[source] serde_json::Error),

    #[error("invalid TOML in `{}`", .0.display())]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("unsupported manifest format `{}` (expected .json or .toml)", .0.display())]
    Format(PathBuf),

    #[error("manifest root must be a table of groups, found {0}")]
    Root(&'static str),

    #[error("`{key}`: expected a list of paths or a table, found {found}")]
    Node { key: String, found: &'static str },

    #[error("`{key}[{index}]`: expected a path string, found {found}")]
    Entry {
        key: String,
        index: usize,
        found: &'static str,
    },
}

/// Read and parse a manifest file, picking the format from its extension.
pub fn load_manifest(path: &Path) -> Result<ManifestNode, ManifestError> {
    let content = fs::read_to_string(path).map_err(|e| ManifestError::Io(path.to_path_buf(), e))?;

    let value: Value = match path.extension().and_then(|e| e.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .map_err(|e| ManifestError::Json(path.to_path_buf(), e))?,
        Some("toml") => {
            toml::from_str(&content).map_err(|e| ManifestError::Toml(path.to_path_buf(), e))?
        }
        _ => return Err(ManifestError::Format(path.to_path_buf())),
    };

    parse_manifest(value)
}

/// Convert an untyped document into a manifest tree.
///
/// The root must be a table. Below it, arrays are leaves (every element a
/// string) and tables are groups; anything else is rejected with the dotted
/// key path of the offending node.
pub fn parse_manifest(value: Value) -> Result<ManifestNode, ManifestError> {
    match value {
        Value::Object(map) => parse_group(map, ""),
        other => Err(ManifestError::Root(kind_of(&other))),
    }
}

fn parse_group(
    map: serde_json::Map<String, Value>,
    parent: &str,
) -> Result<ManifestNode, ManifestError> {
    let mut children = BTreeMap::new();
    for (key, value) in map {
        let path = if parent.is_empty() {
            key.clone()
        } else {
            format!("{parent}.{key}")
        };
        let node = match value {
            Value::Object(map) => parse_group(map, &path)?,
            Value::Array(items) => parse_leaf(items, &path)?,
            other => {
                return Err(ManifestError::Node {
                    key: path,
                    found: kind_of(&other),
                });
            }
        };
        children.insert(key, node);
    }
    Ok(ManifestNode::Group(children))
}

fn parse_leaf(items: Vec<Value>, key: &str) -> Result<ManifestNode, ManifestError> {
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            Value::String(path) => Ok(path),
            other => Err(ManifestError::Entry {
                key: key.to_string(),
                index,
                found: kind_of(&other),
            }),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(ManifestNode::Leaf)
}

const fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_parse_nested() {
        let node = parse_manifest(json!({
            "a": { "b": ["x.js"] },
            "css": ["app.css", "print.css"]
        }))
        .unwrap();

        let ManifestNode::Group(root) = node else {
            panic!("root should be a group");
        };
        assert_eq!(
            root["css"],
            ManifestNode::Leaf(vec!["app.css".into(), "print.css".into()])
        );
        let ManifestNode::Group(a) = &root["a"] else {
            panic!("`a` should be a group");
        };
        assert_eq!(a["b"], ManifestNode::Leaf(vec!["x.js".into()]));
    }

    #[test]
    fn test_parse_rejects_scalar_root() {
        let err = parse_manifest(json!(["x.js"])).unwrap_err();
        assert!(matches!(err, ManifestError::Root("an array")));
    }

    #[test]
    fn test_parse_rejects_scalar_node() {
        let err = parse_manifest(json!({ "a": { "b": "x.js" } })).unwrap_err();
        assert_eq!(
            err.to_string(),
            "`a.b`: expected a list of paths or a table, found a string"
        );
    }

    #[test]
    fn test_parse_rejects_non_string_entry() {
        let err = parse_manifest(json!({ "js": ["x.js", 3] })).unwrap_err();
        assert_eq!(err.to_string(), "`js[1]`: expected a path string, found a number");
    }

    #[test]
    fn test_load_json_and_toml() {
        let dir = TempDir::new().unwrap();
        let json_path = dir.path().join("manifest.json");
        let toml_path = dir.path().join("manifest.toml");
        fs::write(&json_path, r#"{"app": {"js": ["src/app.js"]}}"#).unwrap();
        fs::write(&toml_path, "[app]\njs = [\"src/app.js\"]\n").unwrap();

        let from_json = load_manifest(&json_path).unwrap();
        let from_toml = load_manifest(&toml_path).unwrap();
        assert_eq!(from_json, from_toml);
        assert_eq!(from_json.path_count(), 1);
    }

    #[test]
    fn test_load_unknown_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("manifest.yaml");
        fs::write(&path, "app: []").unwrap();
        assert!(matches!(load_manifest(&path), Err(ManifestError::Format(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_manifest(Path::new("/nonexistent/manifest.json")).unwrap_err();
        assert!(matches!(err, ManifestError::Io(..)));
    }
}
