//! Reading and writing native trees
//!
//! Both dialects are YAML (JSON being a subset), so every input goes through `serde_yaml`.
//! Mapping keys are stringified on the way in: YAML reads `200:` as an integer, and the engine
//! only knows string keys.

use apiconv::{ConvertError, DialectKind, Tree};
use apiconv_dialects::dialects::raml::RAML10_HEADER;
use serde_json::{Map, Number, Value};
use serde_yaml::Value as Yaml;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("cannot read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} is not YAML or JSON: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{}: {source}", .path.display())]
    Convert {
        path: PathBuf,
        source: ConvertError,
    },

    #[error("cannot render output: {0}")]
    Render(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("conversion task failed: {0}")]
    Task(String),
}

pub fn parse_tree(path: &Path, text: &str) -> Result<Tree, CliError> {
    let yaml: Yaml = serde_yaml::from_str(text).map_err(|source| CliError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(to_json(yaml))
}

fn to_json(value: Yaml) -> Value {
    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(flag) => Value::Bool(flag),
        Yaml::Number(number) => {
            if let Some(int) = number.as_i64() {
                Value::from(int)
            } else if let Some(int) = number.as_u64() {
                Value::from(int)
            } else {
                number
                    .as_f64()
                    .and_then(Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(text) => Value::String(text),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(to_json).collect()),
        Yaml::Mapping(entries) => {
            let map: Map<String, Value> = entries
                .into_iter()
                .map(|(key, value)| (key_string(key), to_json(value)))
                .collect();
            Value::Object(map)
        }
        Yaml::Tagged(tagged) => to_json(tagged.value),
    }
}

fn key_string(key: Yaml) -> String {
    match key {
        Yaml::String(text) => text,
        Yaml::Number(number) => number.to_string(),
        Yaml::Bool(flag) => flag.to_string(),
        Yaml::Null => "null".to_string(),
        other => match to_json(other) {
            Value::String(text) => text,
            complex => complex.to_string(),
        },
    }
}

/// Render a tree for `dialect`; RAML 1.0 YAML output starts with its header line.
pub fn render(tree: &Tree, dialect: DialectKind, json: bool) -> Result<String, CliError> {
    if json {
        let mut text =
            serde_json::to_string_pretty(tree).map_err(|err| CliError::Render(err.to_string()))?;
        text.push('\n');
        return Ok(text);
    }
    let body = serde_yaml::to_string(tree).map_err(|err| CliError::Render(err.to_string()))?;
    match dialect {
        DialectKind::Raml10 => Ok(format!("{RAML10_HEADER}\n{body}")),
        _ => Ok(body),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn integer_keys_become_strings() {
        let tree = parse_tree(
            Path::new("a.yaml"),
            "responses:\n  200:\n    description: ok\n  404: {}\n",
        )
        .unwrap();
        assert_eq!(
            tree,
            json!({"responses": {"200": {"description": "ok"}, "404": {}}})
        );
    }

    #[test]
    fn raml_header_is_a_comment() {
        let tree = parse_tree(Path::new("a.raml"), "#%RAML 1.0\ntitle: A\n").unwrap();
        assert_eq!(tree, json!({"title": "A"}));
    }

    #[test]
    fn json_input_parses_too() {
        let tree = parse_tree(Path::new("a.json"), r#"{"swagger": "2.0", "n": 1.5}"#).unwrap();
        assert_eq!(tree, json!({"swagger": "2.0", "n": 1.5}));
    }

    #[test]
    fn yaml_output_for_raml_carries_the_header() {
        let text = render(&json!({"title": "A"}), DialectKind::Raml10, false).unwrap();
        assert_eq!(text, "#%RAML 1.0\ntitle: A\n");
    }

    #[test]
    fn json_output_has_no_header() {
        let text = render(&json!({"title": "A"}), DialectKind::Raml10, true).unwrap();
        assert!(text.starts_with('{'));
    }

    #[test]
    fn malformed_text_names_the_file() {
        let err = parse_tree(Path::new("broken.yaml"), "a: [1, 2").unwrap_err();
        assert!(err.to_string().starts_with("broken.yaml is not YAML or JSON"));
    }
}
