//! Structural self-validation of exported trees
//!
//! These checks stand in for the destination front end: they confirm the tree has the shape
//! the dialect's parsers rely on (required keys, key spelling, resolvable `$ref`s). They never
//! fail; every problem comes back as an error [`Diagnostic`] located by JSON pointer.

use apiconv::ir::Verb;
use apiconv::tree::{join, kind_of, resolve_pointer, Map};
use apiconv::{Diagnostic, DialectKind, Tree};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static STATUS_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[1-5][0-9][0-9]$").unwrap());

/// Run the structural checks of `dialect` over `tree`.
pub fn structural(dialect: DialectKind, tree: &Tree) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    let Some(root) = tree.as_object() else {
        out.push(Diagnostic::error(
            "",
            format!("document root must be a mapping, found {}", kind_of(tree)),
        ));
        return out;
    };
    match dialect {
        DialectKind::Raml08 | DialectKind::Raml10 => raml(root, &mut out),
        DialectKind::Oas20 | DialectKind::Oas30 => oas(dialect, root, tree, &mut out),
    }
    out
}

fn raml(root: &Map, out: &mut Vec<Diagnostic>) {
    if !matches!(root.get("title"), Some(Value::String(_))) {
        out.push(Diagnostic::error("", "missing required key 'title'"));
    }
    for (key, value) in root {
        if key.starts_with('/') {
            raml_resource(&join("", key), value, out);
        }
    }
}

fn raml_resource(at: &str, value: &Value, out: &mut Vec<Diagnostic>) {
    let map = match value {
        Value::Null => return,
        Value::Object(map) => map,
        other => {
            out.push(Diagnostic::error(
                at,
                format!("resource must be a mapping, found {}", kind_of(other)),
            ));
            return;
        }
    };
    for (key, value) in map {
        let here = join(at, key);
        if key.starts_with('/') {
            raml_resource(&here, value, out);
        } else if key.parse::<Verb>().is_ok() {
            raml_method(&here, value, out);
        }
    }
}

fn raml_method(at: &str, value: &Value, out: &mut Vec<Diagnostic>) {
    let map = match value {
        Value::Null => return,
        Value::Object(map) => map,
        other => {
            out.push(Diagnostic::error(
                at,
                format!("method must be a mapping, found {}", kind_of(other)),
            ));
            return;
        }
    };
    if let Some(Value::Object(responses)) = map.get("responses") {
        for code in responses.keys() {
            if !STATUS_CODE.is_match(code) {
                out.push(Diagnostic::error(
                    join(&join(at, "responses"), code),
                    format!("'{code}' is not an HTTP status code"),
                ));
            }
        }
    }
}

fn oas(dialect: DialectKind, root: &Map, tree: &Tree, out: &mut Vec<Diagnostic>) {
    match dialect {
        DialectKind::Oas30 => match root.get("openapi") {
            Some(Value::String(version)) if version.starts_with("3.0") => {}
            _ => out.push(Diagnostic::error("/openapi", "expected an OpenAPI 3.0.x version")),
        },
        _ => {
            if root.get("swagger") != Some(&Value::String("2.0".to_string())) {
                out.push(Diagnostic::error("/swagger", "expected swagger: \"2.0\""));
            }
        }
    }

    match root.get("info") {
        Some(Value::Object(info)) => {
            for key in ["title", "version"] {
                if !matches!(info.get(key), Some(Value::String(_))) {
                    out.push(Diagnostic::error(
                        "/info",
                        format!("missing required key '{key}'"),
                    ));
                }
            }
        }
        _ => out.push(Diagnostic::error("", "missing required key 'info'")),
    }

    match root.get("paths") {
        Some(Value::Object(paths)) => {
            for (path, item) in paths {
                let at = join("/paths", path);
                if !path.starts_with('/') {
                    out.push(Diagnostic::error(&at, "paths must start with '/'"));
                }
                if let Value::Object(item) = item {
                    oas_path_item(dialect, &at, item, out);
                }
            }
        }
        _ => out.push(Diagnostic::error("", "missing required key 'paths'")),
    }

    references(tree, tree, "", out);
}

fn oas_path_item(dialect: DialectKind, at: &str, item: &Map, out: &mut Vec<Diagnostic>) {
    if let Some(Value::Array(parameters)) = item.get("parameters") {
        oas_parameters(&join(at, "parameters"), parameters, out);
    }
    for verb in Verb::ALL {
        let Some(operation) = item.get(verb.as_str()) else {
            continue;
        };
        let here = join(at, verb.as_str());
        let Value::Object(operation) = operation else {
            out.push(Diagnostic::error(&here, "operation must be a mapping"));
            continue;
        };
        match operation.get("responses") {
            Some(Value::Object(responses)) if !responses.is_empty() => {}
            _ => out.push(Diagnostic::error(
                &here,
                "an operation needs at least one response",
            )),
        }
        if let Some(Value::Array(parameters)) = operation.get("parameters") {
            oas_parameters(&join(&here, "parameters"), parameters, out);
            let bodies = parameters
                .iter()
                .filter(|p| p.get("in") == Some(&Value::String("body".to_string())))
                .count();
            if bodies > 1 {
                out.push(Diagnostic::error(&here, "more than one body parameter"));
            }
            if dialect == DialectKind::Oas30 && bodies > 0 {
                out.push(Diagnostic::error(&here, "body parameters are not allowed in 3.0"));
            }
        }
    }
}

fn oas_parameters(at: &str, parameters: &[Value], out: &mut Vec<Diagnostic>) {
    for (index, parameter) in parameters.iter().enumerate() {
        let here = join(at, &index.to_string());
        let Some(map) = parameter.as_object() else {
            out.push(Diagnostic::error(&here, "parameter must be a mapping"));
            continue;
        };
        if map.contains_key("$ref") {
            continue;
        }
        for key in ["name", "in"] {
            if !matches!(map.get(key), Some(Value::String(_))) {
                out.push(Diagnostic::error(
                    &here,
                    format!("missing required key '{key}'"),
                ));
            }
        }
        if map.get("in") == Some(&Value::String("path".to_string()))
            && map.get("required") != Some(&Value::Bool(true))
        {
            out.push(Diagnostic::error(&here, "path parameters must be required"));
        }
    }
}

fn references(root: &Tree, value: &Value, at: &str, out: &mut Vec<Diagnostic>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let here = join(at, key);
                if key == "$ref" {
                    if let Value::String(target) = child {
                        if target.starts_with('#') && resolve_pointer(root, target).is_none() {
                            out.push(Diagnostic::error(
                                &here,
                                format!("'{target}' does not resolve"),
                            ));
                        }
                    }
                } else if !key.starts_with("x-") {
                    references(root, child, &here, out);
                }
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                references(root, item, &join(at, &index.to_string()), out);
            }
        }
        _ => {}
    }
}
