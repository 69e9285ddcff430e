//! Template parameter substitution
//!
//! Traits and resource templates refer to their parameters as `<<name>>`, optionally piped
//! through transformations (`<<resourcePathName | !singularize>>`). Substitution runs over the
//! serialized IR of the fragment, so every string anywhere inside it is covered. Placeholders
//! without a value are left as they are. Numeric facets that held a placeholder are parsed once
//! their value is known.

use crate::dialect::DialectKind;
use crate::error::ConvertError;
use crate::ir::TEMPLATED_FACETS;
use crate::types;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Number, Value};
use std::collections::BTreeMap;
use tracing::{debug, warn};

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<<\s*([^<>|\s]+)\s*((?:\|\s*![A-Za-z]+\s*)*)>>").unwrap()
});

pub type Params = BTreeMap<String, String>;

/// Whether a string still mentions a template parameter.
pub fn has_placeholder(text: &str) -> bool {
    PLACEHOLDER.is_match(text)
}

/// Replace placeholders in one string.
pub fn substitute_str(text: &str, params: &Params) -> String {
    PLACEHOLDER
        .replace_all(text, |caps: &Captures| {
            let name = &caps[1];
            match params.get(name) {
                Some(value) => caps[2]
                    .split('|')
                    .map(|t| t.trim().trim_start_matches('!'))
                    .filter(|t| !t.is_empty())
                    .fold(value.clone(), |acc, transform| apply_transform(&acc, transform)),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

/// Substitute parameters everywhere inside a fragment.
///
/// Type references that turn into built-in names after substitution (`<<type>>` bound to
/// `integer`) become scalars again, and `Name[]` becomes an array of `Name`.
pub fn substitute<T>(fragment: &T, params: &Params, at: &str) -> Result<T, ConvertError>
where
    T: Serialize + DeserializeOwned,
{
    let mut value =
        serde_json::to_value(fragment).map_err(|e| ConvertError::malformed(at, e.to_string()))?;
    substitute_value(&mut value, params);
    rebind_references(&mut value);
    settle_templated(&mut value);
    serde_json::from_value(value).map_err(|e| ConvertError::malformed(at, e.to_string()))
}

fn substitute_value(value: &mut Value, params: &Params) {
    match value {
        Value::String(text) if text.contains("<<") => *text = substitute_str(text, params),
        Value::Array(items) => items
            .iter_mut()
            .for_each(|item| substitute_value(item, params)),
        Value::Object(map) => map
            .values_mut()
            .for_each(|item| substitute_value(item, params)),
        _ => {}
    }
}

/// Rewrite `{"kind": {"reference": name}}` nodes whose name is no longer a user type.
fn rebind_references(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(kind) = map.get_mut("kind") {
                if let Some(name) = kind.get("reference").and_then(Value::as_str) {
                    if let Some(rebound) = rebind(name) {
                        *kind = rebound;
                    }
                }
            }
            map.values_mut().for_each(rebind_references);
        }
        Value::Array(items) => items.iter_mut().for_each(rebind_references),
        _ => {}
    }
}

/// Parse every resolved `templated` facet into its typed field.
fn settle_templated(value: &mut Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(facets)) = map.get_mut("facets") {
                settle_facets(facets);
            }
            map.values_mut().for_each(settle_templated);
        }
        Value::Array(items) => items.iter_mut().for_each(settle_templated),
        _ => {}
    }
}

fn settle_facets(facets: &mut Map<String, Value>) {
    let Some(Value::Object(mut templated)) = facets.remove("templated") else {
        return;
    };
    for (native, field) in TEMPLATED_FACETS {
        let Some(text) = templated.get(*native).and_then(Value::as_str).map(str::to_string)
        else {
            continue;
        };
        if has_placeholder(&text) {
            continue;
        }
        let number = serde_json::from_str::<Number>(text.trim())
            .ok()
            .filter(|n| !field.ends_with("_length") || n.as_u64().is_some());
        match number {
            Some(number) => {
                facets.insert(field.to_string(), Value::Number(number));
                templated.remove(*native);
            }
            None => warn!(
                facet = *native,
                value = %text,
                "template parameter is not a number, facet kept as written"
            ),
        }
    }
    if !templated.is_empty() {
        facets.insert("templated".to_string(), Value::Object(templated));
    }
}

fn rebind(name: &str) -> Option<Value> {
    if let Some(item) = name.strip_suffix("[]") {
        let item_kind = rebind(item).unwrap_or_else(|| json!({ "reference": item }));
        return Some(json!({ "array": { "items": { "single": { "kind": item_kind } } } }));
    }
    types::to_internal(DialectKind::Raml10, name, None)
        .ok()
        .map(|tag| json!({ "scalar": tag }))
}

fn apply_transform(value: &str, transform: &str) -> String {
    match transform {
        "singularize" => singularize(value),
        "pluralize" => pluralize(value),
        "uppercase" => value.to_uppercase(),
        "lowercase" => value.to_lowercase(),
        "lowercamelcase" => camel(value, false),
        "uppercamelcase" => camel(value, true),
        "lowerunderscorecase" => joined(value, "_").to_lowercase(),
        "upperunderscorecase" => joined(value, "_").to_uppercase(),
        "lowerhyphencase" => joined(value, "-").to_lowercase(),
        "upperhyphencase" => joined(value, "-").to_uppercase(),
        other => {
            debug!(transform = other, "unknown template transformation ignored");
            value.to_string()
        }
    }
}

fn singularize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if lower.ends_with("ies") && word.len() > 3 {
        format!("{}y", &word[..word.len() - 3])
    } else if lower.ends_with("sses")
        || lower.ends_with("xes")
        || lower.ends_with("ches")
        || lower.ends_with("shes")
    {
        word[..word.len() - 2].to_string()
    } else if lower.ends_with('s') && !lower.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    let consonant_y = lower.ends_with('y')
        && !lower.ends_with("ay")
        && !lower.ends_with("ey")
        && !lower.ends_with("oy")
        && !lower.ends_with("uy");
    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if ["s", "x", "z", "ch", "sh"].iter().any(|end| lower.ends_with(end)) {
        format!("{word}es")
    } else {
        format!("{word}s")
    }
}

/// Split on separators and lower-to-upper case boundaries.
fn words(value: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut previous_lower = false;
    for c in value.chars() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            previous_lower = false;
            continue;
        }
        if c.is_uppercase() && previous_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        previous_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn camel(value: &str, upper_first: bool) -> String {
    words(value)
        .iter()
        .enumerate()
        .map(|(i, word)| {
            if i == 0 && !upper_first {
                word.to_lowercase()
            } else {
                capitalize(word)
            }
        })
        .collect()
}

fn joined(value: &str, separator: &str) -> String {
    words(value).join(separator)
}
