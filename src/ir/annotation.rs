//! Annotation nodes
//!
//! Annotations are the portable side-channel for metadata a destination dialect cannot hold
//! natively. Any IR node may carry any number of them.

use super::schema::Type;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    pub value: AnnotationValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationValue {
    /// A string, number, boolean or null.
    Scalar(Value),
    Sequence(Vec<AnnotationValue>),
    /// Nested named entries, e.g. the fields of a contact block.
    Map(Vec<Annotation>),
}

/// A declared annotation type (`annotationTypes` in RAML 1.0).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationType {
    pub name: String,
    pub shape: Type,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_targets: Vec<String>,
}

impl Annotation {
    pub fn new(name: impl Into<String>, value: AnnotationValue) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Build from an arbitrary JSON value.
    pub fn from_json(name: impl Into<String>, value: &Value) -> Self {
        Self::new(name, AnnotationValue::from_json(value))
    }

    pub fn scalar(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, AnnotationValue::Scalar(value.into()))
    }
}

impl AnnotationValue {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Array(items) => {
                AnnotationValue::Sequence(items.iter().map(AnnotationValue::from_json).collect())
            }
            Value::Object(map) => AnnotationValue::Map(
                map.iter()
                    .map(|(key, value)| Annotation::from_json(key.clone(), value))
                    .collect(),
            ),
            scalar => AnnotationValue::Scalar(scalar.clone()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            AnnotationValue::Scalar(value) => value.clone(),
            AnnotationValue::Sequence(items) => {
                Value::Array(items.iter().map(AnnotationValue::to_json).collect())
            }
            AnnotationValue::Map(entries) => Value::Object(
                entries
                    .iter()
                    .map(|entry| (entry.name.clone(), entry.value.to_json()))
                    .collect(),
            ),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AnnotationValue::Scalar(Value::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AnnotationValue::Scalar(Value::Bool(b)) => Some(*b),
            AnnotationValue::Scalar(Value::String(s)) => s.parse().ok(),
            _ => None,
        }
    }

    /// Look up an entry of a map value.
    pub fn get(&self, key: &str) -> Option<&AnnotationValue> {
        match self {
            AnnotationValue::Map(entries) => entries
                .iter()
                .find(|entry| entry.name == key)
                .map(|entry| &entry.value),
            _ => None,
        }
    }
}

impl From<Value> for AnnotationValue {
    fn from(value: Value) -> Self {
        AnnotationValue::from_json(&value)
    }
}

pub fn find_annotation<'a>(annotations: &'a [Annotation], name: &str) -> Option<&'a AnnotationValue> {
    annotations
        .iter()
        .find(|annotation| annotation.name == name)
        .map(|annotation| &annotation.value)
}

/// Remove the first annotation with that name and return its value.
pub fn take_annotation(annotations: &mut Vec<Annotation>, name: &str) -> Option<AnnotationValue> {
    let index = annotations
        .iter()
        .position(|annotation| annotation.name == name)?;
    Some(annotations.remove(index).value)
}

/// Replace or append an annotation.
pub fn set_annotation(annotations: &mut Vec<Annotation>, annotation: Annotation) {
    match annotations.iter_mut().find(|existing| existing.name == annotation.name) {
        Some(existing) => *existing = annotation,
        None => annotations.push(annotation),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_keeps_structure_and_order() {
        let value = json!({
            "contact": {"name": "API team", "email": "api@example.com"},
            "tags": ["a", "b"],
            "termsOfService": "https://example.com/tos"
        });
        let annotation = AnnotationValue::from_json(&value);
        assert_eq!(annotation.to_json(), value);
        assert_eq!(
            annotation.get("contact").and_then(|c| c.get("name")).and_then(AnnotationValue::as_str),
            Some("API team")
        );
    }

    #[test]
    fn take_removes_only_first_match() {
        let mut annotations = vec![
            Annotation::scalar("a", 1),
            Annotation::scalar("b", 2),
            Annotation::scalar("a", 3),
        ];
        let taken = take_annotation(&mut annotations, "a");
        assert_eq!(taken, Some(AnnotationValue::Scalar(json!(1))));
        assert_eq!(annotations.len(), 2);
        assert!(find_annotation(&annotations, "a").is_some());
    }

    #[test]
    fn set_replaces_existing() {
        let mut annotations = vec![Annotation::scalar("a", 1)];
        set_annotation(&mut annotations, Annotation::scalar("a", 2));
        set_annotation(&mut annotations, Annotation::scalar("b", true));
        assert_eq!(annotations.len(), 2);
        assert_eq!(find_annotation(&annotations, "a").unwrap().to_json(), json!(2));
        assert_eq!(find_annotation(&annotations, "b").unwrap().as_bool(), Some(true));
    }
}
