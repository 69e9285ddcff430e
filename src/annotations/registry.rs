//! Per-export registry of annotation type declarations

use crate::ir::{AnnotationType, AnnotationValue, InternalType, Property, Type};
use crate::MAX_DEPTH;
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

/// Annotation types a RAML export needs to declare, in first-use order.
///
/// One registry lives inside one export context; it is never shared between conversions.
/// The first value seen for a name decides its declared shape. Later values are not checked.
#[derive(Debug, Default)]
pub struct AnnotationRegistry {
    declarations: Vec<AnnotationType>,
    seen: HashSet<String>,
}

impl AnnotationRegistry {
    /// Start from declarations the document already carries.
    pub fn seeded(declared: &[AnnotationType]) -> Self {
        let mut registry = Self::default();
        for declaration in declared {
            if registry.seen.insert(declaration.name.clone()) {
                registry.declarations.push(declaration.clone());
            }
        }
        registry
    }

    /// Declare `name` on first use. Returns whether a new declaration was added.
    pub fn register(&mut self, name: &str, value: &AnnotationValue) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        debug!(annotation = name, "inferring annotation type from first use");
        self.seen.insert(name.to_string());
        self.declarations.push(AnnotationType {
            name: name.to_string(),
            shape: infer_shape(value),
            allowed_targets: Vec::new(),
        });
        true
    }

    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    pub fn declarations(&self) -> &[AnnotationType] {
        &self.declarations
    }

    pub fn into_declarations(self) -> Vec<AnnotationType> {
        self.declarations
    }
}

/// Infer a declaration shape from an example value.
pub fn infer_shape(value: &AnnotationValue) -> Type {
    infer_at_depth(value, 0)
}

fn infer_at_depth(value: &AnnotationValue, depth: usize) -> Type {
    if depth >= MAX_DEPTH {
        return Type::scalar(InternalType::Any);
    }
    match value {
        AnnotationValue::Scalar(scalar) => Type::scalar(scalar_tag(scalar)),
        AnnotationValue::Sequence(items) => {
            let item = items
                .first()
                .map(|first| infer_at_depth(first, depth + 1))
                .unwrap_or_default();
            Type::array(item)
        }
        AnnotationValue::Map(entries) => Type::object(
            entries
                .iter()
                .map(|entry| {
                    Property::new(
                        entry.name.clone(),
                        false,
                        infer_at_depth(&entry.value, depth + 1),
                    )
                })
                .collect(),
        ),
    }
}

fn scalar_tag(value: &Value) -> InternalType {
    match value {
        Value::Bool(_) => InternalType::Boolean,
        Value::Number(n) if n.is_i64() || n.is_u64() => InternalType::Integer,
        Value::Number(_) => InternalType::Number,
        Value::String(_) => InternalType::String,
        Value::Null => InternalType::Null,
        Value::Array(_) | Value::Object(_) => InternalType::Any,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::TypeKind;
    use serde_json::json;

    #[test]
    fn first_use_wins() {
        let mut registry = AnnotationRegistry::default();
        assert!(registry.register("rating", &AnnotationValue::from_json(&json!(5))));
        assert!(!registry.register("rating", &AnnotationValue::from_json(&json!("five"))));
        let declared = &registry.declarations()[0];
        assert_eq!(declared.shape.tag(), Some(InternalType::Integer));
    }

    #[test]
    fn seeded_declarations_are_kept() {
        let declared = AnnotationType {
            name: "rating".to_string(),
            shape: Type::scalar(InternalType::Number),
            allowed_targets: vec!["Method".to_string()],
        };
        let mut registry = AnnotationRegistry::seeded(&[declared.clone()]);
        assert!(!registry.register("rating", &AnnotationValue::from_json(&json!(1))));
        assert_eq!(registry.into_declarations(), vec![declared]);
    }

    #[test]
    fn infers_nested_shapes() {
        let value = AnnotationValue::from_json(&json!({
            "contact": {"name": "A"},
            "tags": ["x"],
            "weight": 1.5
        }));
        let shape = infer_shape(&value);
        let TypeKind::Object(object) = &shape.kind else {
            panic!("expected an object, got {shape:?}");
        };
        let names: Vec<_> = object.properties.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["contact", "tags", "weight"]);
        assert!(matches!(object.properties[1].schema.kind, TypeKind::Array(_)));
        assert_eq!(object.properties[2].schema.tag(), Some(InternalType::Number));
    }

    #[test]
    fn deep_values_stop_at_the_depth_bound() {
        let mut value = json!("leaf");
        for _ in 0..(MAX_DEPTH + 10) {
            value = json!([value]);
        }
        // Terminates and bottoms out in `any`.
        let mut shape = &infer_shape(&AnnotationValue::from_json(&value));
        let mut depth = 0;
        while let TypeKind::Array(array) = &shape.kind {
            let crate::ir::Items::Single(item) = &array.items else {
                unreachable!()
            };
            shape = item;
            depth += 1;
        }
        assert_eq!(depth, MAX_DEPTH);
        assert_eq!(shape.tag(), Some(InternalType::Any));
    }
}
