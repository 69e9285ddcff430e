//! OAS-origin constructs carried as annotations
//!
//! Native OAS keys that RAML has no place for are lifted into `oas-` annotations on import and
//! lowered back into native keys on OAS export. The tables pair each native key with its IR
//! annotation name for one kind of node.

use crate::ir::{take_annotation, Annotation, AnnotationValue};
use crate::tree::Map;

pub const INFO: &str = "oas-info";
pub const TAGS: &str = "oas-tags";
pub const TAGS_DEFINITION: &str = "oas-tags-definition";
pub const EXTERNAL_DOCS: &str = "oas-externalDocs";
pub const SUMMARY: &str = "oas-summary";
pub const DEPRECATED: &str = "oas-deprecated";
pub const COLLECTION_FORMAT: &str = "oas-collectionFormat";
pub const ALLOW_EMPTY_VALUE: &str = "oas-allowEmptyValue";
/// A response that stood for a shared catalog entry (`$ref: '#/responses/...'`).
pub const RESPONSE_REF: &str = "oas-response-ref";
/// The shared response catalog when it cannot be expressed natively.
pub const RESPONSES: &str = "oas-responses";
/// The `default` response of an operation.
pub const RESPONSES_DEFAULT: &str = "oas-responses-default";
/// The `name` of an OAS 2.0 body parameter.
pub const BODY_NAME: &str = "oas-body-name";
/// A request body the operation cannot do without.
pub const BODY_REQUIRED: &str = "oas-body-required";
/// The original name of a definition renamed to fit RAML type names.
pub const DEFINITION_NAME: &str = "oas-definition-name";
/// Side-channel spelling of a scalar type (also holds unknown formats such as `uuid`).
pub const FORMAT: &str = "oas-format";
/// Unsupported OAS security scheme kept verbatim.
pub const SECURITY_SCHEME: &str = "oas-securityScheme";

/// Document-level keys.
pub const DOCUMENT_KEYS: &[(&str, &str)] = &[("tags", TAGS_DEFINITION), ("externalDocs", EXTERNAL_DOCS)];

/// Operation-level keys.
pub const OPERATION_KEYS: &[(&str, &str)] = &[
    ("summary", SUMMARY),
    ("tags", TAGS),
    ("deprecated", DEPRECATED),
    ("externalDocs", EXTERNAL_DOCS),
];

/// Parameter-level keys.
pub const PARAMETER_KEYS: &[(&str, &str)] = &[
    ("collectionFormat", COLLECTION_FORMAT),
    ("allowEmptyValue", ALLOW_EMPTY_VALUE),
];

/// Keys of the `info` object that travel together as one `oas-info` annotation.
const INFO_KEYS: &[&str] = &["termsOfService", "contact", "license"];

/// Remove the listed native keys from `map` and return them as annotations.
pub fn lift_native(map: &mut Map, keys: &[(&str, &str)]) -> Vec<Annotation> {
    keys.iter()
        .filter_map(|(native, name)| {
            map.remove(*native)
                .map(|value| Annotation::from_json(*name, &value))
        })
        .collect()
}

/// Remove the listed annotations and write them back as native keys.
pub fn lower_native(annotations: &mut Vec<Annotation>, keys: &[(&str, &str)], map: &mut Map) {
    for (native, name) in keys {
        if let Some(value) = take_annotation(annotations, name) {
            map.insert(native.to_string(), value.to_json());
        }
    }
}

/// Lift the contact, license and terms of service of an `info` object into one annotation.
pub fn lift_info(info: &mut Map) -> Option<Annotation> {
    let entries: Vec<Annotation> = INFO_KEYS
        .iter()
        .filter_map(|key| {
            info.remove(*key)
                .map(|value| Annotation::from_json(*key, &value))
        })
        .collect();
    if entries.is_empty() {
        None
    } else {
        Some(Annotation::new(INFO, AnnotationValue::Map(entries)))
    }
}

/// Write an `oas-info` annotation back into an `info` object.
pub fn lower_info(annotations: &mut Vec<Annotation>, info: &mut Map) {
    if let Some(AnnotationValue::Map(entries)) = take_annotation(annotations, INFO) {
        for entry in entries {
            info.insert(entry.name, entry.value.to_json());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(value: serde_json::Value) -> Map {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn info_block_round_trips_without_field_loss() {
        let original = map(json!({
            "title": "Pets",
            "version": "1.0",
            "termsOfService": "https://example.com/tos",
            "contact": {"name": "API team", "url": "https://example.com", "email": "a@example.com"},
            "license": {"name": "MIT", "url": "https://opensource.org/licenses/MIT"}
        }));
        let mut info = original.clone();
        let annotation = lift_info(&mut info).unwrap();
        assert_eq!(info.len(), 2);

        let mut annotations = vec![annotation];
        lower_info(&mut annotations, &mut info);
        assert!(annotations.is_empty());
        assert_eq!(info, original);
    }

    #[test]
    fn bare_info_lifts_nothing() {
        let mut info = map(json!({"title": "Pets", "version": "1"}));
        assert!(lift_info(&mut info).is_none());
    }

    #[test]
    fn operation_keys_lift_and_lower() {
        let mut op = map(json!({
            "operationId": "listPets",
            "tags": ["pets"],
            "deprecated": true
        }));
        let mut annotations = lift_native(&mut op, OPERATION_KEYS);
        assert_eq!(
            annotations,
            vec![
                Annotation::from_json(TAGS, &json!(["pets"])),
                Annotation::scalar(DEPRECATED, true),
            ]
        );
        assert_eq!(op.len(), 1);

        lower_native(&mut annotations, OPERATION_KEYS, &mut op);
        assert_eq!(op.get("tags"), Some(&json!(["pets"])));
        assert_eq!(op.get("deprecated"), Some(&json!(true)));
    }
}
