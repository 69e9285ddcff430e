//! Annotation Codec
//!
//!     Each dialect has its own extension mechanism: RAML writes `(name): value` keys and
//!     declares them under `annotationTypes`, OAS writes `x-name: value` vendor keys. The codec
//!     moves values between those native keys and portable [`Annotation`] nodes.
//!
//! Naming
//!
//!     IR names keep track of where a construct came from, so a document that travels
//!     A -> B -> A gets back what B could not hold:
//!
//!         IR name         RAML key          OAS key
//!         name            (name)            x-raml-name
//!         oas-name        (oas-name)        x-name
//!
//!     Bare names are RAML-origin (user annotations and RAML-only structure), `oas-` names are
//!     OAS-origin (vendor extensions and OAS-only structure).
//!
//! Import and Export
//!
//!     [`import`] strips every key it consumes from the native map, so the caller never
//!     processes a key twice. [`export`] returns the native keys to merge into the node being
//!     written; exporting into RAML also registers each distinct name with the per-export
//!     [`AnnotationRegistry`], which later becomes the document's `annotationTypes`.
//!
//!     Structured OAS constructs with no RAML home (info blocks, tag lists, deprecation,
//!     exclusive bounds) are lifted into `oas-` annotations by [`oas`] and [`facets`].

pub mod facets;
pub mod oas;
mod registry;

pub use registry::{infer_shape, AnnotationRegistry};

use crate::context::ExportContext;
use crate::dialect::Family;
use crate::ir::{Annotation, AnnotationValue};
use crate::tree::Map;

/// Prefix of IR names that carry OAS-origin constructs.
pub const OAS_PREFIX: &str = "oas-";
/// Prefix of OAS vendor keys that carry RAML-origin constructs.
pub const RAML_VENDOR_PREFIX: &str = "x-raml-";

/// The RAML key for an IR annotation name.
pub fn raml_key(name: &str) -> String {
    format!("({name})")
}

/// The IR name of a RAML annotation key, if the key is one.
pub fn parse_raml_key(key: &str) -> Option<&str> {
    key.strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .filter(|name| !name.is_empty())
}

/// The OAS vendor key for an IR annotation name.
pub fn oas_key(name: &str) -> String {
    match name.strip_prefix(OAS_PREFIX) {
        Some(native) => format!("x-{native}"),
        None => format!("{RAML_VENDOR_PREFIX}{name}"),
    }
}

/// The IR name of an OAS vendor key, if the key is one.
pub fn parse_oas_key(key: &str) -> Option<String> {
    if let Some(name) = key.strip_prefix(RAML_VENDOR_PREFIX) {
        return (!name.is_empty()).then(|| name.to_string());
    }
    key.strip_prefix("x-")
        .filter(|name| !name.is_empty())
        .map(|name| format!("{OAS_PREFIX}{name}"))
}

fn parse_key(family: Family, key: &str) -> Option<String> {
    match family {
        Family::Raml => parse_raml_key(key).map(str::to_string),
        Family::Oas => parse_oas_key(key),
    }
}

/// Lift every annotation key out of a native map, in document order.
pub fn import(family: Family, map: &mut Map) -> Vec<Annotation> {
    let keys: Vec<String> = map
        .keys()
        .filter(|key| parse_key(family, key).is_some())
        .cloned()
        .collect();

    let mut annotations = Vec::with_capacity(keys.len());
    for key in keys {
        if let (Some(name), Some(value)) = (parse_key(family, &key), map.remove(&key)) {
            annotations.push(Annotation::new(name, AnnotationValue::from_json(&value)));
        }
    }
    annotations
}

/// Render annotations as native keys for the context's dialect.
pub fn export(annotations: &[Annotation], ctx: &mut ExportContext) -> Map {
    let mut map = Map::new();
    for annotation in annotations {
        let key = match ctx.family() {
            Family::Raml => {
                ctx.annotation_types.register(&annotation.name, &annotation.value);
                raml_key(&annotation.name)
            }
            Family::Oas => oas_key(&annotation.name),
        };
        map.insert(key, annotation.value.to_json());
    }
    map
}

/// Merge exported annotation keys into an existing native node.
pub fn export_into(target: &mut Map, annotations: &[Annotation], ctx: &mut ExportContext) {
    for (key, value) in export(annotations, ctx) {
        target.insert(key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::DialectKind;
    use serde_json::json;

    #[test]
    fn names_map_to_native_keys() {
        assert_eq!(raml_key("oas-info"), "(oas-info)");
        assert_eq!(oas_key("oas-info"), "x-info");
        assert_eq!(oas_key("rating"), "x-raml-rating");
        assert_eq!(parse_oas_key("x-raml-rating").as_deref(), Some("rating"));
        assert_eq!(parse_oas_key("x-internal-id").as_deref(), Some("oas-internal-id"));
        assert_eq!(parse_oas_key("description"), None);
        assert_eq!(parse_raml_key("(rating)"), Some("rating"));
        assert_eq!(parse_raml_key("()"), None);
        assert_eq!(parse_raml_key("rating"), None);
    }

    #[test]
    fn import_strips_consumed_keys() {
        let mut map = json!({
            "title": "Pets",
            "x-logo": {"url": "logo.png"},
            "x-raml-rating": 5
        })
        .as_object()
        .cloned()
        .unwrap();

        let annotations = import(Family::Oas, &mut map);
        assert_eq!(
            annotations,
            vec![
                Annotation::from_json("oas-logo", &json!({"url": "logo.png"})),
                Annotation::scalar("rating", 5),
            ]
        );
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("title"));
    }

    #[test]
    fn raml_export_registers_each_name_once() {
        let mut ctx = ExportContext::new(DialectKind::Raml10, &[]);
        let annotations = vec![Annotation::scalar("rating", 5)];
        let first = export(&annotations, &mut ctx);
        let second = export(&[Annotation::scalar("rating", "high")], &mut ctx);

        assert_eq!(first.get("(rating)"), Some(&json!(5)));
        assert_eq!(second.get("(rating)"), Some(&json!("high")));
        assert_eq!(ctx.annotation_types.declarations().len(), 1);
    }

    #[test]
    fn oas_export_does_not_register() {
        let mut ctx = ExportContext::new(DialectKind::Oas20, &[]);
        let map = export(&[Annotation::scalar("oas-logo", "a.png")], &mut ctx);
        assert_eq!(map.get("x-logo"), Some(&json!("a.png")));
        assert!(ctx.annotation_types.declarations().is_empty());
    }

    #[test]
    fn values_survive_a_trip_through_both_dialects() {
        let original = vec![
            Annotation::from_json("oas-info", &json!({"contact": {"name": "A"}})),
            Annotation::scalar("rating", 5),
        ];
        let mut raml_ctx = ExportContext::new(DialectKind::Raml10, &[]);
        let mut raml = export(&original, &mut raml_ctx);
        let imported = import(Family::Raml, &mut raml);
        assert_eq!(imported, original);

        let mut oas_ctx = ExportContext::new(DialectKind::Oas20, &[]);
        let mut oas = export(&imported, &mut oas_ctx);
        assert_eq!(import(Family::Oas, &mut oas), original);
    }
}
