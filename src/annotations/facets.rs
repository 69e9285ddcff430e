//! Schema facets RAML cannot hold natively
//!
//! OAS schemas carry `title`, `readOnly` and boolean `exclusiveMinimum`/`exclusiveMaximum`;
//! RAML types have none of these. Exporting into RAML lowers them into `oas-` annotations,
//! importing from RAML lifts them back into facets.

use crate::ir::{take_annotation, Annotation, AnnotationValue, Facets};
use serde_json::Value;

pub const TITLE: &str = "oas-title";
pub const READ_ONLY: &str = "oas-readOnly";
pub const EXCLUSIVE_MINIMUM: &str = "oas-exclusiveMinimum";
pub const EXCLUSIVE_MAXIMUM: &str = "oas-exclusiveMaximum";

/// Annotations that stand in for facets RAML lacks. The facets themselves are untouched.
pub fn lower(facets: &Facets) -> Vec<Annotation> {
    let mut annotations = Vec::new();
    if let Some(title) = &facets.title {
        annotations.push(Annotation::scalar(TITLE, title.clone()));
    }
    if facets.read_only {
        annotations.push(Annotation::scalar(READ_ONLY, true));
    }
    if facets.exclusive_minimum {
        annotations.push(Annotation::scalar(EXCLUSIVE_MINIMUM, true));
    }
    if facets.exclusive_maximum {
        annotations.push(Annotation::scalar(EXCLUSIVE_MAXIMUM, true));
    }
    annotations
}

/// Move facet annotations back into facets, removing them from the list.
pub fn lift(annotations: &mut Vec<Annotation>, facets: &mut Facets) {
    if let Some(AnnotationValue::Scalar(Value::String(title))) = take_annotation(annotations, TITLE)
    {
        facets.title = Some(title);
    }
    facets.read_only |= take_flag(annotations, READ_ONLY);
    facets.exclusive_minimum |= take_flag(annotations, EXCLUSIVE_MINIMUM);
    facets.exclusive_maximum |= take_flag(annotations, EXCLUSIVE_MAXIMUM);
}

fn take_flag(annotations: &mut Vec<Annotation>, name: &str) -> bool {
    take_annotation(annotations, name)
        .and_then(|value| value.as_bool())
        .unwrap_or(false)
}
