//! Type Normalizer
//!
//!     The two dialect families encode scalar types differently. RAML 1.0 has a single type
//!     name (`date-only`, `datetime`) plus a `format` facet on numbers; OAS composes a base
//!     type with an independent format qualifier (`string` + `date-time`, `integer` + `int32`).
//!     Inside the IR every scalar carries exactly one [`InternalType`] tag.
//!
//! The High-Level Concept
//!
//!     Import: [`to_internal`] maps a (native type, native format) pair to a tag. A pair the
//!     dialect does not know is a [`TypeError`]; adapters turn that into the documented
//!     fallback (base tag plus a format hint, or `string` for an unknown type name).
//!
//!     Export: [`from_internal`] maps a tag back to a [`NativeType`]. When the destination has
//!     no native spelling for the tag, `side` carries the precise tag through the annotation
//!     side-channel (`(oas-format)` in RAML, `x-raml-type` in OAS). Importing with a side value
//!     ([`to_internal_with_side`]) prefers it over the native pair, which is what makes the
//!     round trip lossless.
//!
//! The Round-Trip Law
//!
//!     For every pair returned by [`legal_pairs`], `from_internal(to_internal(t, f), d)`
//!     yields `(t, f)` with no side value. For every tag, exporting and importing with the side
//!     channel yields the tag again. Both are exercised by the tests below.

mod tables;

use crate::dialect::DialectKind;
use crate::error::TypeError;
use crate::ir::InternalType;

/// A tag spelled in a dialect's native vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeType {
    /// `None` means the `type` key is omitted (OAS "any" and null schemas).
    pub type_name: Option<&'static str>,
    pub format: Option<&'static str>,
    /// The side-channel spelling, present only when the native pair is lossy.
    pub side: Option<&'static str>,
}

impl NativeType {
    pub(crate) const fn exact(type_name: &'static str, format: Option<&'static str>) -> Self {
        Self {
            type_name: Some(type_name),
            format,
            side: None,
        }
    }

    pub(crate) const fn lossy(
        type_name: Option<&'static str>,
        format: Option<&'static str>,
        side: &'static str,
    ) -> Self {
        Self {
            type_name,
            format,
            side: Some(side),
        }
    }

    pub fn is_lossless(&self) -> bool {
        self.side.is_none()
    }
}

/// Map a native (type, format) pair to its internal tag.
///
/// A type without a format maps to the bare tag (`integer` stays `integer`, never `int32`).
pub fn to_internal(
    dialect: DialectKind,
    type_name: &str,
    format: Option<&str>,
) -> Result<InternalType, TypeError> {
    tables::lookup(dialect, type_name, format).ok_or_else(|| TypeError::Unsupported {
        dialect,
        type_name: type_name.to_string(),
        format: format.map(str::to_string),
    })
}

/// Like [`to_internal`] but honours a side-channel value, and treats a missing `type` as
/// `any` (or whatever the side value says).
pub fn to_internal_with_side(
    dialect: DialectKind,
    type_name: Option<&str>,
    format: Option<&str>,
    side: Option<&str>,
) -> Result<InternalType, TypeError> {
    if let Some(tag) = side.and_then(from_side_channel) {
        return Ok(tag);
    }
    match type_name {
        Some(type_name) => to_internal(dialect, type_name, format),
        None => Ok(InternalType::Any),
    }
}

/// Expand a tag into the destination's native encoding. Total over every tag and dialect.
pub fn from_internal(tag: InternalType, dialect: DialectKind) -> NativeType {
    match dialect {
        DialectKind::Oas20 => tables::oas_native(tag, false),
        DialectKind::Oas30 => tables::oas_native(tag, true),
        DialectKind::Raml10 => tables::raml10_native(tag),
        DialectKind::Raml08 => tables::raml08_native(tag),
    }
}

/// Interpret a side-channel value. Accepts every tag name plus the OAS spellings `date` and
/// `date-time` and the RAML spelling `nil`.
pub fn from_side_channel(value: &str) -> Option<InternalType> {
    match value {
        "date" => Some(InternalType::DateOnly),
        "date-time" => Some(InternalType::DateTime),
        "nil" => Some(InternalType::Null),
        other => other.parse().ok(),
    }
}

/// Every (type, format) pair the dialect spells natively, in canonical form.
pub fn legal_pairs(dialect: DialectKind) -> Vec<(&'static str, Option<&'static str>)> {
    tables::legal_pairs(dialect)
}

/// Whether a bare type name is a built-in of the dialect (as opposed to a named type).
pub fn is_builtin(dialect: DialectKind, type_name: &str) -> bool {
    tables::lookup(dialect, type_name, None).is_some()
}

/// The outcome of resolving a type name that appears where a type is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Builtin(InternalType),
    /// The name is declared in the document's type catalog.
    Reference(String),
    /// Unknown everywhere; the caller uses `string` and records a warning.
    Coerced,
}

/// Resolve a type name against the dialect built-ins and then the document catalog.
pub fn resolve_name(
    dialect: DialectKind,
    type_name: &str,
    is_declared: &dyn Fn(&str) -> bool,
) -> Resolution {
    if let Some(tag) = tables::lookup(dialect, type_name, None) {
        Resolution::Builtin(tag)
    } else if is_declared(type_name) {
        Resolution::Reference(type_name.to_string())
    } else {
        Resolution::Coerced
    }
}
