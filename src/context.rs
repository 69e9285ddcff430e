//! Per-conversion state threaded through import and export
//!
//!     Conversions share nothing. Each import gets an [`ImportContext`] that collects warnings
//!     and knows the document's type catalog; each export gets an [`ExportContext`] that owns
//!     the annotation registry for that one document.

use crate::annotations::AnnotationRegistry;
use crate::dialect::{DialectKind, Family};
use crate::error::Diagnostic;
use crate::ir::{AnnotationType, Document, InternalType, Type};
use crate::tree::Tree;
use crate::types::{self, NativeType, Resolution};
use std::collections::HashSet;
use tracing::warn;

/// An imported document and the fallbacks applied while building it.
#[derive(Debug, Clone)]
pub struct Imported {
    pub document: Document,
    pub warnings: Vec<Diagnostic>,
}

/// An exported native tree and the fallbacks applied while writing it.
#[derive(Debug, Clone)]
pub struct Exported {
    pub tree: Tree,
    pub warnings: Vec<Diagnostic>,
}

/// A scalar after normalization, with any format the tag set cannot hold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scalar {
    pub tag: InternalType,
    pub format_hint: Option<String>,
}

#[derive(Debug)]
pub struct ImportContext {
    pub dialect: DialectKind,
    pub diagnostics: Vec<Diagnostic>,
    declared_types: HashSet<String>,
}

impl ImportContext {
    pub fn new(dialect: DialectKind) -> Self {
        Self {
            dialect,
            diagnostics: Vec::new(),
            declared_types: HashSet::new(),
        }
    }

    pub fn family(&self) -> Family {
        self.dialect.family()
    }

    /// A context for a fragment written in another dialect (an inline JSON schema inside
    /// RAML, a RAML catalog carried through OAS), knowing the same named types.
    pub fn nested(&self, dialect: DialectKind) -> Self {
        Self {
            dialect,
            diagnostics: Vec::new(),
            declared_types: self.declared_types.clone(),
        }
    }

    /// Take over the warnings of a nested context.
    pub fn absorb(&mut self, nested: ImportContext) {
        self.diagnostics.extend(nested.diagnostics);
    }

    /// Make the document's named types known before any reference is resolved.
    pub fn declare_types<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.declared_types
            .extend(names.into_iter().map(Into::into));
    }

    pub fn is_declared(&self, name: &str) -> bool {
        self.declared_types.contains(name)
    }

    pub fn warn(&mut self, at: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(at, message);
        warn!(at = %diagnostic.at, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// Resolve a type name: a built-in scalar, a declared named type, or `string` with a
    /// warning.
    pub fn resolve_type_name(&mut self, name: &str, at: &str) -> Type {
        let declared = &self.declared_types;
        match types::resolve_name(self.dialect, name, &|n| declared.contains(n)) {
            Resolution::Builtin(tag) => Type::scalar(tag),
            Resolution::Reference(name) => Type::reference(name),
            Resolution::Coerced => {
                self.warn(at, format!("unknown type '{name}' coerced to string"));
                Type::scalar(InternalType::String)
            }
        }
    }

    /// Normalize a native scalar. Unknown formats fall back to the base tag and are kept as a
    /// hint; unknown side values are kept as a hint too.
    pub fn scalar(
        &mut self,
        type_name: Option<&str>,
        format: Option<&str>,
        side: Option<&str>,
        at: &str,
    ) -> Scalar {
        let unknown_side = side.filter(|value| types::from_side_channel(value).is_none());
        let known_side = side.filter(|value| types::from_side_channel(value).is_some());
        match types::to_internal_with_side(self.dialect, type_name, format, known_side) {
            Ok(tag) => Scalar {
                tag,
                format_hint: unknown_side.map(str::to_string),
            },
            Err(err) => {
                let base = type_name
                    .and_then(|name| types::to_internal(self.dialect, name, None).ok());
                match (base, format) {
                    (Some(tag), Some(format)) => {
                        self.warn(at, format!("{err}; kept as a format hint"));
                        Scalar {
                            tag,
                            format_hint: Some(format.to_string()),
                        }
                    }
                    _ => {
                        self.warn(at, format!("{err}; coerced to string"));
                        Scalar {
                            tag: InternalType::String,
                            format_hint: format.map(str::to_string),
                        }
                    }
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct ExportContext {
    pub dialect: DialectKind,
    pub annotation_types: AnnotationRegistry,
    pub diagnostics: Vec<Diagnostic>,
}

impl ExportContext {
    pub fn new(dialect: DialectKind, declared: &[AnnotationType]) -> Self {
        Self {
            dialect,
            annotation_types: AnnotationRegistry::seeded(declared),
            diagnostics: Vec::new(),
        }
    }

    pub fn family(&self) -> Family {
        self.dialect.family()
    }

    pub fn warn(&mut self, at: impl Into<String>, message: impl Into<String>) {
        let diagnostic = Diagnostic::warning(at, message);
        warn!(at = %diagnostic.at, "{}", diagnostic.message);
        self.diagnostics.push(diagnostic);
    }

    /// The destination spelling of a tag.
    pub fn native(&self, tag: InternalType) -> NativeType {
        types::from_internal(tag, self.dialect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_type_names_coerce_with_a_warning() {
        let mut ctx = ImportContext::new(DialectKind::Raml10);
        ctx.declare_types(["Pet"]);
        assert_eq!(ctx.resolve_type_name("Pet", "/types/Owner"), Type::reference("Pet"));
        assert_eq!(
            ctx.resolve_type_name("Cat", "/types/Owner"),
            Type::scalar(InternalType::String)
        );
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics[0].at, "/types/Owner");
    }

    #[test]
    fn unknown_formats_become_hints() {
        let mut ctx = ImportContext::new(DialectKind::Oas20);
        let scalar = ctx.scalar(Some("string"), Some("uuid"), None, "/definitions/Id");
        assert_eq!(
            scalar,
            Scalar {
                tag: InternalType::String,
                format_hint: Some("uuid".to_string()),
            }
        );
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn unknown_side_values_become_hints_silently() {
        let mut ctx = ImportContext::new(DialectKind::Raml10);
        let scalar = ctx.scalar(Some("string"), None, Some("uuid"), "/types/Id");
        assert_eq!(scalar.tag, InternalType::String);
        assert_eq!(scalar.format_hint.as_deref(), Some("uuid"));
        assert!(ctx.diagnostics.is_empty());

        let scalar = ctx.scalar(Some("string"), None, Some("byte"), "/types/Raw");
        assert_eq!(scalar.tag, InternalType::Byte);
        assert_eq!(scalar.format_hint, None);
    }
}
