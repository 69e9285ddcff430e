//! Error and diagnostic types
//!
//!     Structural and reference problems abort a conversion and come back as a typed
//!     [`ConvertError`]. Best-effort fallbacks (an unknown type coerced to `string`, a format the
//!     destination cannot express moved into an annotation) do not fail; they are recorded as
//!     warning [`Diagnostic`]s next to the result.

use crate::dialect::DialectKind;
use crate::tree::Tree;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors that abort a conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The native tree violates a structural precondition the adapter relies on.
    #[error("malformed input at {at}: {message}")]
    MalformedInput { at: String, message: String },

    /// A named reference does not resolve inside the document.
    #[error("unresolved {kind} reference '{name}' at {at}")]
    Reference {
        kind: RefKind,
        name: String,
        at: String,
    },

    /// No dialect registered under that name.
    #[error("dialect '{0}' not found")]
    DialectNotFound(String),

    /// The dialect exists but lacks the requested capability.
    #[error("{0}")]
    NotSupported(String),

    /// Self-validation rejected the exported tree.
    #[error("self-validation failed with {} diagnostic(s)", .diagnostics.len())]
    Validation {
        diagnostics: Vec<Diagnostic>,
        partial: Box<Tree>,
    },

    #[error(transparent)]
    Type(#[from] TypeError),
}

impl ConvertError {
    pub fn malformed(at: impl Into<String>, message: impl Into<String>) -> Self {
        ConvertError::MalformedInput {
            at: at.into(),
            message: message.into(),
        }
    }

    pub fn reference(kind: RefKind, name: impl Into<String>, at: impl Into<String>) -> Self {
        ConvertError::Reference {
            kind,
            name: name.into(),
            at: at.into(),
        }
    }
}

/// What kind of named entity a reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Type,
    Trait,
    ResourceTemplate,
    SecurityScheme,
    Parameter,
    Response,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RefKind::Type => "type",
            RefKind::Trait => "trait",
            RefKind::ResourceTemplate => "resource type",
            RefKind::SecurityScheme => "security scheme",
            RefKind::Parameter => "parameter",
            RefKind::Response => "response",
        };
        f.write_str(label)
    }
}

/// Type normalization failures.
///
/// Adapters never propagate these to the caller as-is: they apply the documented fallback and
/// record a warning instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    #[error("unsupported type '{type_name}' (format {}) in {dialect}", .format.as_deref().unwrap_or("none"))]
    Unsupported {
        dialect: DialectKind,
        type_name: String,
        format: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Warning,
    Error,
}

/// A located message about the input or output of a conversion.
///
/// `at` is a JSON-pointer style path into the native tree (`/paths/~1items/get`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub at: String,
    pub message: String,
}

impl Diagnostic {
    pub fn warning(at: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            at: at.into(),
            message: message.into(),
        }
    }

    pub fn error(at: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            at: at.into(),
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        let at = if self.at.is_empty() { "/" } else { &self.at };
        write!(f, "{level}: {at}: {}", self.message)
    }
}
