//! Dialect registry for dialect discovery and selection
//!
//! This module provides a centralized registry for all available dialects.
//! Dialects are registered under their canonical name and can be looked up by that name or by
//! a loose alias ("raml", "swagger", "openapi").

use crate::dialect::{Dialect, ExportOptions};
use apiconv::ir::Document;
use apiconv::{ConvertError, DialectKind, Exported, Imported, Tree};
use std::collections::HashMap;

/// Registry of API description dialects
///
/// # Examples
///
/// ```ignore
/// let registry = DialectRegistry::default();
/// let imported = registry.import(&tree, "oas20")?;
/// let exported = registry.export(&imported.document, "raml10", &ExportOptions::default())?;
/// ```
pub struct DialectRegistry {
    dialects: HashMap<String, Box<dyn Dialect>>,
}

impl DialectRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        DialectRegistry {
            dialects: HashMap::new(),
        }
    }

    /// Register a dialect
    ///
    /// If a dialect with the same name already exists, it will be replaced.
    pub fn register<D: Dialect + 'static>(&mut self, dialect: D) {
        self.dialects
            .insert(dialect.name().to_string(), Box::new(dialect));
    }

    /// Get a dialect by name or alias
    pub fn get(&self, name: &str) -> Result<&dyn Dialect, ConvertError> {
        let canonical = match self.dialects.contains_key(name) {
            true => name.to_string(),
            false => name
                .parse::<DialectKind>()
                .map(|kind| kind.name().to_string())
                .unwrap_or_else(|_| name.to_string()),
        };
        self.dialects
            .get(&canonical)
            .map(|d| d.as_ref())
            .ok_or_else(|| ConvertError::DialectNotFound(name.to_string()))
    }

    /// Check if a dialect exists
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_ok()
    }

    /// List all available dialect names (sorted)
    pub fn list_dialects(&self) -> Vec<String> {
        let mut names: Vec<_> = self.dialects.keys().cloned().collect();
        names.sort();
        names
    }

    /// Import a native tree using the specified dialect
    pub fn import(&self, tree: &Tree, dialect: &str) -> Result<Imported, ConvertError> {
        let found = self.get(dialect)?;
        if !found.supports_import() {
            return Err(ConvertError::NotSupported(format!(
                "Dialect '{}' does not support import",
                dialect
            )));
        }
        found.import(tree)
    }

    /// Export a document using the specified dialect
    pub fn export(
        &self,
        doc: &Document,
        dialect: &str,
        options: &ExportOptions,
    ) -> Result<Exported, ConvertError> {
        let found = self.get(dialect)?;
        if !found.supports_export() {
            return Err(ConvertError::NotSupported(format!(
                "Dialect '{}' does not support export",
                dialect
            )));
        }
        found.export(doc, options)
    }

    /// Create a registry with the built-in dialects
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();

        registry.register(crate::dialects::raml::Raml08);
        registry.register(crate::dialects::raml::Raml10);
        registry.register(crate::dialects::oas::Oas20);
        registry.register(crate::dialects::oas::Oas30);

        registry
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Importer;
    use serde_json::json;

    // Test dialect
    struct TestDialect;
    impl Dialect for TestDialect {
        fn kind(&self) -> DialectKind {
            DialectKind::Raml10
        }
        fn name(&self) -> &str {
            "test"
        }
        fn description(&self) -> &str {
            "Test dialect"
        }
        fn importer(&self) -> Option<&dyn Importer> {
            Some(self)
        }
    }
    impl Importer for TestDialect {
        fn import(&self, _tree: &Tree) -> Result<Imported, ConvertError> {
            Ok(Imported {
                document: Document::new("test"),
                warnings: Vec::new(),
            })
        }
    }

    #[test]
    fn test_registry_creation() {
        let registry = DialectRegistry::new();
        assert_eq!(registry.list_dialects().len(), 0);
    }

    #[test]
    fn test_registry_register() {
        let mut registry = DialectRegistry::new();
        registry.register(TestDialect);

        assert!(registry.has("test"));
        assert_eq!(registry.list_dialects(), vec!["test"]);
    }

    #[test]
    fn test_registry_get_not_found() {
        let registry = DialectRegistry::new();
        match registry.get("nonexistent") {
            Err(ConvertError::DialectNotFound(name)) => assert_eq!(name, "nonexistent"),
            _ => panic!("Expected DialectNotFound"),
        }
    }

    #[test]
    fn test_registry_import() {
        let mut registry = DialectRegistry::new();
        registry.register(TestDialect);

        let imported = registry.import(&json!({}), "test").unwrap();
        assert_eq!(imported.document.title, "test");
    }

    #[test]
    fn test_registry_export_not_supported() {
        let mut registry = DialectRegistry::new();
        registry.register(TestDialect);

        let result = registry.export(&Document::new("x"), "test", &ExportOptions::default());
        assert!(matches!(result, Err(ConvertError::NotSupported(_))));
    }

    #[test]
    fn test_registry_defaults() {
        let registry = DialectRegistry::with_defaults();
        assert_eq!(
            registry.list_dialects(),
            vec!["oas20", "oas30", "raml08", "raml10"]
        );
    }

    #[test]
    fn test_registry_aliases() {
        let registry = DialectRegistry::default();
        assert_eq!(registry.get("swagger").unwrap().name(), "oas20");
        assert_eq!(registry.get("openapi").unwrap().name(), "oas30");
        assert_eq!(registry.get("raml").unwrap().name(), "raml10");
    }

    #[test]
    fn test_capabilities() {
        let registry = DialectRegistry::default();
        let raml08 = registry.get("raml08").unwrap();
        assert!(raml08.supports_import());
        assert!(!raml08.supports_export());
        let oas30 = registry.get("oas30").unwrap();
        assert!(!oas30.supports_import());
        assert!(oas30.supports_export());
        for name in ["raml10", "oas20"] {
            let dialect = registry.get(name).unwrap();
            assert!(dialect.supports_import() && dialect.supports_export());
        }
    }

    #[test]
    fn test_import_only_dialect_rejects_export() {
        let registry = DialectRegistry::default();
        let result = registry.export(&Document::new("x"), "raml08", &ExportOptions::default());
        assert!(matches!(result, Err(ConvertError::NotSupported(_))));
    }
}
