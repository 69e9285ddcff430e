//! RAML document reader
//!
//! # The Algorithm
//!
//! 1. **Root:**
//!    - `title` is required; annotations, `version`, `baseUri`, `protocols`, `mediaType` and
//!      `documentation` are read as they stand
//!
//! 2. **Catalogs:**
//!    - Every named type is declared before any is read, so declarations may refer to each
//!      other in any order
//!    - Then annotation types, security schemes, traits and resource types
//!
//! 3. **Resources:**
//!    - Keys starting with `/` are resources, keys naming a verb are methods, read in
//!      document order
//!
//! 4. **References:**
//!    - Every trait, resource type and security scheme named anywhere must be declared
//!
//! Trait and template applications stay references; they are only applied when the document
//! is written for a dialect without them.

use super::fragments::catalog_entries;
use super::methods::read_is;
use super::types::read_type;
use super::Reader;
use apiconv::annotations::{self, oas};
use apiconv::inheritance::check_references;
use apiconv::ir::{
    take_annotation, AnnotationType, Document, DocumentationItem, Location, MediaTypeInfo, Named,
    Resource, TemplateRef, Verb,
};
use apiconv::tree::{
    expect_map, expect_str, get_string, join, kind_of, map_or_empty, string_list, Tree,
};
use apiconv::{ConvertError, DialectKind, Family, ImportContext, Imported};
use serde_json::Value;
use tracing::debug;

pub fn import_document(tree: &Tree, dialect: DialectKind) -> Result<Imported, ConvertError> {
    let mut root = expect_map(tree, "")?.clone();
    let mut reader = Reader::new(ImportContext::new(dialect));
    let mut doc = Document::new(expect_str(&root, "title", "")?);

    doc.annotations = annotations::import(Family::Raml, &mut root);
    let response_catalog = take_annotation(&mut doc.annotations, oas::RESPONSES);
    doc.version = get_string(&root, "version");
    doc.description = get_string(&root, "description");
    doc.base_uri = get_string(&root, "baseUri");
    doc.protocols = string_list(root.get("protocols"))
        .into_iter()
        .map(|protocol| protocol.to_ascii_uppercase())
        .collect();
    let media_types = string_list(root.get("mediaType"));
    reader.media_types = media_types.clone();
    doc.media_types = MediaTypeInfo::both(media_types);
    doc.documentation = read_documentation(root.get("documentation"))?;
    if root.contains_key("uses") {
        reader
            .ctx
            .warn("/uses", "libraries are not resolved, their declarations are unknown");
    }

    let mut type_entries = Vec::new();
    for key in ["types", "schemas"] {
        if let Some(value) = root.get(key) {
            for (name, declaration) in catalog_entries(value, &join("", key))? {
                type_entries.push((key, name, declaration));
            }
        }
    }
    reader
        .ctx
        .declare_types(type_entries.iter().map(|(_, name, _)| name.clone()));
    for (key, name, declaration) in &type_entries {
        let at = join(&join("", key), name);
        let ty = read_type(declaration, &mut reader.ctx, &at)?;
        doc.types.push(Named::new(name.clone(), ty));
    }

    if let Some(value) = root.get("annotationTypes") {
        for (name, declaration) in catalog_entries(value, "/annotationTypes")? {
            let at = join("/annotationTypes", &name);
            let declaration = reader.read_annotation_type(&name, declaration, &at)?;
            doc.annotation_types.push(declaration);
        }
    }

    if let Some(value) = root.get("securitySchemes") {
        for (name, declaration) in catalog_entries(value, "/securitySchemes")? {
            let at = join("/securitySchemes", &name);
            let scheme = reader.read_security_scheme(&name, &declaration, &at)?;
            doc.security_schemes.push(scheme);
        }
    }
    if let Some(value) = root.get("traits") {
        for (name, declaration) in catalog_entries(value, "/traits")? {
            let at = join("/traits", &name);
            doc.traits.push(reader.read_trait(&name, &declaration, &at)?);
        }
    }
    if let Some(value) = root.get("resourceTypes") {
        for (name, declaration) in catalog_entries(value, "/resourceTypes")? {
            let at = join("/resourceTypes", &name);
            let template = reader.read_template(&name, &declaration, &at)?;
            doc.resource_templates.push(template);
        }
    }

    doc.security = reader.read_secured_by(root.get("securedBy"), "/securedBy")?;
    doc.base_uri_parameters = reader.read_parameters(
        root.get("baseUriParameters"),
        Location::Path,
        "/baseUriParameters",
    )?;

    if let Some(catalog) = response_catalog {
        let at = join("", &annotations::raml_key(oas::RESPONSES));
        let catalog = catalog.to_json();
        if let Some(entries) = map_or_empty(&catalog, &at)? {
            for (key, value) in entries {
                let response = reader.read_response(key, value, &join(&at, key))?;
                doc.responses.push(Named::new(key.clone(), response));
            }
        }
    }

    for (key, value) in &root {
        if key.starts_with('/') {
            let resource = reader.read_resource("", key, value, &join("", key))?;
            doc.resources.push(resource);
        }
    }

    check_references(&doc)?;
    debug!(
        resources = doc.resources.len(),
        types = doc.types.len(),
        "RAML document read"
    );
    Ok(Imported {
        document: doc,
        warnings: reader.ctx.diagnostics,
    })
}

pub fn read_documentation(value: Option<&Value>) -> Result<Vec<DocumentationItem>, ConvertError> {
    let items = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ConvertError::malformed(
                "/documentation",
                format!("expected a sequence, found {}", kind_of(other)),
            ))
        }
    };
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let at = join("/documentation", &index.to_string());
            let map = expect_map(item, &at)?;
            Ok(DocumentationItem {
                title: expect_str(map, "title", &at)?.to_string(),
                content: expect_str(map, "content", &at)?.to_string(),
            })
        })
        .collect()
}

impl Reader {
    pub fn read_annotation_type(
        &mut self,
        name: &str,
        mut declaration: Value,
        at: &str,
    ) -> Result<AnnotationType, ConvertError> {
        let allowed_targets = match &mut declaration {
            Value::Object(map) => string_list(map.remove("allowedTargets").as_ref()),
            _ => Vec::new(),
        };
        Ok(AnnotationType {
            name: name.to_string(),
            shape: read_type(&declaration, &mut self.ctx, at)?,
            allowed_targets,
        })
    }

    pub fn read_resource(
        &mut self,
        parent: &str,
        relative: &str,
        value: &Value,
        at: &str,
    ) -> Result<Resource, ConvertError> {
        let mut resource = Resource::new(parent, relative);
        let Some(map) = map_or_empty(value, at)? else {
            return Ok(resource);
        };
        let mut map = map.clone();
        resource.annotations = annotations::import(Family::Raml, &mut map);
        resource.display_name = get_string(&map, "displayName");
        resource.description = get_string(&map, "description");
        resource.parameters = self.read_parameters(
            map.get("uriParameters"),
            Location::Path,
            &join(at, "uriParameters"),
        )?;
        resource.template = match map.get("type") {
            None | Some(Value::Null) => None,
            Some(reference) => Some(TemplateRef::from_json(reference).ok_or_else(|| {
                ConvertError::malformed(join(at, "type"), "expected a resource type reference")
            })?),
        };
        resource.traits = read_is(map.get("is"), &join(at, "is"))?;
        resource.security = self.read_secured_by(map.get("securedBy"), &join(at, "securedBy"))?;

        for (key, value) in &map {
            let here = join(at, key);
            if key.starts_with('/') {
                let child = self.read_resource(&resource.path, key, value, &here)?;
                resource.resources.push(child);
            } else if let Ok(verb) = key.parse::<Verb>() {
                let method = self.read_method(verb, value, &here)?;
                resource.methods.push(method);
            }
        }
        Ok(resource)
    }
}
