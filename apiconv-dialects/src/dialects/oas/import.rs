//! OAS 2.0 document reader
//!
//! # The Algorithm
//!
//! 1. **Root:**
//!    - `swagger` and `info.title` are required; a 3.0 `openapi` document is refused
//!    - `tags`, `externalDocs` and the rest of `info` become `oas-` annotations
//!    - `schemes`, `host` and `basePath` make the base URI unless `x-raml-baseUri` carries it
//!
//! 2. **Catalogs:**
//!    - Every definition is declared before any is read, under its RAML-safe name
//!    - Shared parameters and responses are read into the document's catalogs
//!    - RAML fragments carried under `x-raml-` keys are read with the RAML reader
//!
//! 3. **Paths:**
//!    - Each path item becomes a resource with an absolute path; the flat list is then
//!      nested by segment prefix and path parameters move to the segment that mentions them
//!
//! 4. **Reconstruction:**
//!    - `x-raml-type`, `x-raml-is` and `trait:` catalog keys turn back into resource type and
//!      trait applications
//!
//! Path-level parameters apply to every operation of the item; an operation parameter of the
//! same name and location replaces the inherited one.

use super::operations::{read_requirements, Sorted};
use super::schema::{read_schema, type_name_for, DISPLAY_NAME};
use super::security::read_definition;
use super::{carried, Reader};
use crate::dialects::raml::{self, fragments::catalog_entries};
use crate::mappings::flat_to_nested::paths_to_resources;
use apiconv::annotations::{self, oas};
use apiconv::ir::{
    take_annotation, Annotation, Document, Location, MediaTypeInfo, Named, Resource, Verb,
};
use apiconv::tree::{
    expect_map, expect_str, get_string, join, map_or_empty, string_list, Map, Tree,
};
use apiconv::{
    propagate, reconstruct, ConvertError, DialectKind, Family, ImportContext, Imported,
};
use serde_json::Value;
use tracing::debug;

pub fn import_document(tree: &Tree) -> Result<Imported, ConvertError> {
    let mut root = expect_map(tree, "")?.clone();
    if root.contains_key("openapi") {
        return Err(ConvertError::NotSupported(
            "OpenAPI 3.0 documents can be written but not read".to_string(),
        ));
    }
    match root.get("swagger").and_then(Value::as_str) {
        Some(version) if version.starts_with('2') => {}
        _ => return Err(ConvertError::malformed("/swagger", "expected swagger: \"2.0\"")),
    }

    let mut reader = Reader::new(ImportContext::new(DialectKind::Oas20));
    let mut info = root
        .get("info")
        .ok_or_else(|| ConvertError::malformed("", "missing required key 'info'"))
        .and_then(|info| expect_map(info, "/info"))?
        .clone();
    let mut doc = Document::new(expect_str(&info, "title", "/info")?);
    doc.version = get_string(&info, "version");
    doc.description = get_string(&info, "description");
    doc.annotations.extend(oas::lift_info(&mut info));
    doc.annotations
        .extend(oas::lift_native(&mut root, oas::DOCUMENT_KEYS));
    doc.annotations
        .extend(annotations::import(Family::Oas, &mut root));

    let schemes = string_list(root.get("schemes"));
    doc.protocols = schemes.iter().map(|s| s.to_ascii_uppercase()).collect();
    doc.base_uri = base_uri(&root, &schemes);
    if let Some(carried) = take_carried(&mut doc, carried::BASE_URI) {
        doc.base_uri = carried.as_str().map(str::to_string);
    }
    reader.consumes = string_list(root.get("consumes"));
    reader.produces = string_list(root.get("produces"));
    doc.media_types = MediaTypeInfo {
        consumes: reader.consumes.clone(),
        produces: reader.produces.clone(),
    };

    if let Some(definitions) = root.get("definitions") {
        let definitions = map_or_empty(definitions, "/definitions")?
            .cloned()
            .unwrap_or_default();
        reader
            .ctx
            .declare_types(definitions.keys().map(|name| type_name_for(name)));
        for (name, schema) in &definitions {
            let at = join("/definitions", name);
            let mut ty = read_schema(schema, &mut reader.ctx, &at)?;
            let type_name = type_name_for(name);
            if &type_name != name {
                ty.annotations
                    .push(Annotation::scalar(oas::DEFINITION_NAME, name.clone()));
            }
            doc.types.push(Named::new(type_name, ty));
        }
    }

    read_carried(&mut reader, &mut doc)?;

    if let Some(definitions) = root.get("securityDefinitions") {
        let here = "/securityDefinitions";
        for (name, value) in map_or_empty(definitions, here)?.into_iter().flatten() {
            let scheme = read_definition(name, value, &mut reader.ctx, &join(here, name))?;
            doc.security_schemes.push(scheme);
        }
    }
    doc.security = read_requirements(root.get("security"), "/security")?;

    if let Some(parameters) = root.get("parameters") {
        reader.parameters = map_or_empty(parameters, "/parameters")?
            .cloned()
            .unwrap_or_default();
        for (key, value) in reader.parameters.clone() {
            let at = join("/parameters", &key);
            let parameter = reader.read_parameter(expect_map(&value, &at)?, &at)?;
            doc.parameters.push(Named::new(key, parameter));
        }
    }
    if let Some(responses) = root.get("responses") {
        let produces = Reader::media_types(&reader.produces);
        for (key, value) in map_or_empty(responses, "/responses")?.into_iter().flatten() {
            let response = reader.read_response(key, value, &produces, &join("/responses", key))?;
            reader.responses.push(Named::new(key.clone(), response));
        }
        doc.responses = reader.responses.clone();
    }

    let mut flat = Vec::new();
    let paths = root
        .get("paths")
        .ok_or_else(|| ConvertError::malformed("", "missing required key 'paths'"))?;
    for (path, item) in map_or_empty(paths, "/paths")?.into_iter().flatten() {
        if path.starts_with("x-") {
            continue;
        }
        flat.push(reader.read_path_item(path, item, &join("/paths", path))?);
    }
    doc.resources = paths_to_resources(flat);

    let doc = reconstruct(propagate(doc))?;
    debug!(
        resources = doc.resources.len(),
        types = doc.types.len(),
        warnings = reader.ctx.diagnostics.len(),
        "OAS 2.0 document read"
    );
    Ok(Imported {
        document: doc,
        warnings: reader.ctx.diagnostics,
    })
}

/// `scheme://host/basePath`, with the first listed scheme or `http`.
fn base_uri(root: &Map, schemes: &[String]) -> Option<String> {
    let base_path = get_string(root, "basePath").filter(|p| p != "/");
    let Some(host) = get_string(root, "host") else {
        return base_path;
    };
    let scheme = schemes
        .first()
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_else(|| "http".to_string());
    Some(format!("{scheme}://{host}{}", base_path.unwrap_or_default()))
}

fn take_carried(doc: &mut Document, name: &str) -> Option<Value> {
    take_annotation(&mut doc.annotations, name).map(|value| value.to_json())
}

/// Read the RAML fragments carried at the root: catalogs OAS has no home for.
fn read_carried(reader: &mut Reader, doc: &mut Document) -> Result<(), ConvertError> {
    let mut raml = raml::Reader::new(reader.ctx.nested(DialectKind::Raml10));
    raml.media_types = doc.media_types.merged();
    let at = |name: &str| join("", &annotations::oas_key(name));

    if let Some(value) = take_carried(doc, carried::ANNOTATION_TYPES) {
        for (name, declaration) in catalog_entries(&value, &at(carried::ANNOTATION_TYPES))? {
            let here = join(&at(carried::ANNOTATION_TYPES), &name);
            let declaration = raml.read_annotation_type(&name, declaration, &here)?;
            doc.annotation_types.push(declaration);
        }
    }
    if let Some(value) = take_carried(doc, carried::SECURITY_SCHEMES) {
        for (name, declaration) in catalog_entries(&value, &at(carried::SECURITY_SCHEMES))? {
            let here = join(&at(carried::SECURITY_SCHEMES), &name);
            let scheme = raml.read_security_scheme(&name, &declaration, &here)?;
            doc.security_schemes.push(scheme);
        }
    }
    if let Some(value) = take_carried(doc, carried::TRAITS) {
        for (name, declaration) in catalog_entries(&value, &at(carried::TRAITS))? {
            let here = join(&at(carried::TRAITS), &name);
            doc.traits.push(raml.read_trait(&name, &declaration, &here)?);
        }
    }
    if let Some(value) = take_carried(doc, carried::RESOURCE_TYPES) {
        for (name, declaration) in catalog_entries(&value, &at(carried::RESOURCE_TYPES))? {
            let here = join(&at(carried::RESOURCE_TYPES), &name);
            let template = raml.read_template(&name, &declaration, &here)?;
            doc.resource_templates.push(template);
        }
    }
    if let Some(value) = take_carried(doc, carried::DOCUMENTATION) {
        doc.documentation = raml::read_documentation(Some(&value))?;
    }
    if let Some(value) = take_carried(doc, carried::BASE_URI_PARAMETERS) {
        doc.base_uri_parameters = raml.read_parameters(
            Some(&value),
            Location::Path,
            &at(carried::BASE_URI_PARAMETERS),
        )?;
    }
    reader.ctx.absorb(raml.ctx);
    Ok(())
}

impl Reader {
    pub fn read_path_item(
        &mut self,
        path: &str,
        value: &Value,
        at: &str,
    ) -> Result<Resource, ConvertError> {
        let mut resource = Resource::new("", path);
        let Some(map) = map_or_empty(value, at)? else {
            return Ok(resource);
        };
        let mut map = map.clone();
        if map.remove("$ref").is_some() {
            self.ctx
                .warn(join(at, "$ref"), "path item references are not resolved");
        }
        resource.display_name = map
            .remove(DISPLAY_NAME)
            .and_then(|v| v.as_str().map(str::to_string));
        resource.description = map
            .remove(&annotations::oas_key(carried::DESCRIPTION))
            .and_then(|v| v.as_str().map(str::to_string));

        let mut inherited = Sorted::default();
        let parameters = map.remove("parameters");
        self.read_parameter_list(parameters.as_ref(), &mut inherited, &join(at, "parameters"))?;
        resource.parameters = std::mem::take(&mut inherited.path);
        resource.annotations = annotations::import(Family::Oas, &mut map);

        for (key, operation) in &map {
            let Ok(verb) = key.parse::<Verb>() else {
                continue;
            };
            let (method, declared) =
                self.read_operation(verb, operation, &inherited, &join(at, key))?;
            for parameter in declared {
                match resource
                    .parameters
                    .iter_mut()
                    .find(|p| p.name == parameter.name)
                {
                    Some(existing) => *existing = parameter,
                    None => resource.parameters.push(parameter),
                }
            }
            resource.methods.push(method);
        }
        Ok(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiconv::ir::{InternalType, SchemeKind, Shape, Type, TypeKind};
    use apiconv::RefKind;
    use serde_json::json;

    fn import(tree: Value) -> Document {
        import_document(&tree).unwrap().document
    }

    fn minimal(extra: Value) -> Value {
        let mut tree = json!({
            "swagger": "2.0",
            "info": {"title": "Pets", "version": "1.0"},
            "paths": {}
        });
        if let (Value::Object(base), Value::Object(extra)) = (&mut tree, extra) {
            base.extend(extra);
        }
        tree
    }

    #[test]
    fn openapi_3_documents_are_refused() {
        let err = import_document(&json!({"openapi": "3.0.0"})).unwrap_err();
        assert!(matches!(err, ConvertError::NotSupported(_)));
    }

    #[test]
    fn info_title_is_required() {
        let err = import_document(&json!({"swagger": "2.0", "info": {}, "paths": {}}))
            .unwrap_err();
        assert!(matches!(err, ConvertError::MalformedInput { .. }));
    }

    #[test]
    fn base_uri_comes_from_host_and_base_path() {
        let doc = import(minimal(json!({
            "host": "api.example.com",
            "basePath": "/v1",
            "schemes": ["https", "http"]
        })));
        assert_eq!(doc.base_uri.as_deref(), Some("https://api.example.com/v1"));
        assert_eq!(doc.protocols, vec!["HTTPS", "HTTP"]);
    }

    #[test]
    fn carried_base_uri_wins() {
        let doc = import(minimal(json!({
            "host": "api.example.com",
            "basePath": "/v1",
            "x-raml-baseUri": "https://api.example.com/{version}"
        })));
        assert_eq!(
            doc.base_uri.as_deref(),
            Some("https://api.example.com/{version}")
        );
        assert!(doc.annotations.is_empty());
    }

    #[test]
    fn definition_names_are_made_raml_safe() {
        let doc = import(minimal(json!({
            "definitions": {
                "Pet[]": {"type": "object"},
                "Owner": {"properties": {"pets": {"type": "array",
                                                   "items": {"$ref": "#/definitions/Pet[]"}}}}
            }
        })));
        assert!(doc.find_type("Pet__").is_some());
        let TypeKind::Object(owner) = &doc.find_type("Owner").unwrap().kind else {
            panic!("expected an object");
        };
        assert_eq!(
            owner.properties[0].schema,
            Type::array(Type::reference("Pet__"))
        );
    }

    #[test]
    fn dangling_definition_references_fail() {
        let err = import_document(&minimal(json!({
            "definitions": {"Owner": {"properties": {"pet": {"$ref": "#/definitions/Pet"}}}}
        })))
        .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Reference {
                kind: RefKind::Type,
                ..
            }
        ));
    }

    #[test]
    fn paths_nest_by_segment() {
        let doc = import(minimal(json!({
            "paths": {
                "/pets/{id}": {
                    "parameters": [{"name": "id", "in": "path", "required": true,
                                    "type": "integer"}],
                    "get": {"responses": {"200": {"description": "ok"}}}
                },
                "/pets": {
                    "x-raml-displayName": "Pets",
                    "get": {"operationId": "listPets",
                            "responses": {"200": {"description": "ok"}}}
                }
            }
        })));
        assert_eq!(doc.resources.len(), 1);
        let pets = &doc.resources[0];
        assert_eq!(pets.display_name.as_deref(), Some("Pets"));
        assert_eq!(pets.methods[0].display_name.as_deref(), Some("listPets"));
        let item = &pets.resources[0];
        assert_eq!(item.relative_path, "/{id}");
        assert_eq!(
            item.parameters[0].shape,
            Shape::Inline(Type::scalar(InternalType::Integer))
        );
    }

    #[test]
    fn security_definitions_and_requirements() {
        let doc = import(minimal(json!({
            "securityDefinitions": {"key": {"type": "apiKey", "name": "X-Key", "in": "header"}},
            "security": [{"key": []}]
        })));
        assert_eq!(doc.security_schemes[0].kind, SchemeKind::ApiKey);
        assert_eq!(doc.security.unwrap()[0].scheme, "key");
    }

    #[test]
    fn carried_traits_come_back_as_applications() {
        let doc = import(minimal(json!({
            "x-raml-traits": {"paged": {"queryParameters": {"page": "integer"}}},
            "paths": {"/pets": {"get": {
                "x-raml-is": ["paged"],
                "parameters": [{"name": "page", "in": "query", "required": true,
                                "type": "integer"}],
                "responses": {"200": {"description": "ok"}}
            }}}
        })));
        assert_eq!(doc.traits[0].name, "paged");
        let method = &doc.resources[0].methods[0];
        assert_eq!(method.traits[0].name, "paged");
        assert!(method.parameters.is_empty());
    }

    #[test]
    fn document_keys_become_annotations() {
        let doc = import(minimal(json!({
            "tags": [{"name": "pets"}],
            "info": {"title": "Pets", "license": {"name": "MIT"}},
            "x-audience": "public"
        })));
        let names: Vec<&str> = doc.annotations.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["oas-info", "oas-tags-definition", "oas-audience"]);
    }
}
