//! OAS document writer, 2.0 and 3.0
//!
//! # The Algorithm
//!
//! 1. **Flattening:**
//!    - Traits and resource types are applied; unchanged trait items land in the shared
//!      catalogs, applications stay behind as `type`/`is` annotations
//!    - Path parameters are moved to the segment that mentions them
//!
//! 2. **Catalogs:**
//!    - Named types, shared parameters, shared responses and security schemes are written
//!      first, so operations know which schemes were dropped
//!
//! 3. **Paths:**
//!    - The resource tree is listed in pre-order; every resource with methods or metadata
//!      becomes one path item carrying the uri parameters of its whole chain
//!
//! 4. **Carried fragments:**
//!    - Constructs OAS cannot hold natively are written as RAML under `x-raml-` keys at the
//!      root, from the document as it was before flattening
//!
//! Keys are emitted in the order the OAS documents list them.

use super::schema::DISPLAY_NAME;
use super::security::write_definition;
use super::{carried, Writer};
use crate::dialect::ExportOptions;
use crate::dialects::raml;
use crate::mappings::nested_to_flat::resources_to_paths;
use apiconv::annotations::{self, oas};
use apiconv::ir::{
    take_annotation, Annotation, Document, InternalType, Location, Parameter, Resource,
    SecurityRequirement, Type,
};
use apiconv::params::path_parameter_names;
use apiconv::tree::{join, put, put_list, put_map, Map};
use apiconv::{flatten, propagate, ConvertError, DialectKind, Exported, FlattenOptions};
use serde_json::{json, Value};
use tracing::debug;

pub fn export_document(
    doc: &Document,
    dialect: DialectKind,
    options: &ExportOptions,
) -> Result<Exported, ConvertError> {
    let flat = propagate(flatten(
        doc,
        FlattenOptions {
            trait_catalog: options.trait_catalog,
            preserve_templates: options.preserve_templates,
        },
    )?);
    let mut writer = Writer::new(dialect, &flat, options);
    let v3 = writer.v3();
    let mut extra = flat.annotations.clone();

    let mut info = Map::new();
    info.insert("title".to_string(), json!(flat.title));
    put(&mut info, "description", flat.description.clone());
    info.insert(
        "version".to_string(),
        json!(flat.version.clone().unwrap_or_default()),
    );
    oas::lower_info(&mut extra, &mut info);

    let mut definitions = Map::new();
    for entry in &flat.types {
        let name = writer.schemas.definition_name(&entry.name).to_string();
        let mut ty = entry.item.clone();
        take_annotation(&mut ty.annotations, oas::DEFINITION_NAME);
        let at = if v3 {
            join("/components/schemas", &name)
        } else {
            join("/definitions", &name)
        };
        let value = writer.schemas.write(&ty, &mut writer.ctx, &at);
        definitions.insert(name, value);
    }

    let catalog = if v3 { "/components/parameters" } else { "/parameters" };
    let mut parameters = Map::new();
    for entry in &flat.parameters {
        let at = join(catalog, &entry.name);
        let value = writer.write_parameter(&entry.item, &at);
        parameters.insert(entry.name.clone(), value);
    }
    let catalog = if v3 { "/components/responses" } else { "/responses" };
    let mut responses = Map::new();
    for entry in &flat.responses {
        let mut response = entry.item.clone();
        response.reference = None;
        let value = writer.write_response(&response, &join(catalog, &entry.name));
        responses.insert(entry.name.clone(), value);
    }

    let mut raml = raml::Writer::new(&doc.annotation_types);
    let catalog = if v3 { "/components/securitySchemes" } else { "/securityDefinitions" };
    let mut schemes = Map::new();
    let mut carried_schemes = Map::new();
    for scheme in &flat.security_schemes {
        let at = join(catalog, &scheme.name);
        match write_definition(scheme, &mut writer.ctx, &at) {
            Some(value) => {
                schemes.insert(scheme.name.clone(), value);
            }
            None => {
                writer.ctx.warn(
                    &at,
                    format!(
                        "security scheme '{}' has no {} spelling, carried as RAML",
                        scheme.name,
                        dialect.name()
                    ),
                );
                writer.dropped_schemes.insert(scheme.name.clone());
                let value = raml.write_security_scheme(scheme, &at);
                carried_schemes.insert(scheme.name.clone(), value);
            }
        }
    }
    let security = flat
        .security
        .as_deref()
        .map(|requirements| writer.write_requirements(requirements, "/security"));

    let mut paths = Map::new();
    for entry in resources_to_paths(&flat.resources) {
        let resource = entry.resource;
        if !has_content(resource) {
            continue;
        }
        let path = entry.path();
        let at = join("/paths", path);
        let inherited = entry
            .ancestors
            .iter()
            .copied()
            .chain(std::iter::once(resource))
            .filter_map(|r| r.security.as_deref())
            .last();
        let mut uri_parameters: Vec<Parameter> = Vec::new();
        let declared = entry.path_parameters();
        for name in path_parameter_names(path) {
            let parameter = match declared.iter().find(|p| p.name == name) {
                Some(parameter) => (*parameter).clone(),
                None => Parameter::new(name, Location::Path, Type::scalar(InternalType::String)),
            };
            uri_parameters.push(parameter);
        }
        let item = writer.write_path_item(resource, &uri_parameters, inherited, &at);
        paths.insert(path.to_string(), item);
    }

    if !doc.documentation.is_empty() {
        let items: Vec<Value> = doc
            .documentation
            .iter()
            .map(|item| json!({"title": item.title, "content": item.content}))
            .collect();
        extra.push(Annotation::from_json(carried::DOCUMENTATION, &Value::Array(items)));
    }
    if !carried_schemes.is_empty() {
        let value = Value::Object(carried_schemes);
        extra.push(Annotation::from_json(carried::SECURITY_SCHEMES, &value));
    }
    if options.preserve_templates {
        carry_fragments(doc, &mut raml, &mut extra);
    }

    let mut root = Map::new();
    if v3 {
        root.insert("openapi".to_string(), json!("3.0.0"));
        root.insert("info".to_string(), Value::Object(info));
        if let Some(server) = writer.server(&flat) {
            root.insert("servers".to_string(), json!([server]));
        }
        root.insert("paths".to_string(), Value::Object(paths));
        let mut components = Map::new();
        put_map(&mut components, "schemas", definitions);
        put_map(&mut components, "parameters", parameters);
        put_map(&mut components, "responses", responses);
        put_map(&mut components, "securitySchemes", schemes);
        put_map(&mut root, "components", components);
    } else {
        root.insert("swagger".to_string(), json!("2.0"));
        root.insert("info".to_string(), Value::Object(info));
        writer.write_host(&flat, &mut root, &mut extra);
        if !flat.base_uri_parameters.is_empty() {
            let at = join("", &annotations::oas_key(carried::BASE_URI_PARAMETERS));
            let value = raml.write_parameters(&flat.base_uri_parameters, &at);
            extra.push(Annotation::from_json(
                carried::BASE_URI_PARAMETERS,
                &Value::Object(value),
            ));
        }
        put_list(&mut root, "consumes", &flat.media_types.consumes);
        put_list(&mut root, "produces", &flat.media_types.produces);
        root.insert("paths".to_string(), Value::Object(paths));
        put_map(&mut root, "definitions", definitions);
        put_map(&mut root, "parameters", parameters);
        put_map(&mut root, "responses", responses);
        put_map(&mut root, "securityDefinitions", schemes);
    }
    put(&mut root, "security", security);
    oas::lower_native(&mut extra, oas::DOCUMENT_KEYS, &mut root);
    annotations::export_into(&mut root, &extra, &mut writer.ctx);

    writer.ctx.diagnostics.append(&mut raml.ctx.diagnostics);
    let path_count = paths_written(&root);
    debug!(
        dialect = dialect.name(),
        paths = path_count,
        warnings = writer.ctx.diagnostics.len(),
        "OAS document written"
    );
    Ok(Exported {
        tree: Value::Object(root),
        warnings: writer.ctx.diagnostics,
    })
}

fn paths_written(root: &Map) -> usize {
    root.get("paths")
        .and_then(serde_json::Value::as_object)
        .map_or(0, Map::len)
}

fn has_content(resource: &Resource) -> bool {
    !resource.methods.is_empty()
        || resource.display_name.is_some()
        || resource.description.is_some()
        || !resource.annotations.is_empty()
}

/// Traits, resource types and annotation types as RAML, from the unflattened document.
fn carry_fragments(doc: &Document, raml: &mut raml::Writer, extra: &mut Vec<Annotation>) {
    let at = |name: &str| join("", &annotations::oas_key(name));
    // `oas-` declarations describe OAS keys and are rebuilt by every RAML export.
    let own_types: Vec<_> = doc
        .annotation_types
        .iter()
        .filter(|declaration| !declaration.name.starts_with(annotations::OAS_PREFIX))
        .collect();
    if !own_types.is_empty() {
        let mut declared = Map::new();
        for declaration in own_types {
            let here = join(&at(carried::ANNOTATION_TYPES), &declaration.name);
            let value = raml.write_annotation_type(declaration, &here);
            declared.insert(declaration.name.clone(), value);
        }
        extra.push(Annotation::from_json(
            carried::ANNOTATION_TYPES,
            &Value::Object(declared),
        ));
    }
    if !doc.traits.is_empty() {
        let mut traits = Map::new();
        for fragment in &doc.traits {
            let here = join(&at(carried::TRAITS), &fragment.name);
            traits.insert(fragment.name.clone(), raml.write_trait(fragment, &here));
        }
        extra.push(Annotation::from_json(carried::TRAITS, &Value::Object(traits)));
    }
    if !doc.resource_templates.is_empty() {
        let mut templates = Map::new();
        for template in &doc.resource_templates {
            let here = join(&at(carried::RESOURCE_TYPES), &template.name);
            templates.insert(template.name.clone(), raml.write_template(template, &here));
        }
        extra.push(Annotation::from_json(
            carried::RESOURCE_TYPES,
            &Value::Object(templates),
        ));
    }
}

/// The pieces of an absolute base URI: scheme, host and base path.
fn split_base_uri(uri: &str) -> Option<(&str, &str, &str)> {
    let (scheme, rest) = uri.split_once("://")?;
    match rest.find('/') {
        Some(index) => Some((scheme, &rest[..index], &rest[index..])),
        None => Some((scheme, rest, "")),
    }
}

impl Writer {
    fn write_path_item(
        &mut self,
        resource: &Resource,
        uri_parameters: &[Parameter],
        inherited: Option<&[SecurityRequirement]>,
        at: &str,
    ) -> Value {
        let mut map = Map::new();
        let mut extra = resource.annotations.clone();
        put(&mut map, DISPLAY_NAME, resource.display_name.clone());
        if let Some(description) = &resource.description {
            if self.v3() {
                map.insert("description".to_string(), json!(description));
            } else {
                extra.push(Annotation::scalar(carried::DESCRIPTION, description.clone()));
            }
        }
        if !uri_parameters.is_empty() {
            let here = join(at, "parameters");
            let values: Vec<Value> = uri_parameters
                .iter()
                .map(|parameter| self.write_parameter(parameter, &join(&here, &parameter.name)))
                .collect();
            map.insert("parameters".to_string(), Value::Array(values));
        }
        for method in &resource.methods {
            let verb = method.verb.as_str();
            let value = match (&method.security, inherited) {
                (None, Some(requirements)) => {
                    let mut method = method.clone();
                    method.security = Some(requirements.to_vec());
                    self.write_operation(&method, &join(at, verb))
                }
                _ => self.write_operation(method, &join(at, verb)),
            };
            map.insert(verb.to_string(), value);
        }
        annotations::export_into(&mut map, &extra, &mut self.ctx);
        Value::Object(map)
    }

    /// `host`, `basePath` and `schemes`. A base URI the reader would not rebuild the same way
    /// travels verbatim as `x-raml-baseUri`.
    fn write_host(&mut self, doc: &Document, root: &mut Map, extra: &mut Vec<Annotation>) {
        let schemes: Vec<String> = doc.protocols.iter().map(|p| p.to_ascii_lowercase()).collect();
        let Some(original) = &doc.base_uri else {
            put_list(root, "schemes", &schemes);
            return;
        };
        let resolved = match &doc.version {
            Some(version) => original.replace("{version}", version),
            None => original.clone(),
        };
        let rebuilt = match split_base_uri(&resolved) {
            Some((_, host, base_path)) => {
                root.insert("host".to_string(), json!(host));
                if !base_path.is_empty() {
                    root.insert("basePath".to_string(), json!(base_path));
                }
                let scheme = schemes.first().map(String::as_str).unwrap_or("http");
                format!("{scheme}://{host}{base_path}")
            }
            None => {
                root.insert("basePath".to_string(), json!(resolved));
                resolved.clone()
            }
        };
        put_list(root, "schemes", &schemes);
        if &rebuilt != original {
            extra.push(Annotation::scalar(carried::BASE_URI, original.clone()));
        }
    }

    /// The single OAS 3.0 server, with base URI parameters as server variables.
    fn server(&mut self, doc: &Document) -> Option<Value> {
        let url = doc.base_uri.as_ref()?;
        let mut variables = Map::new();
        for name in path_parameter_names(url) {
            let declared = doc.base_uri_parameters.iter().find(|p| p.name == name);
            let schema = declared.and_then(|p| p.shape.inline());
            let default = match (name.as_str(), schema) {
                ("version", _) if doc.version.is_some() => doc.version.clone().map(Value::String),
                (_, Some(schema)) => schema
                    .facets
                    .default
                    .clone()
                    .or_else(|| schema.facets.enum_values.first().cloned()),
                _ => None,
            };
            let mut variable = Map::new();
            let default = match default {
                Some(Value::String(text)) => text,
                Some(other) => other.to_string(),
                None => {
                    self.ctx.warn(
                        "/servers/0/variables",
                        format!("server variable '{name}' has no default, written empty"),
                    );
                    String::new()
                }
            };
            variable.insert("default".to_string(), json!(default));
            if let Some(values) = schema.map(|s| &s.facets.enum_values).filter(|v| !v.is_empty()) {
                variable.insert("enum".to_string(), Value::Array(values.clone()));
            }
            put(
                &mut variable,
                "description",
                declared.and_then(|p| p.description.clone()),
            );
            variables.insert(name, Value::Object(variable));
        }
        let mut server = Map::new();
        server.insert("url".to_string(), json!(url));
        put_map(&mut server, "variables", variables);
        Some(Value::Object(server))
    }
}
