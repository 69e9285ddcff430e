//! Operations, parameters, bodies and responses
//!
//!     | OAS 2.0                          | IR                                          |
//!     |----------------------------------|---------------------------------------------|
//!     | `in: query`, `in: header`        | method parameters and headers               |
//!     | `in: path`                       | uri parameters of the resource              |
//!     | `in: body` + `consumes`          | one body per media type                     |
//!     | `in: formData`                   | one form body with an object schema         |
//!     | `$ref: '#/parameters/<key>'`     | query and header: a catalog reference,      |
//!     |                                  | anything else: the entry inlined            |
//!     | `schema` + `produces`            | one response body per media type            |
//!
//!     OAS 3.0 is written with `requestBody` and `content` maps instead.

use super::carried;
use super::schema::{is_inline_scalar, read_schema, DISPLAY_NAME};
use super::{Reader, Writer};
use apiconv::annotations::{self, oas};
use apiconv::ir::{
    is_form_media_type, lookup, take_annotation, Annotation, Body, InternalType, Items, Location,
    Method, Parameter, Property, Response, SecurityRequirement, Shape, Type, TypeKind, Verb,
};
use apiconv::tree::{
    expect_map, expect_str, get_bool, get_string, join, kind_of, map_or_empty, put, put_list,
    string_list, Map,
};
use apiconv::{ConvertError, Family, RefKind, MAX_DEPTH};
use serde_json::{json, Value};

/// Response examples keyed by media type (OAS 2.0).
pub const EXAMPLES: &str = "oas-examples";
const RESPONSE_KEYS: &[(&str, &str)] = &[("examples", EXAMPLES)];

/// Keys of a non-body parameter that describe the parameter rather than its schema.
const PARAMETER_FIELDS: &[&str] = &["name", "in", "required", "description"];

const BODY_PARAMETER: &str = "body";
const FORM_MEDIA_TYPE: &str = "application/x-www-form-urlencoded";
const MULTIPART_MEDIA_TYPE: &str = "multipart/form-data";

fn catalog_key(reference: &str, catalog: &str) -> Option<String> {
    reference
        .strip_prefix(&format!("#/{catalog}/"))
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
}

/// Parameters of one operation, by destination.
#[derive(Debug, Clone, Default)]
pub struct Sorted {
    pub path: Vec<Parameter>,
    pub query: Vec<Parameter>,
    pub headers: Vec<Parameter>,
    pub body: Option<Parameter>,
    pub form: Vec<Parameter>,
}

impl Sorted {
    /// Add a parameter; a later one replaces an earlier one of the same name and location.
    pub fn push(&mut self, parameter: Parameter) {
        let slot = match parameter.location {
            Location::Path => &mut self.path,
            Location::Query => &mut self.query,
            Location::Header => &mut self.headers,
            Location::Form => &mut self.form,
            Location::Body => {
                self.body = Some(parameter);
                return;
            }
        };
        match slot.iter_mut().find(|p| p.same_name(&parameter.name)) {
            Some(existing) => *existing = parameter,
            None => slot.push(parameter),
        }
    }
}

impl Reader {
    pub fn read_parameter_list(
        &mut self,
        value: Option<&Value>,
        sorted: &mut Sorted,
        at: &str,
    ) -> Result<(), ConvertError> {
        let items = match value {
            None | Some(Value::Null) => return Ok(()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(ConvertError::malformed(
                    at,
                    format!("expected a sequence, found {}", kind_of(other)),
                ))
            }
        };
        for (index, item) in items.iter().enumerate() {
            let parameter = self.read_parameter_ref(item, &join(at, &index.to_string()))?;
            sorted.push(parameter);
        }
        Ok(())
    }

    /// Read a parameter object, following a `$ref` into the catalog.
    pub fn read_parameter_ref(&mut self, value: &Value, at: &str) -> Result<Parameter, ConvertError> {
        let map = expect_map(value, at)?;
        let Some(reference) = map.get("$ref") else {
            return self.read_parameter(map, at);
        };
        let key = reference
            .as_str()
            .and_then(|r| catalog_key(r, "parameters"))
            .ok_or_else(|| {
                ConvertError::malformed(join(at, "$ref"), "expected a reference into #/parameters")
            })?;
        let entry = self
            .parameters
            .get(&key)
            .cloned()
            .ok_or_else(|| ConvertError::reference(RefKind::Parameter, &key, at))?;
        let entry_at = join("/parameters", &key);
        let mut parameter = self.read_parameter(expect_map(&entry, &entry_at)?, &entry_at)?;
        if matches!(parameter.location, Location::Query | Location::Header) {
            parameter.shape = Shape::Ref(key);
        }
        Ok(parameter)
    }

    pub fn read_parameter(&mut self, map: &Map, at: &str) -> Result<Parameter, ConvertError> {
        let name = expect_str(map, "name", at)?.to_string();
        let location_name = expect_str(map, "in", at)?;
        let location = Location::from_oas(location_name).ok_or_else(|| {
            ConvertError::malformed(
                join(at, "in"),
                format!("unknown parameter location '{location_name}'"),
            )
        })?;

        let mut rest = map.clone();
        for key in PARAMETER_FIELDS {
            rest.remove(*key);
        }
        let display_name = rest
            .remove(DISPLAY_NAME)
            .and_then(|v| v.as_str().map(str::to_string));
        let mut extra = oas::lift_native(&mut rest, oas::PARAMETER_KEYS);
        let schema = match location {
            Location::Body => {
                let schema = rest.remove("schema").ok_or_else(|| {
                    ConvertError::malformed(at, "body parameter needs a 'schema'")
                })?;
                extra.extend(annotations::import(Family::Oas, &mut rest));
                read_schema(&schema, &mut self.ctx, &join(at, "schema"))?
            }
            _ => {
                // The parameter object doubles as its schema; vendor keys belong to the parameter.
                let mut schema = read_schema(&Value::Object(rest), &mut self.ctx, at)?;
                extra.append(&mut schema.annotations);
                schema
            }
        };

        let required = get_bool(map, "required").unwrap_or(location == Location::Path);
        let mut parameter = Parameter::new(name, location, schema).required(required);
        parameter.description = get_string(map, "description");
        parameter.display_name = display_name;
        parameter.annotations = extra;
        Ok(parameter)
    }

    /// Read one operation. Returns the method and the path parameters it declares.
    pub fn read_operation(
        &mut self,
        verb: Verb,
        value: &Value,
        inherited: &Sorted,
        at: &str,
    ) -> Result<(Method, Vec<Parameter>), ConvertError> {
        let mut map = expect_map(value, at)?.clone();
        let mut method = Method::new(verb);
        let mut extra = oas::lift_native(&mut map, oas::OPERATION_KEYS);
        extra.extend(annotations::import(Family::Oas, &mut map));
        method.display_name = get_string(&map, "operationId");
        method.description = get_string(&map, "description");
        method.protocols = string_list(map.get("schemes"))
            .iter()
            .map(|scheme| scheme.to_ascii_uppercase())
            .collect();
        let consumes = match string_list(map.get("consumes")) {
            own if own.is_empty() => Self::media_types(&self.consumes),
            own => own,
        };
        let produces = match string_list(map.get("produces")) {
            own if own.is_empty() => Self::media_types(&self.produces),
            own => own,
        };

        let mut sorted = inherited.clone();
        self.read_parameter_list(map.get("parameters"), &mut sorted, &join(at, "parameters"))?;
        method.parameters = sorted.query;
        method.headers = sorted.headers;
        if let Some(body) = sorted.body {
            method.bodies = request_bodies(body, &consumes);
        }
        if !sorted.form.is_empty() {
            if method.bodies.is_empty() {
                method.bodies = form_bodies(sorted.form, &consumes);
            } else {
                self.ctx.warn(
                    join(at, "parameters"),
                    "formData parameters next to a body parameter are dropped",
                );
            }
        }

        if let Some(responses) = map.get("responses") {
            let here = join(at, "responses");
            for (code, value) in expect_map(responses, &here)? {
                if code.starts_with("x-") {
                    continue;
                }
                let response = self.read_response(code, value, &produces, &join(&here, code))?;
                method.responses.push(response);
            }
        }
        method.security = read_requirements(map.get("security"), &join(at, "security"))?;
        method.annotations = extra;
        Ok((method, sorted.path))
    }

    pub fn read_response(
        &mut self,
        code: &str,
        value: &Value,
        produces: &[String],
        at: &str,
    ) -> Result<Response, ConvertError> {
        let map = expect_map(value, at)?;
        if let Some(reference) = map.get("$ref") {
            let key = reference
                .as_str()
                .and_then(|r| catalog_key(r, "responses"))
                .ok_or_else(|| {
                    ConvertError::malformed(join(at, "$ref"), "expected a reference into #/responses")
                })?;
            let mut response = lookup(&self.responses, &key)
                .cloned()
                .ok_or_else(|| ConvertError::reference(RefKind::Response, &key, at))?;
            response.code = code.to_string();
            response.reference = Some(key);
            return Ok(response);
        }

        let mut map = map.clone();
        let mut response = Response::new(code);
        let mut extra = oas::lift_native(&mut map, RESPONSE_KEYS);
        extra.extend(annotations::import(Family::Oas, &mut map));
        response.description = get_string(&map, "description").filter(|d| !d.is_empty());
        if let Some(headers) = map.get("headers") {
            let here = join(at, "headers");
            for (name, header) in map_or_empty(headers, &here)?.into_iter().flatten() {
                let header_at = join(&here, name);
                let mut header = expect_map(header, &header_at)?.clone();
                header.insert("name".to_string(), json!(name));
                header.insert("in".to_string(), json!("header"));
                response.headers.push(self.read_parameter(&header, &header_at)?);
            }
        }
        if let Some(schema) = map.get("schema") {
            let schema = read_schema(schema, &mut self.ctx, &join(at, "schema"))?;
            response.bodies = produces
                .iter()
                .map(|media_type| Body::new(media_type.clone(), schema.clone()))
                .collect();
        }
        response.annotations = extra;
        Ok(response)
    }
}

fn request_bodies(parameter: Parameter, consumes: &[String]) -> Vec<Body> {
    let payload: Vec<&String> = consumes.iter().filter(|m| !is_form_media_type(m)).collect();
    let media_types = if payload.is_empty() {
        consumes.iter().collect()
    } else {
        payload
    };
    let mut extra = parameter.annotations;
    if parameter.name != BODY_PARAMETER {
        extra.insert(0, Annotation::scalar(oas::BODY_NAME, parameter.name.clone()));
    }
    media_types
        .into_iter()
        .map(|media_type| Body {
            media_type: media_type.clone(),
            required: parameter.required,
            description: parameter.description.clone(),
            shape: parameter.shape.clone(),
            annotations: extra.clone(),
        })
        .collect()
}

fn form_bodies(parameters: Vec<Parameter>, consumes: &[String]) -> Vec<Body> {
    let has_file = parameters
        .iter()
        .any(|p| p.shape.inline().and_then(Type::tag) == Some(InternalType::File));
    let mut media_types: Vec<String> = consumes
        .iter()
        .filter(|m| is_form_media_type(m))
        .cloned()
        .collect();
    if media_types.is_empty() {
        let fallback = if has_file { MULTIPART_MEDIA_TYPE } else { FORM_MEDIA_TYPE };
        media_types.push(fallback.to_string());
    }

    let properties: Vec<Property> = parameters
        .into_iter()
        .map(|parameter| {
            let mut schema = match parameter.shape {
                Shape::Inline(schema) => schema,
                Shape::Ref(_) => Type::default(),
            };
            if schema.facets.description.is_none() {
                schema.facets.description = parameter.description;
            }
            if schema.facets.display_name.is_none() {
                schema.facets.display_name = parameter.display_name;
            }
            schema.annotations.extend(parameter.annotations);
            Property::new(parameter.name, parameter.required, schema)
        })
        .collect();
    let schema = Type::object(properties);
    media_types
        .into_iter()
        .map(|media_type| Body::new(media_type, schema.clone()))
        .collect()
}

/// Read a `security` list. An empty requirement object means anonymous access.
pub fn read_requirements(
    value: Option<&Value>,
    at: &str,
) -> Result<Option<Vec<SecurityRequirement>>, ConvertError> {
    let items = match value {
        None => return Ok(None),
        Some(Value::Array(items)) => items,
        Some(other) => {
            return Err(ConvertError::malformed(
                at,
                format!("expected a sequence, found {}", kind_of(other)),
            ))
        }
    };
    let mut requirements = Vec::new();
    for (index, item) in items.iter().enumerate() {
        let entries = expect_map(item, &join(at, &index.to_string()))?;
        if entries.is_empty() {
            requirements.push(SecurityRequirement::new("null"));
        }
        for (scheme, scopes) in entries {
            requirements.push(SecurityRequirement {
                scheme: scheme.clone(),
                scopes: string_list(Some(scopes)),
            });
        }
    }
    Ok(Some(requirements))
}

fn fits_inline(ty: &Type) -> bool {
    match &ty.kind {
        TypeKind::Array(array) => {
            matches!(&array.items, Items::Single(item) if is_inline_scalar(item))
        }
        _ => is_inline_scalar(ty),
    }
}

fn unique_media_types<'a>(bodies: impl Iterator<Item = &'a Body>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for body in bodies {
        if !out.contains(&body.media_type) {
            out.push(body.media_type.clone());
        }
    }
    out
}

impl Writer {
    fn catalog_reference(&self, catalog: &str, key: &str) -> Value {
        let token = key.replace('~', "~0").replace('/', "~1");
        let prefix = if self.v3() {
            format!("#/components/{catalog}/")
        } else {
            format!("#/{catalog}/")
        };
        json!({ "$ref": format!("{prefix}{token}") })
    }

    /// Follow references until a type OAS 2.0 can write on a non-body parameter.
    fn inline_schema(&self, ty: &Type) -> Option<Type> {
        let mut current = ty;
        for _ in 0..MAX_DEPTH {
            let TypeKind::Reference(name) = &current.kind else {
                return fits_inline(current).then(|| current.clone());
            };
            current = self.types.get(name)?;
        }
        None
    }

    fn media_type_of(&self, body: &Body) -> String {
        if body.media_type.is_empty() {
            self.default_media_type.clone()
        } else {
            body.media_type.clone()
        }
    }

    pub fn write_parameter(&mut self, parameter: &Parameter, at: &str) -> Value {
        let schema = match &parameter.shape {
            Shape::Ref(key) => return self.catalog_reference("parameters", key),
            Shape::Inline(schema) => schema,
        };
        let mut map = Map::new();
        map.insert("name".to_string(), json!(parameter.name));
        map.insert("in".to_string(), json!(parameter.location.as_str()));
        put(&mut map, "description", parameter.description.clone());
        if parameter.required || parameter.location == Location::Path {
            map.insert("required".to_string(), Value::Bool(true));
        }
        let mut extra = parameter.annotations.clone();
        if self.v3() || parameter.location == Location::Body {
            let written = self.schemas.write(schema, &mut self.ctx, &join(at, "schema"));
            map.insert("schema".to_string(), written);
        } else {
            let inline = self.inline_schema(schema).unwrap_or_else(|| {
                self.ctx.warn(
                    at,
                    format!(
                        "parameter '{}' needs a scalar type in OAS 2.0, written as string",
                        parameter.name
                    ),
                );
                Type::scalar(InternalType::String)
            });
            if let Value::Object(written) = self.schemas.write(&inline, &mut self.ctx, at) {
                map.extend(written);
            }
            oas::lower_native(&mut extra, oas::PARAMETER_KEYS, &mut map);
        }
        put(&mut map, DISPLAY_NAME, parameter.display_name.clone());
        annotations::export_into(&mut map, &extra, &mut self.ctx);
        Value::Object(map)
    }

    fn write_header(&mut self, header: &Parameter, at: &str) -> Value {
        let mut value = self.write_parameter(header, at);
        if let Value::Object(map) = &mut value {
            map.remove("name");
            map.remove("in");
            if !self.v3() {
                map.remove("required");
            }
        }
        value
    }

    fn body_schema(&mut self, body: &Body, at: &str) -> Value {
        match &body.shape {
            Shape::Inline(schema) => self.schemas.write(schema, &mut self.ctx, at),
            Shape::Ref(key) => {
                self.ctx.warn(at, format!("body names catalog entry '{key}', written as any"));
                json!({})
            }
        }
    }

    /// OAS 2.0 body or formData parameters for a method's bodies.
    fn write_body_parameters(&mut self, bodies: &[Body], at: &str) -> Vec<Value> {
        let is_form = |body: &&Body| {
            body.is_form() && matches!(body.shape.inline().map(|t| &t.kind), Some(TypeKind::Object(_)))
        };
        let (forms, payloads): (Vec<&Body>, Vec<&Body>) = bodies.iter().partition(is_form);
        let Some(first) = payloads.first() else {
            return match forms.first() {
                Some(form) => self.write_form_parameters(form, at),
                None => Vec::new(),
            };
        };
        for other in &payloads[1..] {
            if other.shape != first.shape {
                self.ctx.warn(
                    join(at, &other.media_type),
                    format!(
                        "OAS 2.0 holds one body schema, kept the one for '{}'",
                        first.media_type
                    ),
                );
            }
        }
        if !forms.is_empty() {
            self.ctx.warn(at, "form bodies next to a payload body are dropped");
        }
        vec![self.write_body_parameter(first, at)]
    }

    fn write_body_parameter(&mut self, body: &Body, at: &str) -> Value {
        if let Shape::Ref(key) = &body.shape {
            return self.catalog_reference("parameters", key);
        }
        let mut extra = body.annotations.clone();
        let name = take_annotation(&mut extra, oas::BODY_NAME)
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_else(|| BODY_PARAMETER.to_string());
        let mut map = Map::new();
        map.insert("name".to_string(), json!(name));
        map.insert("in".to_string(), json!("body"));
        put(&mut map, "description", body.description.clone());
        if body.required {
            map.insert("required".to_string(), Value::Bool(true));
        }
        let schema = self.body_schema(body, &join(at, "schema"));
        map.insert("schema".to_string(), schema);
        annotations::export_into(&mut map, &extra, &mut self.ctx);
        Value::Object(map)
    }

    fn write_form_parameters(&mut self, body: &Body, at: &str) -> Vec<Value> {
        let Some(TypeKind::Object(object)) = body.shape.inline().map(|ty| &ty.kind) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(object.properties.len());
        for property in &object.properties {
            let mut schema = property.schema.clone();
            let mut parameter = Parameter::new(property.name.clone(), Location::Form, Type::default())
                .required(property.required);
            parameter.description = schema.facets.description.take();
            parameter.display_name = schema.facets.display_name.take();
            parameter.annotations = std::mem::take(&mut schema.annotations);
            parameter.shape = Shape::Inline(schema);
            out.push(self.write_parameter(&parameter, &join(at, &property.name)));
        }
        out
    }

    /// OAS 3.0 `requestBody`.
    fn write_request_body(&mut self, bodies: &[Body], at: &str) -> Option<Value> {
        let first = bodies.first()?;
        let mut map = Map::new();
        put(&mut map, "description", first.description.clone());
        if bodies.iter().any(|body| body.required) {
            map.insert("required".to_string(), Value::Bool(true));
        }
        let mut content = Map::new();
        for body in bodies {
            let media_type = self.media_type_of(body);
            let schema = self.body_schema(body, &join(&join(at, "content"), &media_type));
            content.insert(media_type, json!({ "schema": schema }));
        }
        map.insert("content".to_string(), Value::Object(content));
        annotations::export_into(&mut map, &first.annotations, &mut self.ctx);
        Some(Value::Object(map))
    }

    pub fn write_response(&mut self, response: &Response, at: &str) -> Value {
        if let Some(key) = &response.reference {
            if self.responses.contains(key) {
                return self.catalog_reference("responses", key);
            }
        }
        let mut map = Map::new();
        map.insert(
            "description".to_string(),
            json!(response.description.clone().unwrap_or_default()),
        );
        let mut extra = response.annotations.clone();

        let mut headers = Map::new();
        for header in &response.headers {
            let value = self.write_header(header, &join(&join(at, "headers"), &header.name));
            headers.insert(header.name.clone(), value);
        }

        if self.v3() {
            if !headers.is_empty() {
                map.insert("headers".to_string(), Value::Object(headers));
            }
            let mut content = Map::new();
            for body in &response.bodies {
                let media_type = self.media_type_of(body);
                let schema = self.body_schema(body, &join(&join(at, "content"), &media_type));
                content.insert(media_type, json!({ "schema": schema }));
            }
            if !content.is_empty() {
                map.insert("content".to_string(), Value::Object(content));
            }
        } else {
            if let Some(first) = response.bodies.first() {
                if response.bodies.iter().any(|body| body.shape != first.shape) {
                    self.ctx.warn(
                        at,
                        format!(
                            "OAS 2.0 holds one response schema, kept the one for '{}'",
                            first.media_type
                        ),
                    );
                }
                let schema = self.body_schema(first, &join(at, "schema"));
                map.insert("schema".to_string(), schema);
            }
            if !headers.is_empty() {
                map.insert("headers".to_string(), Value::Object(headers));
            }
            oas::lower_native(&mut extra, RESPONSE_KEYS, &mut map);
        }
        annotations::export_into(&mut map, &extra, &mut self.ctx);
        Value::Object(map)
    }

    /// The `responses` object. OAS requires at least one response.
    pub fn write_responses(&mut self, responses: &[Response], at: &str) -> Map {
        let mut map = Map::new();
        for response in responses {
            let value = self.write_response(response, &join(at, &response.code));
            map.insert(response.code.clone(), value);
        }
        if map.is_empty() {
            map.insert("default".to_string(), json!({ "description": "" }));
        }
        map
    }

    pub fn write_requirements(&mut self, requirements: &[SecurityRequirement], at: &str) -> Value {
        let mut out = Vec::with_capacity(requirements.len());
        for requirement in requirements {
            if requirement.scheme == "null" {
                out.push(json!({}));
                continue;
            }
            if self.dropped_schemes.contains(&requirement.scheme) {
                self.ctx.warn(
                    at,
                    format!(
                        "security scheme '{}' is not written natively, requirement dropped",
                        requirement.scheme
                    ),
                );
                continue;
            }
            let mut entry = Map::new();
            entry.insert(requirement.scheme.clone(), json!(requirement.scopes));
            out.push(Value::Object(entry));
        }
        Value::Array(out)
    }

    pub fn write_operation(&mut self, method: &Method, at: &str) -> Value {
        let mut map = Map::new();
        let mut extra = method.annotations.clone();
        oas::lower_native(&mut extra, oas::OPERATION_KEYS, &mut map);
        put(&mut map, "operationId", method.display_name.clone());
        put(&mut map, "description", method.description.clone());

        let parameters_at = join(at, "parameters");
        let mut parameters = Vec::new();
        for parameter in method.parameters.iter().chain(&method.headers) {
            let value = self.write_parameter(parameter, &join(&parameters_at, &parameter.name));
            parameters.push(value);
        }

        if self.v3() {
            if !parameters.is_empty() {
                map.insert("parameters".to_string(), Value::Array(parameters));
            }
            if let Some(body) = self.write_request_body(&method.bodies, &join(at, "requestBody")) {
                map.insert("requestBody".to_string(), body);
            }
            if !method.protocols.is_empty() {
                extra.push(Annotation::from_json(carried::PROTOCOLS, &json!(method.protocols)));
            }
        } else {
            parameters.extend(self.write_body_parameters(&method.bodies, &parameters_at));
            let consumes = unique_media_types(method.bodies.iter());
            if !consumes.is_empty() && consumes != Reader::media_types(&self.media_types.consumes) {
                put_list(&mut map, "consumes", &consumes);
            }
            let produces =
                unique_media_types(method.responses.iter().flat_map(|r| r.bodies.iter()));
            if !produces.is_empty() && produces != Reader::media_types(&self.media_types.produces) {
                put_list(&mut map, "produces", &produces);
            }
            let schemes: Vec<String> = method
                .protocols
                .iter()
                .map(|protocol| protocol.to_ascii_lowercase())
                .collect();
            put_list(&mut map, "schemes", &schemes);
            if !parameters.is_empty() {
                map.insert("parameters".to_string(), Value::Array(parameters));
            }
        }

        let responses = self.write_responses(&method.responses, &join(at, "responses"));
        map.insert("responses".to_string(), Value::Object(responses));
        if let Some(requirements) = &method.security {
            let security = self.write_requirements(requirements, &join(at, "security"));
            map.insert("security".to_string(), security);
        }
        annotations::export_into(&mut map, &extra, &mut self.ctx);
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::ExportOptions;
    use apiconv::ir::{Document, Named, ObjectType};
    use apiconv::{DialectKind, ImportContext};

    fn reader() -> Reader {
        let mut ctx = ImportContext::new(DialectKind::Oas20);
        ctx.declare_types(["Pet"]);
        let mut reader = Reader::new(ctx);
        reader.parameters = json!({
            "pageParam": {"name": "page", "in": "query", "type": "integer"},
            "idParam": {"name": "id", "in": "path", "required": true, "type": "string"}
        })
        .as_object()
        .cloned()
        .unwrap();
        reader
    }

    fn writer(dialect: DialectKind) -> Writer {
        let mut doc = Document::new("Pets");
        doc.types.push(Named::new("Id", Type::scalar(InternalType::Int64)));
        Writer::new(dialect, &doc, &ExportOptions::default())
    }

    fn operation(reader: &mut Reader, value: Value) -> (Method, Vec<Parameter>) {
        reader
            .read_operation(Verb::Post, &value, &Sorted::default(), "/paths/~1pets/post")
            .unwrap()
    }

    #[test]
    fn parameters_are_sorted_by_location() {
        let mut reader = reader();
        let (method, path) = operation(
            &mut reader,
            json!({
                "parameters": [
                    {"$ref": "#/parameters/pageParam"},
                    {"$ref": "#/parameters/idParam"},
                    {"name": "X-Trace", "in": "header", "type": "string", "x-internal": true}
                ],
                "responses": {"200": {"description": "ok"}}
            }),
        );
        assert_eq!(method.parameters[0].shape, Shape::Ref("pageParam".to_string()));
        assert_eq!(
            path[0].shape,
            Shape::Inline(Type::scalar(InternalType::String))
        );
        assert_eq!(method.headers[0].annotations[0].name, "oas-internal");
        assert!(method.headers[0].shape.inline().unwrap().annotations.is_empty());
    }

    #[test]
    fn operation_parameters_override_path_level_ones() {
        let mut reader = reader();
        let mut inherited = Sorted::default();
        inherited.push(
            Parameter::new("limit", Location::Query, Type::scalar(InternalType::String)),
        );
        let (method, _) = reader
            .read_operation(
                Verb::Get,
                &json!({"parameters": [{"name": "limit", "in": "query", "type": "integer"}]}),
                &inherited,
                "/paths/~1pets/get",
            )
            .unwrap();
        assert_eq!(method.parameters.len(), 1);
        assert_eq!(
            method.parameters[0].shape,
            Shape::Inline(Type::scalar(InternalType::Integer))
        );
    }

    #[test]
    fn body_parameters_fan_out_over_consumes() {
        let mut reader = reader();
        let (method, _) = operation(
            &mut reader,
            json!({
                "consumes": ["application/json", "application/xml"],
                "parameters": [{"name": "pet", "in": "body", "required": true,
                                "schema": {"$ref": "#/definitions/Pet"}}]
            }),
        );
        let media_types: Vec<&str> = method.bodies.iter().map(|b| b.media_type.as_str()).collect();
        assert_eq!(media_types, vec!["application/json", "application/xml"]);
        assert!(method.bodies[0].required);
        assert_eq!(
            method.bodies[0].annotations,
            vec![Annotation::scalar(oas::BODY_NAME, "pet")]
        );

        let mut writer = writer(DialectKind::Oas20);
        let written = writer.write_operation(&method, "/paths/~1pets/post");
        assert_eq!(
            written["parameters"],
            json!([{"name": "pet", "in": "body", "required": true,
                    "schema": {"$ref": "#/definitions/Pet"}}])
        );
        assert_eq!(written["consumes"], json!(["application/json", "application/xml"]));
    }

    #[test]
    fn form_data_becomes_a_form_body() {
        let mut reader = reader();
        let (method, _) = operation(
            &mut reader,
            json!({"parameters": [
                {"name": "name", "in": "formData", "required": true, "type": "string"},
                {"name": "photo", "in": "formData", "type": "file", "description": "A photo"}
            ]}),
        );
        let body = &method.bodies[0];
        assert_eq!(body.media_type, "multipart/form-data");
        let TypeKind::Object(ObjectType { properties, .. }) = &body.shape.inline().unwrap().kind
        else {
            panic!("expected an object");
        };
        assert!(properties[0].required);
        assert_eq!(properties[1].schema.facets.description.as_deref(), Some("A photo"));

        let mut writer = writer(DialectKind::Oas20);
        let written = writer.write_operation(&method, "/paths/~1pets/post");
        assert_eq!(
            written["parameters"],
            json!([
                {"name": "name", "in": "formData", "required": true, "type": "string"},
                {"name": "photo", "in": "formData", "description": "A photo", "type": "file"}
            ])
        );
    }

    #[test]
    fn response_references_copy_the_catalog_entry() {
        let mut reader = reader();
        let mut missing = Response::new("NotFound");
        missing.description = Some("missing".to_string());
        reader.responses.push(Named::new("NotFound", missing));

        let response = reader
            .read_response(
                "404",
                &json!({"$ref": "#/responses/NotFound"}),
                &[],
                "/paths/~1pets/get/responses/404",
            )
            .unwrap();
        assert_eq!(response.code, "404");
        assert_eq!(response.description.as_deref(), Some("missing"));
        assert_eq!(response.reference.as_deref(), Some("NotFound"));
    }

    #[test]
    fn unknown_response_references_fail() {
        let mut reader = reader();
        let err = reader
            .read_response("404", &json!({"$ref": "#/responses/Gone"}), &[], "/r")
            .unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Reference {
                kind: RefKind::Response,
                ..
            }
        ));
    }

    #[test]
    fn object_parameters_degrade_to_string_in_2_0() {
        let mut writer = writer(DialectKind::Oas20);
        let parameter = Parameter::new("filter", Location::Query, Type::object(Vec::new()));
        assert_eq!(
            writer.write_parameter(&parameter, "/p"),
            json!({"name": "filter", "in": "query", "type": "string"})
        );
        assert_eq!(writer.ctx.diagnostics.len(), 1);

        let named = Parameter::new("id", Location::Path, Type::reference("Id"));
        assert_eq!(
            writer.write_parameter(&named, "/p"),
            json!({"name": "id", "in": "path", "required": true,
                   "type": "integer", "format": "int64"})
        );
    }

    #[test]
    fn methods_without_responses_get_a_default_one() {
        let mut writer = writer(DialectKind::Oas20);
        let written = writer.write_operation(&Method::new(Verb::Get), "/paths/~1a/get");
        assert_eq!(written["responses"], json!({"default": {"description": ""}}));
    }

    #[test]
    fn anonymous_requirements_are_empty_objects() {
        let value = json!([{}, {"oauth": ["read"]}]);
        let requirements = read_requirements(Some(&value), "/security").unwrap().unwrap();
        assert_eq!(requirements[0].scheme, "null");
        assert_eq!(requirements[1].scopes, vec!["read"]);

        let mut writer = writer(DialectKind::Oas20);
        assert_eq!(writer.write_requirements(&requirements, "/security"), value);
    }

    #[test]
    fn request_bodies_use_content_in_3_0() {
        let mut method = Method::new(Verb::Post);
        method.bodies.push(Body::new("application/json", Type::reference("Pet")));
        let mut response = Response::new("201");
        response.bodies.push(Body::new("application/json", Type::reference("Pet")));
        method.responses.push(response);

        let mut writer = writer(DialectKind::Oas30);
        let written = writer.write_operation(&method, "/paths/~1pets/post");
        assert_eq!(
            written["requestBody"],
            json!({"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}})
        );
        assert_eq!(
            written["responses"]["201"]["content"]["application/json"]["schema"],
            json!({"$ref": "#/components/schemas/Pet"})
        );
    }

    #[test]
    fn catalog_parameters_are_referenced() {
        let writer = writer(DialectKind::Oas20);
        assert_eq!(
            writer.catalog_reference("parameters", "trait:paged:page"),
            json!({"$ref": "#/parameters/trait:paged:page"})
        );
    }
}
