//! Methods, named parameters, bodies and responses

use super::types::{read_type, write_type, HOLDER_KEYS};
use super::{Reader, Writer};
use apiconv::annotations::{self, facets, oas};
use apiconv::ir::{
    take_annotation, Annotation, AnnotationValue, Body, Location, Method, Parameter, Property,
    Response, SecurityRequirement, Shape, TemplateRef, Type, Verb,
};
use apiconv::tree::{
    get_bool, get_string, join, map_or_empty, put, put_list, put_map, string_list, Map,
};
use apiconv::{ConvertError, DialectKind, Family};
use serde_json::{json, Value};

/// Annotations on a parameter declaration that describe its type rather than the parameter.
const TYPE_ANNOTATIONS: &[&str] = &[
    oas::FORMAT,
    facets::TITLE,
    facets::READ_ONLY,
    facets::EXCLUSIVE_MINIMUM,
    facets::EXCLUSIVE_MAXIMUM,
];

impl Reader {
    /// Read a named parameter map (`queryParameters`, `headers`, `uriParameters`).
    pub fn read_parameters(
        &mut self,
        value: Option<&Value>,
        location: Location,
        at: &str,
    ) -> Result<Vec<Parameter>, ConvertError> {
        let Some(map) = value.map(|v| map_or_empty(v, at)).transpose()?.flatten() else {
            return Ok(Vec::new());
        };
        let mut parameters = Vec::with_capacity(map.len());
        for (key, value) in map {
            let (name, optional) = match key.strip_suffix('?') {
                Some(name) => (name, true),
                None => (key.as_str(), false),
            };
            let parameter = self.read_parameter(name, optional, location, value, &join(at, key))?;
            parameters.push(parameter);
        }
        Ok(parameters)
    }

    fn default_required(&self, location: Location, optional: bool) -> bool {
        match (location, self.dialect()) {
            (Location::Path, _) => true,
            (_, DialectKind::Raml08) => false,
            _ => !optional,
        }
    }

    pub fn read_parameter(
        &mut self,
        name: &str,
        optional: bool,
        location: Location,
        value: &Value,
        at: &str,
    ) -> Result<Parameter, ConvertError> {
        let default_required = self.default_required(location, optional);
        let Value::Object(map) = value else {
            let schema = read_type(value, &mut self.ctx, at)?;
            return Ok(Parameter::new(name, location, schema).required(default_required));
        };

        let mut map = map.clone();
        let mut parameter = Parameter::new(name, location, Type::default());
        parameter.required = get_bool(&map, "required").unwrap_or(default_required);
        parameter.description = get_string(&map, "description");
        parameter.display_name = get_string(&map, "displayName");
        for key in HOLDER_KEYS {
            map.remove(*key);
        }
        let (own, typed): (Vec<Annotation>, Vec<Annotation>) =
            annotations::import(Family::Raml, &mut map)
                .into_iter()
                .partition(|a| !TYPE_ANNOTATIONS.contains(&a.name.as_str()));
        for annotation in typed {
            map.insert(annotations::raml_key(&annotation.name), annotation.value.to_json());
        }
        parameter.annotations = own;
        parameter.shape = Shape::Inline(read_type(&Value::Object(map), &mut self.ctx, at)?);
        Ok(parameter)
    }

    /// Read a `body` node: keyed by media type, or a bare declaration for the default ones.
    pub fn read_bodies(
        &mut self,
        value: Option<&Value>,
        at: &str,
    ) -> Result<Vec<Body>, ConvertError> {
        let keyed = match value {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::Object(map)) if map.keys().any(|key| key.contains('/')) => Some(map),
            Some(_) => None,
        };
        let mut bodies = Vec::new();
        match (keyed, value) {
            (Some(map), _) => {
                for (media_type, declaration) in map {
                    if !media_type.contains('/') {
                        continue;
                    }
                    let here = join(at, media_type);
                    bodies.push(self.read_body(media_type, declaration, &here)?);
                }
            }
            (None, Some(declaration)) => {
                for media_type in self.default_media_types() {
                    bodies.push(self.read_body(&media_type, declaration, at)?);
                }
            }
            (None, None) => {}
        }
        Ok(bodies)
    }

    fn read_body(
        &mut self,
        media_type: &str,
        value: &Value,
        at: &str,
    ) -> Result<Body, ConvertError> {
        let mut body = Body::new(media_type, Type::default());
        if value.is_null() {
            return Ok(body);
        }
        let Value::Object(map) = value else {
            body.shape = Shape::Inline(read_type(value, &mut self.ctx, at)?);
            return Ok(body);
        };
        let mut map = map.clone();
        if let Some(name) = map.remove(&annotations::raml_key(oas::BODY_NAME)) {
            body.annotations.push(Annotation::from_json(oas::BODY_NAME, &name));
        }
        if let Some(required) = map.remove(&annotations::raml_key(oas::BODY_REQUIRED)) {
            body.required = required.as_bool().unwrap_or(false);
        }

        let schema = if let Some(form) = map.remove("formParameters") {
            let fields = self.read_parameters(Some(&form), Location::Form, &join(at, "formParameters"))?;
            let mut object = Type::object(
                fields
                    .into_iter()
                    .map(|field| {
                        let schema = match field.shape {
                            Shape::Inline(mut ty) => {
                                if ty.facets.description.is_none() {
                                    ty.facets.description = field.description;
                                }
                                ty
                            }
                            Shape::Ref(key) => Type::reference(key),
                        };
                        Property::new(field.name, field.required, schema)
                    })
                    .collect(),
            );
            object.facets.description = get_string(&map, "description");
            object
        } else if self.dialect() == DialectKind::Raml08 {
            let mut ty = match map.get("schema") {
                Some(schema) => read_type(schema, &mut self.ctx, &join(at, "schema"))?,
                None => Type::default(),
            };
            if ty.facets.example.is_none() {
                ty.facets.example = map.get("example").cloned();
            }
            body.description = get_string(&map, "description");
            ty
        } else {
            read_type(&Value::Object(map), &mut self.ctx, at)?
        };
        body.shape = Shape::Inline(schema);
        Ok(body)
    }

    pub fn read_responses(
        &mut self,
        value: Option<&Value>,
        at: &str,
    ) -> Result<Vec<Response>, ConvertError> {
        let Some(map) = value.map(|v| map_or_empty(v, at)).transpose()?.flatten() else {
            return Ok(Vec::new());
        };
        let mut responses = Vec::with_capacity(map.len());
        for (code, value) in map {
            responses.push(self.read_response(code, value, &join(at, code))?);
        }
        Ok(responses)
    }

    pub fn read_response(
        &mut self,
        code: &str,
        value: &Value,
        at: &str,
    ) -> Result<Response, ConvertError> {
        let mut response = Response::new(code);
        let Some(map) = map_or_empty(value, at)? else {
            return Ok(response);
        };
        let mut map = map.clone();
        response.annotations = annotations::import(Family::Raml, &mut map);
        response.reference = take_annotation(&mut response.annotations, oas::RESPONSE_REF)
            .and_then(|value| value.as_str().map(str::to_string));
        response.description = get_string(&map, "description");
        response.headers =
            self.read_parameters(map.get("headers"), Location::Header, &join(at, "headers"))?;
        response.bodies = self.read_bodies(map.get("body"), &join(at, "body"))?;
        Ok(response)
    }

    pub fn read_method(
        &mut self,
        verb: Verb,
        value: &Value,
        at: &str,
    ) -> Result<Method, ConvertError> {
        let mut method = Method::new(verb);
        let Some(map) = map_or_empty(value, at)? else {
            return Ok(method);
        };
        let mut map = map.clone();
        method.annotations = annotations::import(Family::Raml, &mut map);
        method.display_name = get_string(&map, "displayName");
        method.description = get_string(&map, "description");
        method.parameters = self.read_parameters(
            map.get("queryParameters"),
            Location::Query,
            &join(at, "queryParameters"),
        )?;
        method.headers =
            self.read_parameters(map.get("headers"), Location::Header, &join(at, "headers"))?;
        method.bodies = self.read_bodies(map.get("body"), &join(at, "body"))?;
        method.responses = self.read_responses(map.get("responses"), &join(at, "responses"))?;
        if let Some(default) = take_annotation(&mut method.annotations, oas::RESPONSES_DEFAULT) {
            let here = join(at, &annotations::raml_key(oas::RESPONSES_DEFAULT));
            let response = self.read_response("default", &default.to_json(), &here)?;
            method.responses.push(response);
        }
        method.security = self.read_secured_by(map.get("securedBy"), &join(at, "securedBy"))?;
        method.traits = read_is(map.get("is"), &join(at, "is"))?;
        method.protocols = string_list(map.get("protocols"));
        if map.contains_key("queryString") {
            self.ctx
                .warn(join(at, "queryString"), "queryString is not supported, dropped");
        }
        Ok(method)
    }

    /// `securedBy: [name, null, { name: { scopes: [...] } }]`
    pub fn read_secured_by(
        &mut self,
        value: Option<&Value>,
        at: &str,
    ) -> Result<Option<Vec<SecurityRequirement>>, ConvertError> {
        let entries = match value {
            None => return Ok(None),
            Some(Value::Array(entries)) => entries.clone(),
            Some(single) => vec![single.clone()],
        };
        let mut requirements = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let requirement = match entry {
                Value::Null => SecurityRequirement::new("null"),
                Value::String(name) => SecurityRequirement::new(name.clone()),
                Value::Object(map) if map.len() == 1 => {
                    let Some((name, settings)) = map.iter().next() else {
                        continue;
                    };
                    let mut requirement = SecurityRequirement::new(name.clone());
                    requirement.scopes = settings
                        .as_object()
                        .map(|settings| string_list(settings.get("scopes")))
                        .unwrap_or_default();
                    requirement
                }
                _ => {
                    return Err(ConvertError::malformed(
                        join(at, &index.to_string()),
                        "expected a security scheme name",
                    ))
                }
            };
            requirements.push(requirement);
        }
        Ok(Some(requirements))
    }
}

/// `is: [a, { b: { key: value } }]`
pub fn read_is(value: Option<&Value>, at: &str) -> Result<Vec<TemplateRef>, ConvertError> {
    let entries = match value {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(entries)) => entries.clone(),
        Some(single) => vec![single.clone()],
    };
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            TemplateRef::from_json(entry).ok_or_else(|| {
                ConvertError::malformed(join(at, &index.to_string()), "expected a trait reference")
            })
        })
        .collect()
}

pub fn write_is(references: &[TemplateRef]) -> Option<Value> {
    (!references.is_empty())
        .then(|| Value::Array(references.iter().map(TemplateRef::to_json).collect()))
}

impl Writer {
    pub fn write_parameters(&mut self, parameters: &[Parameter], at: &str) -> Map {
        parameters
            .iter()
            .map(|parameter| {
                let here = join(at, &parameter.name);
                (parameter.name.clone(), self.write_parameter(parameter, &here))
            })
            .collect()
    }

    pub fn write_parameter(&mut self, parameter: &Parameter, at: &str) -> Value {
        let schema = match &parameter.shape {
            Shape::Inline(ty) => write_type(ty, &mut self.ctx, at),
            Shape::Ref(key) => {
                self.ctx
                    .warn(at, format!("shared parameter '{key}' has no RAML home, kept as string"));
                json!("string")
            }
        };
        let mut map = match schema {
            Value::Object(map) => map,
            expression => {
                let mut map = Map::new();
                map.insert("type".to_string(), expression);
                map
            }
        };
        put(&mut map, "displayName", parameter.display_name.clone());
        put(&mut map, "description", parameter.description.clone());
        if !parameter.required {
            map.insert("required".to_string(), Value::Bool(false));
        }
        annotations::export_into(&mut map, &parameter.annotations, &mut self.ctx);
        collapse(map)
    }

    pub fn write_bodies(&mut self, bodies: &[Body], at: &str) -> Map {
        let mut out = Map::new();
        for body in bodies {
            let here = join(at, &body.media_type);
            let schema = match &body.shape {
                Shape::Inline(ty) => write_type(ty, &mut self.ctx, &here),
                Shape::Ref(key) => json!(key),
            };
            let mut extra: Vec<Annotation> = body.annotations.clone();
            if body.required {
                extra.push(Annotation::scalar(oas::BODY_REQUIRED, true));
            }
            let value = if body.description.is_none() && extra.is_empty() {
                schema
            } else {
                let mut map = match schema {
                    Value::Object(map) => map,
                    expression => {
                        let mut map = Map::new();
                        map.insert("type".to_string(), expression);
                        map
                    }
                };
                if !map.contains_key("description") {
                    put(&mut map, "description", body.description.clone());
                }
                annotations::export_into(&mut map, &extra, &mut self.ctx);
                Value::Object(map)
            };
            out.insert(body.media_type.clone(), value);
        }
        out
    }

    pub fn write_response(&mut self, response: &Response, at: &str) -> Value {
        let mut map = Map::new();
        put(&mut map, "description", response.description.clone());
        let headers = self.write_parameters(&response.headers, &join(at, "headers"));
        put_map(&mut map, "headers", headers);
        let bodies = self.write_bodies(&response.bodies, &join(at, "body"));
        put_map(&mut map, "body", bodies);
        let mut extra = response.annotations.clone();
        if let Some(reference) = &response.reference {
            extra.push(Annotation::scalar(oas::RESPONSE_REF, reference.clone()));
        }
        annotations::export_into(&mut map, &extra, &mut self.ctx);
        if map.is_empty() {
            Value::Null
        } else {
            Value::Object(map)
        }
    }

    /// Responses keyed by status code; `default` has no RAML spelling and is returned apart.
    pub fn write_responses(
        &mut self,
        responses: &[Response],
        at: &str,
    ) -> (Map, Option<Annotation>) {
        let mut out = Map::new();
        let mut default = None;
        for response in responses {
            let value = self.write_response(response, &join(at, &response.code));
            if response.code == "default" {
                default = Some(Annotation::new(
                    oas::RESPONSES_DEFAULT,
                    AnnotationValue::from_json(&value),
                ));
            } else {
                out.insert(response.code.clone(), value);
            }
        }
        (out, default)
    }

    pub fn write_method(&mut self, method: &Method, at: &str) -> Value {
        let mut map = Map::new();
        put(&mut map, "displayName", method.display_name.clone());
        put(&mut map, "description", method.description.clone());
        put(&mut map, "is", write_is(&method.traits));
        put(&mut map, "securedBy", write_secured_by(method.security.as_deref()));
        put_list(&mut map, "protocols", &method.protocols);
        let query = self.write_parameters(&method.parameters, &join(at, "queryParameters"));
        put_map(&mut map, "queryParameters", query);
        let headers = self.write_parameters(&method.headers, &join(at, "headers"));
        put_map(&mut map, "headers", headers);
        let bodies = self.write_bodies(&method.bodies, &join(at, "body"));
        put_map(&mut map, "body", bodies);
        let (responses, default) = self.write_responses(&method.responses, &join(at, "responses"));
        put_map(&mut map, "responses", responses);

        let mut extra = method.annotations.clone();
        extra.extend(default);
        annotations::export_into(&mut map, &extra, &mut self.ctx);
        if map.is_empty() {
            Value::Null
        } else {
            Value::Object(map)
        }
    }
}

pub fn write_secured_by(requirements: Option<&[SecurityRequirement]>) -> Option<Value> {
    let requirements = requirements?;
    let entries = requirements
        .iter()
        .map(|requirement| {
            if requirement.scheme == "null" {
                Value::Null
            } else if requirement.scopes.is_empty() {
                json!(requirement.scheme)
            } else {
                json!({ requirement.scheme.clone(): { "scopes": requirement.scopes } })
            }
        })
        .collect();
    Some(Value::Array(entries))
}

/// A declaration that says nothing but its type collapses to the type expression.
fn collapse(mut map: Map) -> Value {
    match map.len() {
        1 if map.get("type").is_some_and(Value::is_string) => {
            map.remove("type").unwrap_or_default()
        }
        _ => Value::Object(map),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiconv::ir::{InternalType, TypeKind};
    use apiconv::ImportContext;

    fn reader(dialect: DialectKind) -> Reader {
        let mut ctx = ImportContext::new(dialect);
        ctx.declare_types(["Pet"]);
        Reader::new(ctx)
    }

    #[test]
    fn query_parameters_default_to_required_in_raml10() {
        let mut reader = reader(DialectKind::Raml10);
        let value = json!({"page": "integer", "sort?": "string", "q": {"required": false}});
        let parameters = reader
            .read_parameters(Some(&value), Location::Query, "/a/get/queryParameters")
            .unwrap();
        let required: Vec<(&str, bool)> = parameters
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();
        assert_eq!(required, vec![("page", true), ("sort", false), ("q", false)]);
        assert_eq!(
            parameters[0].shape,
            Shape::Inline(Type::scalar(InternalType::Integer))
        );
    }

    #[test]
    fn raml08_parameters_are_optional_unless_required() {
        let mut reader = reader(DialectKind::Raml08);
        let value = json!({"page": {"type": "integer"}, "id": {"type": "string", "required": true}});
        let parameters = reader
            .read_parameters(Some(&value), Location::Query, "/q")
            .unwrap();
        assert!(!parameters[0].required);
        assert!(parameters[1].required);
    }

    #[test]
    fn parameter_holder_keys_stay_off_the_type() {
        let mut reader = reader(DialectKind::Raml10);
        let value = json!({
            "type": "string",
            "description": "Sort order",
            "(oas-collectionFormat)": "csv",
            "(oas-format)": "uuid"
        });
        let parameter = reader
            .read_parameter("sort", false, Location::Query, &value, "/q/sort")
            .unwrap();
        assert_eq!(parameter.description.as_deref(), Some("Sort order"));
        assert_eq!(parameter.annotations.len(), 1);
        assert_eq!(parameter.annotations[0].name, oas::COLLECTION_FORMAT);
        let ty = parameter.shape.inline().unwrap();
        assert_eq!(ty.facets.description, None);
        assert_eq!(ty.facets.format.as_deref(), Some("uuid"));
    }

    #[test]
    fn bodies_without_media_type_use_the_document_default() {
        let mut reader = reader(DialectKind::Raml10);
        reader.media_types = vec!["application/json".into(), "application/xml".into()];
        let bodies = reader
            .read_bodies(Some(&json!("Pet")), "/a/post/body")
            .unwrap();
        assert_eq!(bodies.len(), 2);
        assert_eq!(bodies[1].media_type, "application/xml");
        assert_eq!(bodies[0].shape, Shape::Inline(Type::reference("Pet")));
    }

    #[test]
    fn required_body_survives_a_write_and_read() {
        let mut body = Body::new("application/json", Type::reference("Pet"));
        body.required = true;
        let mut writer = Writer::new(&[]);
        let written = writer.write_bodies(std::slice::from_ref(&body), "/a/post/body");
        assert_eq!(written["application/json"]["(oas-body-required)"], json!(true));

        let mut reader = reader(DialectKind::Raml10);
        let bodies = reader
            .read_bodies(Some(&Value::Object(written)), "/a/post/body")
            .unwrap();
        assert!(bodies[0].required);
        assert!(bodies[0].annotations.is_empty());
    }

    #[test]
    fn raml08_form_parameters_become_an_object() {
        let mut reader = reader(DialectKind::Raml08);
        let value = json!({"application/x-www-form-urlencoded": {
            "formParameters": {"name": {"type": "string", "required": true}, "age": "integer"}
        }});
        let bodies = reader.read_bodies(Some(&value), "/b").unwrap();
        let ty = bodies[0].shape.inline().unwrap();
        let TypeKind::Object(object) = &ty.kind else {
            panic!("expected an object, got {ty:?}");
        };
        let fields: Vec<(&str, bool)> = object
            .properties
            .iter()
            .map(|p| (p.name.as_str(), p.required))
            .collect();
        assert_eq!(fields, vec![("name", true), ("age", false)]);
    }

    #[test]
    fn default_response_travels_as_an_annotation() {
        let mut reader = reader(DialectKind::Raml10);
        let value = json!({
            "responses": {"200": {"body": {"application/json": "Pet"}}},
            "(oas-responses-default)": {"description": "Unexpected error"}
        });
        let method = reader.read_method(Verb::Get, &value, "/a/get").unwrap();
        let codes: Vec<&str> = method.responses.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["200", "default"]);
        assert!(method.annotations.is_empty());

        let mut writer = Writer::new(&[]);
        let written = writer.write_method(&method, "/a/get");
        assert_eq!(written, value);
    }

    #[test]
    fn secured_by_accepts_null_and_scopes() {
        let mut reader = reader(DialectKind::Raml10);
        let value = json!([null, "basic", {"oauth": {"scopes": ["read"]}}]);
        let requirements = reader
            .read_secured_by(Some(&value), "/securedBy")
            .unwrap()
            .unwrap();
        assert_eq!(requirements[0].scheme, "null");
        assert_eq!(requirements[2].scopes, vec!["read"]);
        assert_eq!(write_secured_by(Some(&requirements)), Some(value));
    }

    #[test]
    fn optional_parameters_write_required_false() {
        let mut writer = Writer::new(&[]);
        let parameter = Parameter::new("page", Location::Query, Type::scalar(InternalType::Integer))
            .required(false);
        assert_eq!(
            writer.write_parameter(&parameter, "/q/page"),
            json!({"type": "integer", "required": false})
        );
        let required = parameter.required(true);
        assert_eq!(writer.write_parameter(&required, "/q/page"), json!("integer"));
    }

    #[test]
    fn query_strings_are_dropped_with_a_warning() {
        let mut reader = reader(DialectKind::Raml10);
        let method = reader
            .read_method(Verb::Post, &json!({"queryString": "Filter"}), "/a/post")
            .unwrap();
        assert_eq!(reader.ctx.diagnostics.len(), 1);
        assert!(method.parameters.is_empty());
    }
}
