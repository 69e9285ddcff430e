//! Traits and resource types
//!
//!     Both are method-shaped (or resource-shaped) nodes under a name. Keys may end in `?`:
//!     an optional method in a resource type applies only where the resource declares the
//!     verb itself, an optional key in a trait is read like the plain key.
//!
//!     RAML 0.8 writes both catalogs as a sequence of single-key maps.

use super::methods::{read_is, write_is};
use super::{Reader, Writer};
use apiconv::annotations;
use apiconv::ir::{
    Location, Method, ResourceTemplate, TemplateMethod, TemplateRef, Trait, Verb,
};
use apiconv::tree::{get_string, join, kind_of, map_or_empty, put, put_map, Map};
use apiconv::{ConvertError, Family};
use serde_json::Value;

/// The `(name, declaration)` entries of a `traits` or `resourceTypes` node.
pub fn catalog_entries(value: &Value, at: &str) -> Result<Vec<(String, Value)>, ConvertError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Object(map) => Ok(map.iter().map(|(k, v)| (k.clone(), v.clone())).collect()),
        Value::Array(items) => {
            let mut entries = Vec::new();
            for (index, item) in items.iter().enumerate() {
                let Value::Object(map) = item else {
                    return Err(ConvertError::malformed(
                        join(at, &index.to_string()),
                        format!("expected a mapping, found {}", kind_of(item)),
                    ));
                };
                entries.extend(map.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Ok(entries)
        }
        other => Err(ConvertError::malformed(
            at,
            format!("expected a mapping, found {}", kind_of(other)),
        )),
    }
}

fn without_optional_marks(map: &Map) -> Map {
    map.iter()
        .map(|(key, value)| {
            let key = match key.strip_suffix('?') {
                Some(plain) if !plain.starts_with('/') => plain.to_string(),
                _ => key.clone(),
            };
            (key, value.clone())
        })
        .collect()
}

impl Reader {
    pub fn read_trait(&mut self, name: &str, value: &Value, at: &str) -> Result<Trait, ConvertError> {
        let mut map = map_or_empty(value, at)?
            .map(without_optional_marks)
            .unwrap_or_default();
        let usage = get_string(&map, "usage");
        map.remove("usage");
        let method = self.read_method(Verb::Get, &Value::Object(map), at)?;
        if !method.traits.is_empty() {
            self.ctx.warn(at, "traits cannot apply other traits, 'is' dropped");
        }
        Ok(Trait {
            name: name.to_string(),
            usage,
            description: method.description,
            parameters: method.parameters,
            headers: method.headers,
            bodies: method.bodies,
            responses: method.responses,
            annotations: method.annotations,
        })
    }

    pub fn read_template(
        &mut self,
        name: &str,
        value: &Value,
        at: &str,
    ) -> Result<ResourceTemplate, ConvertError> {
        let mut template = ResourceTemplate::new(name);
        let Some(map) = map_or_empty(value, at)? else {
            return Ok(template);
        };
        let mut map = map.clone();
        template.annotations = annotations::import(Family::Raml, &mut map);
        template.usage = get_string(&map, "usage");
        template.description = get_string(&map, "description");
        template.parameters = self.read_parameters(
            map.get("uriParameters"),
            Location::Path,
            &join(at, "uriParameters"),
        )?;
        template.template = match map.get("type") {
            None | Some(Value::Null) => None,
            Some(reference) => Some(TemplateRef::from_json(reference).ok_or_else(|| {
                ConvertError::malformed(join(at, "type"), "expected a resource type reference")
            })?),
        };
        template.traits = read_is(map.get("is"), &join(at, "is"))?;

        for (key, value) in &map {
            let (verb, optional) = match key.strip_suffix('?') {
                Some(verb) => (verb, true),
                None => (key.as_str(), false),
            };
            let Ok(verb) = verb.parse::<Verb>() else {
                continue;
            };
            let method = self.read_method(verb, value, &join(at, key))?;
            template.methods.push(TemplateMethod { method, optional });
        }
        Ok(template)
    }
}

impl Writer {
    pub fn write_trait(&mut self, fragment: &Trait, at: &str) -> Value {
        let method = Method {
            description: fragment.description.clone(),
            parameters: fragment.parameters.clone(),
            headers: fragment.headers.clone(),
            bodies: fragment.bodies.clone(),
            responses: fragment.responses.clone(),
            annotations: fragment.annotations.clone(),
            ..Method::new(Verb::Get)
        };
        let mut map = Map::new();
        put(&mut map, "usage", fragment.usage.clone());
        if let Value::Object(body) = self.write_method(&method, at) {
            map.extend(body);
        }
        Value::Object(map)
    }

    pub fn write_template(&mut self, template: &ResourceTemplate, at: &str) -> Value {
        let mut map = Map::new();
        put(&mut map, "usage", template.usage.clone());
        put(&mut map, "description", template.description.clone());
        put(&mut map, "type", template.template.as_ref().map(TemplateRef::to_json));
        put(&mut map, "is", write_is(&template.traits));
        let parameters = self.write_parameters(&template.parameters, &join(at, "uriParameters"));
        put_map(&mut map, "uriParameters", parameters);
        for entry in &template.methods {
            let key = match entry.optional {
                true => format!("{}?", entry.method.verb),
                false => entry.method.verb.to_string(),
            };
            let value = self.write_method(&entry.method, &join(at, &key));
            map.insert(key, value);
        }
        annotations::export_into(&mut map, &template.annotations, &mut self.ctx);
        Value::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiconv::ir::{InternalType, Shape, Type};
    use apiconv::{DialectKind, ImportContext};
    use serde_json::json;

    fn reader() -> Reader {
        let mut ctx = ImportContext::new(DialectKind::Raml10);
        ctx.declare_types(["Pet"]);
        Reader::new(ctx)
    }

    #[test]
    fn sequence_catalogs_flatten_to_entries() {
        let value = json!([{"paged": {}}, {"secured": {}}]);
        let names: Vec<String> = catalog_entries(&value, "/traits")
            .unwrap()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["paged", "secured"]);
        assert!(catalog_entries(&json!("paged"), "/traits").is_err());
    }

    #[test]
    fn traits_keep_usage_and_strip_optional_marks() {
        let mut reader = reader();
        let value = json!({
            "usage": "Apply to collections",
            "queryParameters": {"page": "integer"},
            "responses?": {"200": {"description": "ok"}}
        });
        let fragment = reader.read_trait("paged", &value, "/traits/paged").unwrap();
        assert_eq!(fragment.usage.as_deref(), Some("Apply to collections"));
        assert_eq!(fragment.parameters[0].location, Location::Query);
        assert_eq!(
            fragment.parameters[0].shape,
            Shape::Inline(Type::scalar(InternalType::Integer))
        );
        assert_eq!(fragment.responses.len(), 1);

        let mut writer = Writer::new(&[]);
        assert_eq!(
            writer.write_trait(&fragment, "/traits/paged"),
            json!({
                "usage": "Apply to collections",
                "queryParameters": {"page": "integer"},
                "responses": {"200": {"description": "ok"}}
            })
        );
    }

    #[test]
    fn resource_types_keep_optional_methods() {
        let mut reader = reader();
        let value = json!({
            "description": "A collection of <<resourcePathName>>",
            "is": ["paged"],
            "get": {"responses": {"200": {"body": {"application/json": "<<item>>[]"}}}},
            "post?": {"body": {"application/json": "<<item>>"}}
        });
        let template = reader
            .read_template("collection", &value, "/resourceTypes/collection")
            .unwrap();
        let methods: Vec<(Verb, bool)> = template
            .methods
            .iter()
            .map(|m| (m.method.verb, m.optional))
            .collect();
        assert_eq!(methods, vec![(Verb::Get, false), (Verb::Post, true)]);
        assert_eq!(template.traits, vec![TemplateRef::new("paged")]);

        let mut writer = Writer::new(&[]);
        assert_eq!(
            writer.write_template(&template, "/resourceTypes/collection"),
            value
        );
    }
}
