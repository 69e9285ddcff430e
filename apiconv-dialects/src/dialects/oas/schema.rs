//! OAS schema objects ⇄ IR types
//!
//!     Named schemas are never inlined: a `$ref` becomes a [`TypeKind::Reference`] and stays
//!     one, so self-referential definitions convert without recursion. Nesting of inline
//!     schemas is bounded by [`MAX_DEPTH`].
//!
//!     Facets RAML has and OAS lacks travel as `x-raml-` keys (`displayName`, `fileTypes`,
//!     `discriminatorValue`); a scalar OAS cannot spell exactly travels as `x-raml-type`.

use apiconv::annotations;
use apiconv::ir::{
    AdditionalProperties, ArrayType, Facets, InternalType, Items, ObjectType, Property, Type,
    TypeKind,
};
use apiconv::tree::{get_bool, get_number, get_string, get_u64, join, kind_of, put, Map};
use apiconv::{
    ConvertError, DialectKind, ExportContext, Family, ImportContext, RefKind, MAX_DEPTH,
};
use serde_json::{json, Value};
use std::collections::HashMap;

pub const SIDE_TYPE: &str = "x-raml-type";
pub const DISPLAY_NAME: &str = "x-raml-displayName";
const FILE_TYPES: &str = "x-raml-fileTypes";
const DISCRIMINATOR_VALUE: &str = "x-raml-discriminatorValue";
/// A union in OAS 2.0, which has no `oneOf`.
const UNION: &str = "x-raml-union";

const DEFINITIONS: &str = "#/definitions/";
const COMPONENTS: &str = "#/components/schemas/";

/// The RAML-safe type name for an OAS definition name. Characters that RAML type
/// expressions give a meaning to are replaced.
pub fn type_name_for(definition: &str) -> String {
    definition
        .chars()
        .map(|c| match c {
            'A'..='Z' | 'a'..='z' | '0'..='9' | '_' | '-' | '.' => c,
            _ => '_',
        })
        .collect()
}

fn decode_pointer_token(token: &str) -> String {
    token.replace("~1", "/").replace("~0", "~")
}

/// Read a schema whose `$ref`s must name declared definitions.
pub fn read_schema(value: &Value, ctx: &mut ImportContext, at: &str) -> Result<Type, ConvertError> {
    read(value, ctx, at, 0, true)
}

/// Read a free-standing JSON Schema (inline in RAML). References that do not resolve to a
/// declared type degrade to `any` with a warning.
pub fn read_json_schema(
    value: &Value,
    ctx: &mut ImportContext,
    at: &str,
) -> Result<Type, ConvertError> {
    read(value, ctx, at, 0, false)
}

fn read(
    value: &Value,
    ctx: &mut ImportContext,
    at: &str,
    depth: usize,
    strict: bool,
) -> Result<Type, ConvertError> {
    if depth >= MAX_DEPTH {
        ctx.warn(at, "schema nested too deeply, cut at any");
        return Ok(Type::default());
    }
    let map = match value {
        Value::Object(map) => map,
        Value::Bool(true) => return Ok(Type::default()),
        other => {
            return Err(ConvertError::malformed(
                at,
                format!("expected a schema, found {}", kind_of(other)),
            ))
        }
    };
    if let Some(reference) = map.get("$ref") {
        let Value::String(reference) = reference else {
            return Err(ConvertError::malformed(join(at, "$ref"), "expected a string"));
        };
        return read_reference(reference, ctx, at, strict);
    }

    let mut map = map.clone();
    let side = map.remove(SIDE_TYPE).and_then(|v| v.as_str().map(str::to_string));
    let mut facets = read_facets(&mut map);
    let union = map.remove(UNION);
    let discriminator_value = map.remove(DISCRIMINATOR_VALUE);
    let annotations = annotations::import(Family::Oas, &mut map);

    let members = |key: &str| match map.get(key) {
        Some(Value::Array(list)) => Some(list.clone()),
        _ => None,
    };
    let read_all = |list: Vec<Value>, key: &str, ctx: &mut ImportContext| {
        list.iter()
            .enumerate()
            .map(|(i, member)| {
                read(member, ctx, &join(&join(at, key), &i.to_string()), depth + 1, strict)
            })
            .collect::<Result<Vec<_>, _>>()
    };

    let kind = if let Some(list) = members("allOf") {
        let mut all = read_all(list, "allOf", ctx)?;
        match all.as_slice() {
            // `allOf: [$ref]` with siblings is how a described reference is written.
            [single] if matches!(single.kind, TypeKind::Reference(_)) => {
                all.remove(0).kind
            }
            _ => TypeKind::Composition(all),
        }
    } else if let Some(list) = members("oneOf").or_else(|| members("anyOf")) {
        TypeKind::Choice(read_all(list, "oneOf", ctx)?)
    } else if let Some(Value::Array(list)) = union {
        TypeKind::Choice(read_all(list, UNION, ctx)?)
    } else {
        match map.get("type") {
            Some(Value::String(name)) if name == "object" => {
                TypeKind::Object(read_object(&map, ctx, at, depth, strict)?)
            }
            Some(Value::String(name)) if name == "array" => {
                TypeKind::Array(read_array(&map, ctx, at, depth, strict)?)
            }
            None if map.contains_key("properties") => {
                TypeKind::Object(read_object(&map, ctx, at, depth, strict)?)
            }
            None if map.contains_key("items") => {
                TypeKind::Array(read_array(&map, ctx, at, depth, strict)?)
            }
            Some(Value::Array(names)) => {
                let mut choices = Vec::new();
                for name in names.iter().filter_map(Value::as_str) {
                    let scalar = ctx.scalar(Some(name), None, None, at);
                    choices.push(Type::scalar(scalar.tag));
                }
                TypeKind::Choice(choices)
            }
            other => {
                let type_name = other.and_then(Value::as_str);
                let format = get_string(&map, "format");
                let scalar = ctx.scalar(type_name, format.as_deref(), side.as_deref(), at);
                if facets.format.is_none() {
                    facets.format = scalar.format_hint;
                }
                TypeKind::Scalar(scalar.tag)
            }
        }
    };

    let mut ty = Type::new(kind).with_facets(facets);
    ty.annotations = annotations;
    if let (TypeKind::Object(object), Some(Value::String(value))) =
        (&mut ty.kind, discriminator_value)
    {
        object.discriminator_value = Some(value);
    }
    Ok(ty)
}

fn read_reference(
    reference: &str,
    ctx: &mut ImportContext,
    at: &str,
    strict: bool,
) -> Result<Type, ConvertError> {
    let local = reference
        .strip_prefix(DEFINITIONS)
        .or_else(|| reference.strip_prefix(COMPONENTS))
        .map(|token| type_name_for(&decode_pointer_token(token)));
    match local {
        Some(name) if ctx.is_declared(&name) => Ok(Type::reference(name)),
        Some(name) if strict => Err(ConvertError::reference(RefKind::Type, name, at)),
        _ => {
            ctx.warn(at, format!("reference '{reference}' is not resolved, kept as any"));
            Ok(Type::default())
        }
    }
}

fn read_facets(map: &mut Map) -> Facets {
    let mut facets = Facets {
        title: get_string(map, "title"),
        description: get_string(map, "description"),
        pattern: get_string(map, "pattern"),
        min_length: get_u64(map, "minLength"),
        max_length: get_u64(map, "maxLength"),
        minimum: get_number(map, "minimum"),
        maximum: get_number(map, "maximum"),
        exclusive_minimum: get_bool(map, "exclusiveMinimum").unwrap_or(false),
        exclusive_maximum: get_bool(map, "exclusiveMaximum").unwrap_or(false),
        multiple_of: get_number(map, "multipleOf"),
        default: map.get("default").cloned(),
        example: map.get("example").cloned(),
        read_only: get_bool(map, "readOnly").unwrap_or(false),
        ..Facets::default()
    };
    if let Some(Value::Array(values)) = map.get("enum") {
        facets.enum_values = values.clone();
    }
    if let Some(Value::String(name)) = map.remove(DISPLAY_NAME) {
        facets.display_name = Some(name);
    }
    if let Some(Value::Array(types)) = map.remove(FILE_TYPES) {
        facets.file_types = types
            .iter()
            .filter_map(|t| t.as_str().map(str::to_string))
            .collect();
    }
    facets
}

fn read_object(
    map: &Map,
    ctx: &mut ImportContext,
    at: &str,
    depth: usize,
    strict: bool,
) -> Result<ObjectType, ConvertError> {
    let required: Vec<&str> = match map.get("required") {
        Some(Value::Array(names)) => names.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let mut object = ObjectType {
        min_properties: get_u64(map, "minProperties"),
        max_properties: get_u64(map, "maxProperties"),
        ..ObjectType::default()
    };
    if let Some(Value::Object(properties)) = map.get("properties") {
        let properties_at = join(at, "properties");
        for (name, schema) in properties {
            let schema = read(schema, ctx, &join(&properties_at, name), depth + 1, strict)?;
            object
                .properties
                .push(Property::new(name.clone(), required.contains(&name.as_str()), schema));
        }
    }
    object.additional_properties = match map.get("additionalProperties") {
        Some(Value::Bool(allowed)) => Some(AdditionalProperties::Allowed(*allowed)),
        Some(schema @ Value::Object(_)) => Some(AdditionalProperties::Schema(Box::new(read(
            schema,
            ctx,
            &join(at, "additionalProperties"),
            depth + 1,
            strict,
        )?))),
        _ => None,
    };
    object.discriminator = match map.get("discriminator") {
        Some(Value::String(name)) => Some(name.clone()),
        Some(Value::Object(discriminator)) => get_string(discriminator, "propertyName"),
        _ => None,
    };
    Ok(object)
}

fn read_array(
    map: &Map,
    ctx: &mut ImportContext,
    at: &str,
    depth: usize,
    strict: bool,
) -> Result<ArrayType, ConvertError> {
    let items_at = join(at, "items");
    let items = match map.get("items") {
        Some(Value::Array(list)) => Items::Tuple(
            list.iter()
                .enumerate()
                .map(|(i, item)| read(item, ctx, &join(&items_at, &i.to_string()), depth + 1, strict))
                .collect::<Result<_, _>>()?,
        ),
        Some(item) => Items::Single(Box::new(read(item, ctx, &items_at, depth + 1, strict)?)),
        None => Items::Single(Box::new(Type::default())),
    };
    Ok(ArrayType {
        items,
        min_items: get_u64(map, "minItems"),
        max_items: get_u64(map, "maxItems"),
        unique_items: get_bool(map, "uniqueItems").unwrap_or(false),
    })
}

/// Writes IR types as schema objects for one document.
#[derive(Debug, Clone)]
pub struct SchemaWriter {
    prefix: &'static str,
    /// IR type name -> definition name, for types renamed on import.
    names: HashMap<String, String>,
}

impl SchemaWriter {
    pub fn new(dialect: DialectKind, names: HashMap<String, String>) -> Self {
        let prefix = match dialect {
            DialectKind::Oas30 => COMPONENTS,
            _ => DEFINITIONS,
        };
        Self { prefix, names }
    }

    /// The definition name an IR type is written under.
    pub fn definition_name<'a>(&'a self, name: &'a str) -> &'a str {
        self.names.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn reference(&self, name: &str) -> Value {
        let token = self.definition_name(name).replace('~', "~0").replace('/', "~1");
        json!({ "$ref": format!("{}{}", self.prefix, token) })
    }

    pub fn write(&self, ty: &Type, ctx: &mut ExportContext, at: &str) -> Value {
        self.write_at(ty, ctx, at, 0)
    }

    fn write_at(&self, ty: &Type, ctx: &mut ExportContext, at: &str, depth: usize) -> Value {
        if depth >= MAX_DEPTH {
            ctx.warn(at, "schema nested too deeply, cut at any");
            return json!({});
        }
        let v3 = ctx.dialect == DialectKind::Oas30;
        let mut map = Map::new();
        match &ty.kind {
            TypeKind::Scalar(tag) => {
                let native = ctx.native(*tag);
                put(&mut map, "type", native.type_name);
                let format = native.format.map(str::to_string).or_else(|| ty.facets.format.clone());
                put(&mut map, "format", format);
                put(&mut map, SIDE_TYPE, native.side);
            }
            TypeKind::Reference(name) => {
                let reference = self.reference(name);
                if ty.facets.is_empty() && ty.annotations.is_empty() {
                    return reference;
                }
                map.insert("allOf".to_string(), Value::Array(vec![reference]));
            }
            TypeKind::Object(object) => self.write_object(object, &mut map, ctx, at, depth, v3),
            TypeKind::Array(array) => {
                map.insert("type".to_string(), json!("array"));
                let items_at = join(at, "items");
                let items = match &array.items {
                    Items::Single(item) => self.write_at(item, ctx, &items_at, depth + 1),
                    Items::Tuple(members) => {
                        ctx.warn(&items_at, "tuple items written as a union");
                        let union = Type::new(TypeKind::Choice(members.clone()));
                        self.write_at(&union, ctx, &items_at, depth + 1)
                    }
                };
                map.insert("items".to_string(), items);
                put(&mut map, "minItems", array.min_items);
                put(&mut map, "maxItems", array.max_items);
                if array.unique_items {
                    map.insert("uniqueItems".to_string(), Value::Bool(true));
                }
            }
            TypeKind::Composition(members) => {
                let all = self.write_members(members, ctx, &join(at, "allOf"), depth);
                map.insert("allOf".to_string(), Value::Array(all));
            }
            TypeKind::Choice(members) => {
                let key = if v3 { "oneOf" } else { UNION };
                let one = self.write_members(members, ctx, &join(at, key), depth);
                map.insert(key.to_string(), Value::Array(one));
            }
        }
        write_facets(&ty.facets, &mut map);
        annotations::export_into(&mut map, &ty.annotations, ctx);
        Value::Object(map)
    }

    fn write_members(
        &self,
        members: &[Type],
        ctx: &mut ExportContext,
        at: &str,
        depth: usize,
    ) -> Vec<Value> {
        members
            .iter()
            .enumerate()
            .map(|(i, member)| self.write_at(member, ctx, &join(at, &i.to_string()), depth + 1))
            .collect()
    }

    fn write_object(
        &self,
        object: &ObjectType,
        map: &mut Map,
        ctx: &mut ExportContext,
        at: &str,
        depth: usize,
        v3: bool,
    ) {
        map.insert("type".to_string(), json!("object"));
        let mut properties = Map::new();
        let mut required = Vec::new();
        for property in &object.properties {
            let here = join(&join(at, "properties"), &property.name);
            properties.insert(
                property.name.clone(),
                self.write_at(&property.schema, ctx, &here, depth + 1),
            );
            if property.required {
                required.push(Value::String(property.name.clone()));
            }
        }
        if !properties.is_empty() {
            map.insert("properties".to_string(), Value::Object(properties));
        }
        if !required.is_empty() {
            map.insert("required".to_string(), Value::Array(required));
        }
        match &object.additional_properties {
            Some(AdditionalProperties::Allowed(allowed)) => {
                map.insert("additionalProperties".to_string(), Value::Bool(*allowed));
            }
            Some(AdditionalProperties::Schema(schema)) => {
                let here = join(at, "additionalProperties");
                let value = self.write_at(schema, ctx, &here, depth + 1);
                map.insert("additionalProperties".to_string(), value);
            }
            None => {}
        }
        if let Some(discriminator) = &object.discriminator {
            let value = if v3 {
                json!({ "propertyName": discriminator })
            } else {
                json!(discriminator)
            };
            map.insert("discriminator".to_string(), value);
        }
        put(map, DISCRIMINATOR_VALUE, object.discriminator_value.clone());
        put(map, "minProperties", object.min_properties);
        put(map, "maxProperties", object.max_properties);
    }
}

fn write_facets(facets: &Facets, map: &mut Map) {
    put(map, "title", facets.title.clone());
    put(map, DISPLAY_NAME, facets.display_name.clone());
    put(map, "description", facets.description.clone());
    if !facets.enum_values.is_empty() {
        map.insert("enum".to_string(), Value::Array(facets.enum_values.clone()));
    }
    put(map, "pattern", facets.pattern.clone());
    put(map, "minLength", facets.min_length);
    put(map, "maxLength", facets.max_length);
    put(map, "minimum", facets.minimum.clone());
    put(map, "maximum", facets.maximum.clone());
    if facets.exclusive_minimum {
        map.insert("exclusiveMinimum".to_string(), Value::Bool(true));
    }
    if facets.exclusive_maximum {
        map.insert("exclusiveMaximum".to_string(), Value::Bool(true));
    }
    put(map, "multipleOf", facets.multiple_of.clone());
    put(map, "default", facets.default.clone());
    put(map, "example", facets.example.clone());
    if facets.read_only {
        map.insert("readOnly".to_string(), Value::Bool(true));
    }
    if !facets.file_types.is_empty() {
        map.insert(FILE_TYPES.to_string(), json!(facets.file_types));
    }
}

/// The scalar tag written by an OAS 2.0 non-body parameter, which carries its schema inline.
pub fn is_inline_scalar(ty: &Type) -> bool {
    matches!(ty.kind, TypeKind::Scalar(tag) if tag != InternalType::Object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn import(value: Value) -> (Type, ImportContext) {
        let mut ctx = ImportContext::new(DialectKind::Oas20);
        ctx.declare_types(["Pet", "Pet_Response_"]);
        let ty = read_schema(&value, &mut ctx, "/definitions/X").unwrap();
        (ty, ctx)
    }

    fn export(ty: &Type, dialect: DialectKind) -> Value {
        let mut ctx = ExportContext::new(dialect, &[]);
        SchemaWriter::new(dialect, HashMap::new()).write(ty, &mut ctx, "/definitions/X")
    }

    #[rstest(definition, expected,
        case("Pet", "Pet"),
        case("Pet.Response", "Pet.Response"),
        case("Map«string,Pet»", "Map_string_Pet_"),
        case("A B", "A_B"),
    )]
    fn definition_names_fit_type_expressions(definition: &str, expected: &str) {
        assert_eq!(type_name_for(definition), expected);
    }

    #[test]
    fn references_stay_references() {
        let (ty, _) = import(json!({"$ref": "#/definitions/Pet"}));
        assert_eq!(ty, Type::reference("Pet"));
        assert_eq!(export(&ty, DialectKind::Oas20), json!({"$ref": "#/definitions/Pet"}));
        assert_eq!(
            export(&ty, DialectKind::Oas30),
            json!({"$ref": "#/components/schemas/Pet"})
        );
    }

    #[test]
    fn renamed_definitions_resolve() {
        let (ty, _) = import(json!({"$ref": "#/definitions/Pet[Response]"}));
        assert_eq!(ty, Type::reference("Pet_Response_"));
    }

    #[test]
    fn dangling_references_fail() {
        let mut ctx = ImportContext::new(DialectKind::Oas20);
        let err = read_schema(&json!({"$ref": "#/definitions/Cat"}), &mut ctx, "/x").unwrap_err();
        assert!(matches!(
            err,
            ConvertError::Reference {
                kind: RefKind::Type,
                ..
            }
        ));
    }

    #[test]
    fn json_schema_references_degrade() {
        let mut ctx = ImportContext::new(DialectKind::Oas20);
        let ty = read_json_schema(&json!({"$ref": "#/definitions/Cat"}), &mut ctx, "/x").unwrap();
        assert_eq!(ty, Type::default());
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn objects_keep_required_per_property() {
        let (ty, _) = import(json!({
            "type": "object",
            "required": ["name"],
            "properties": {
                "name": {"type": "string"},
                "age": {"type": "integer", "format": "int32", "minimum": 0}
            }
        }));
        let TypeKind::Object(object) = &ty.kind else {
            panic!("expected an object");
        };
        assert!(object.properties[0].required);
        assert!(!object.properties[1].required);
        assert_eq!(object.properties[1].schema.tag(), Some(InternalType::Int32));
    }

    #[test]
    fn unknown_formats_are_exported_verbatim() {
        let (ty, ctx) = import(json!({"type": "string", "format": "uuid"}));
        assert_eq!(ty.tag(), Some(InternalType::String));
        assert_eq!(ty.facets.format.as_deref(), Some("uuid"));
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(
            export(&ty, DialectKind::Oas20),
            json!({"type": "string", "format": "uuid"})
        );
    }

    #[test]
    fn lossy_tags_use_the_side_channel() {
        let ty = Type::scalar(InternalType::DateTimeOnly);
        let written = export(&ty, DialectKind::Oas20);
        assert_eq!(
            written,
            json!({"type": "string", "x-raml-type": "datetime-only"})
        );
        let (back, _) = import(written);
        assert_eq!(back, ty);
    }

    #[test]
    fn described_references_use_all_of() {
        let mut ty = Type::reference("Pet");
        ty.facets.description = Some("the pet".into());
        let written = export(&ty, DialectKind::Oas20);
        assert_eq!(
            written,
            json!({"allOf": [{"$ref": "#/definitions/Pet"}], "description": "the pet"})
        );
        let (back, _) = import(written);
        assert_eq!(back, ty);
    }

    #[test]
    fn unions_in_oas20_use_the_vendor_key() {
        let ty = Type::new(TypeKind::Choice(vec![
            Type::reference("Pet"),
            Type::scalar(InternalType::String),
        ]));
        let written = export(&ty, DialectKind::Oas20);
        assert!(written.get("x-raml-union").is_some());
        let (back, _) = import(written);
        assert_eq!(back, ty);
        assert!(export(&ty, DialectKind::Oas30).get("oneOf").is_some());
    }

    #[test]
    fn vendor_keys_become_annotations() {
        let (ty, _) = import(json!({"type": "string", "x-internal": true, "readOnly": true}));
        assert!(ty.facets.read_only);
        assert_eq!(ty.annotations[0].name, "oas-internal");
    }

    #[test]
    fn self_reference_is_not_followed() {
        let (ty, _) = import(json!({
            "type": "object",
            "properties": {"parent": {"$ref": "#/definitions/Pet"}}
        }));
        assert_eq!(ty.referenced_names(), vec!["Pet"]);
    }
}
