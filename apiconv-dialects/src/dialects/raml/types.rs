//! RAML type declarations ⇄ IR types
//!
//!     A declaration is either a type expression (`Pet`, `Pet[]`, `Cat | Dog`, `integer`, an
//!     inline JSON Schema string) or a map with `type` and facets. Expressions holding a
//!     template placeholder (`<<item>>`) are kept as references and rebound when the template
//!     is applied.
//!
//!     Scalars the dialect cannot spell exactly carry their tag in `(oas-format)`; OAS-only
//!     facets (title, readOnly, exclusive bounds) travel as `oas-` annotations.

use crate::dialects::oas::schema::read_json_schema;
use apiconv::annotations::{self, facets as facet_annotations, oas};
use apiconv::inheritance::template::has_placeholder;
use apiconv::ir::{
    take_annotation, AdditionalProperties, Annotation, ArrayType, Facets, InternalType, Items,
    ObjectType, Property, Type, TypeKind, TEMPLATED_FACETS,
};
use apiconv::tree::{get_bool, get_number, get_string, get_u64, join, kind_of, put, Map};
use apiconv::{
    types, ConvertError, DialectKind, ExportContext, Family, ImportContext, MAX_DEPTH,
};
use serde_json::{json, Value};

/// Keys of a declaration that belong to the parameter or property holding it.
pub const HOLDER_KEYS: &[&str] = &["required", "description", "displayName"];

pub fn read_type(value: &Value, ctx: &mut ImportContext, at: &str) -> Result<Type, ConvertError> {
    read(value, ctx, at, 0)
}

fn read(
    value: &Value,
    ctx: &mut ImportContext,
    at: &str,
    depth: usize,
) -> Result<Type, ConvertError> {
    if depth >= MAX_DEPTH {
        ctx.warn(at, "type nested too deeply, cut at any");
        return Ok(Type::default());
    }
    match value {
        Value::Null => Ok(Type::scalar(InternalType::String)),
        Value::String(expression) => read_expression(expression, ctx, at, depth),
        Value::Array(bases) => read_bases(bases, ctx, at, depth),
        Value::Object(map) => read_declaration(map, ctx, at, depth),
        other => Err(ConvertError::malformed(
            at,
            format!("expected a type, found {}", kind_of(other)),
        )),
    }
}

fn read_bases(
    bases: &[Value],
    ctx: &mut ImportContext,
    at: &str,
    depth: usize,
) -> Result<Type, ConvertError> {
    let members = bases
        .iter()
        .enumerate()
        .map(|(i, base)| read(base, ctx, &join(at, &i.to_string()), depth + 1))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Type::new(TypeKind::Composition(members)))
}

fn read_expression(
    expression: &str,
    ctx: &mut ImportContext,
    at: &str,
    depth: usize,
) -> Result<Type, ConvertError> {
    let expression = expression.trim();
    if has_placeholder(expression) {
        return Ok(Type::reference(expression));
    }
    if expression.starts_with('{') {
        return inline_json_schema(expression, ctx, at);
    }
    if expression.starts_with('<') {
        ctx.warn(at, "XML schemas are not converted, kept as any");
        return Ok(Type::default());
    }
    if let Some(item) = expression.strip_suffix("[]") {
        let item = strip_parens(item);
        let item = read_expression(item, ctx, at, depth + 1)?;
        return Ok(Type::array(item));
    }
    let expression = strip_parens(expression);
    if split_union(expression).len() > 1 {
        let members = split_union(expression)
            .into_iter()
            .map(|member| read_expression(member, ctx, at, depth + 1))
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(Type::new(TypeKind::Choice(members)));
    }
    Ok(ctx.resolve_type_name(expression, at))
}

fn strip_parens(expression: &str) -> &str {
    let trimmed = expression.trim();
    match trimmed.strip_prefix('(').and_then(|rest| rest.strip_suffix(')')) {
        Some(inner) if split_union(trimmed).len() == 1 => inner.trim(),
        _ => trimmed,
    }
}

/// Split on top-level `|`, leaving parenthesized groups intact.
fn split_union(expression: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            '|' if depth == 0 => {
                parts.push(expression[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(expression[start..].trim());
    parts
}

fn inline_json_schema(
    source: &str,
    ctx: &mut ImportContext,
    at: &str,
) -> Result<Type, ConvertError> {
    match serde_json::from_str::<Value>(source) {
        Ok(schema) => {
            let mut nested = ctx.nested(DialectKind::Oas20);
            let ty = read_json_schema(&schema, &mut nested, at);
            ctx.absorb(nested);
            ty
        }
        Err(err) => {
            ctx.warn(at, format!("inline JSON schema does not parse ({err}), kept as any"));
            Ok(Type::default())
        }
    }
}

fn read_declaration(
    map: &Map,
    ctx: &mut ImportContext,
    at: &str,
    depth: usize,
) -> Result<Type, ConvertError> {
    let mut map = map.clone();
    let mut annotations = annotations::import(Family::Raml, &mut map);
    let side = take_annotation(&mut annotations, oas::FORMAT)
        .and_then(|value| value.as_str().map(str::to_string));
    let mut facets = read_facets(&map);
    facet_annotations::lift(&mut annotations, &mut facets);

    let base = map.get("type").or_else(|| map.get("schema"));
    let mut ty = match base {
        None | Some(Value::Null) if map.contains_key("properties") => object_type(),
        None | Some(Value::Null) if map.contains_key("items") => Type::array(Type::default()),
        None | Some(Value::Null) => Type::scalar(InternalType::String),
        Some(Value::String(name)) => match name.trim() {
            "object" => object_type(),
            "array" => Type::array(Type::default()),
            name if types::is_builtin(ctx.dialect, name) => {
                let format = get_string(&map, "format");
                let scalar = ctx.scalar(Some(name), format.as_deref(), side.as_deref(), at);
                facets.format = scalar.format_hint;
                Type::scalar(scalar.tag)
            }
            name => read_expression(name, ctx, &join(at, "type"), depth + 1)?,
        },
        Some(Value::Array(bases)) => read_bases(bases, ctx, &join(at, "type"), depth + 1)?,
        Some(inline @ Value::Object(_)) => read(inline, ctx, &join(at, "type"), depth + 1)?,
        Some(other) => {
            return Err(ConvertError::malformed(
                join(at, "type"),
                format!("expected a type, found {}", kind_of(other)),
            ))
        }
    };
    if facets.format.is_none() && !matches!(ty.kind, TypeKind::Scalar(_)) {
        facets.format = side;
    }

    let properties = read_object(&map, ctx, at, depth)?;
    let declares_properties = !properties.properties.is_empty();
    ty.kind = match std::mem::take(&mut ty.kind) {
        TypeKind::Object(_) => TypeKind::Object(properties),
        TypeKind::Reference(name) if declares_properties => TypeKind::Composition(vec![
            Type::reference(name),
            Type::new(TypeKind::Object(properties)),
        ]),
        TypeKind::Composition(mut members) if declares_properties => {
            members.push(Type::new(TypeKind::Object(properties)));
            TypeKind::Composition(members)
        }
        TypeKind::Array(mut array) => {
            if let Some(items) = map.get("items") {
                let item = read(items, ctx, &join(at, "items"), depth + 1)?;
                array.items = Items::Single(Box::new(item));
            }
            array.min_items = get_u64(&map, "minItems");
            array.max_items = get_u64(&map, "maxItems");
            array.unique_items = get_bool(&map, "uniqueItems").unwrap_or(false);
            TypeKind::Array(array)
        }
        other => other,
    };
    if ctx.dialect == DialectKind::Raml08 && get_bool(&map, "repeat") == Some(true) {
        ty = Type::array(ty);
    }

    ty.facets = merge_facets(ty.facets, facets);
    ty.annotations.extend(annotations);
    Ok(ty)
}

fn object_type() -> Type {
    Type::new(TypeKind::Object(ObjectType::default()))
}

/// Facets written on the declaration win over the ones its base expression brought.
fn merge_facets(base: Facets, declared: Facets) -> Facets {
    if base.is_empty() {
        return declared;
    }
    if declared.is_empty() {
        return base;
    }
    Facets {
        title: declared.title.or(base.title),
        display_name: declared.display_name.or(base.display_name),
        description: declared.description.or(base.description),
        format: declared.format.or(base.format),
        ..declared
    }
}

fn read_facets(map: &Map) -> Facets {
    let mut facets = Facets {
        display_name: get_string(map, "displayName"),
        description: get_string(map, "description"),
        pattern: get_string(map, "pattern"),
        min_length: get_u64(map, "minLength"),
        max_length: get_u64(map, "maxLength"),
        minimum: get_number(map, "minimum"),
        maximum: get_number(map, "maximum"),
        multiple_of: get_number(map, "multipleOf"),
        default: map.get("default").cloned(),
        example: map.get("example").cloned(),
        ..Facets::default()
    };
    if facets.example.is_none() {
        facets.example = match map.get("examples") {
            Some(Value::Object(examples)) => examples.values().next().map(|example| {
                example
                    .as_object()
                    .and_then(|e| e.get("value"))
                    .cloned()
                    .unwrap_or_else(|| example.clone())
            }),
            _ => None,
        };
    }
    for (native, _) in TEMPLATED_FACETS {
        if let Some(Value::String(text)) = map.get(*native) {
            if has_placeholder(text) {
                facets.templated.insert(native.to_string(), text.clone());
            }
        }
    }
    if let Some(Value::Array(values)) = map.get("enum") {
        facets.enum_values = values.clone();
    }
    if let Some(Value::Array(types)) = map.get("fileTypes") {
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
) -> Result<ObjectType, ConvertError> {
    let mut object = ObjectType {
        min_properties: get_u64(map, "minProperties"),
        max_properties: get_u64(map, "maxProperties"),
        discriminator: get_string(map, "discriminator"),
        discriminator_value: get_string(map, "discriminatorValue"),
        ..ObjectType::default()
    };
    object.additional_properties = match map.get("additionalProperties") {
        Some(Value::Bool(allowed)) => Some(AdditionalProperties::Allowed(*allowed)),
        Some(Value::Null) | None => None,
        Some(schema) => Some(AdditionalProperties::Schema(Box::new(read(
            schema,
            ctx,
            &join(at, "additionalProperties"),
            depth + 1,
        )?))),
    };
    if let Some(Value::Object(properties)) = map.get("properties") {
        let properties_at = join(at, "properties");
        for (key, value) in properties {
            let (name, optional) = match key.strip_suffix('?') {
                Some(name) => (name, true),
                None => (key.as_str(), false),
            };
            let required = value
                .as_object()
                .and_then(|declaration| get_bool(declaration, "required"))
                .unwrap_or(!optional);
            let schema = read(value, ctx, &join(&properties_at, key), depth + 1)?;
            object.properties.push(Property::new(name, required, schema));
        }
    }
    Ok(object)
}

/// Write a type as a RAML declaration, collapsing to a bare expression when nothing else
/// needs saying.
pub fn write_type(ty: &Type, ctx: &mut ExportContext, at: &str) -> Value {
    write(ty, ctx, at, 0)
}

fn write(ty: &Type, ctx: &mut ExportContext, at: &str, depth: usize) -> Value {
    if depth >= MAX_DEPTH {
        ctx.warn(at, "type nested too deeply, cut at any");
        return json!("any");
    }
    if let Some(expression) = expression(ty, ctx) {
        return json!(expression);
    }
    let mut map = Map::new();
    let mut extra: Vec<Annotation> = facet_annotations::lower(&ty.facets);
    let mut hint = ty.facets.format.clone();

    match &ty.kind {
        TypeKind::Scalar(tag) => {
            let native = ctx.native(*tag);
            put(&mut map, "type", native.type_name);
            put(&mut map, "format", native.format);
            if let Some(side) = native.side {
                hint = Some(side.to_string());
            }
        }
        TypeKind::Reference(name) => {
            map.insert("type".to_string(), json!(name));
        }
        TypeKind::Object(object) => {
            map.insert("type".to_string(), json!("object"));
            write_object(object, &mut map, ctx, at, depth);
        }
        TypeKind::Array(array) => {
            let items = match &array.items {
                Items::Single(item) => write(item, ctx, &join(at, "items"), depth + 1),
                Items::Tuple(members) => {
                    ctx.warn(at, "tuple items written as a union");
                    json!(union_expression(members, ctx, at))
                }
            };
            write_array(array, items, &mut map);
        }
        TypeKind::Composition(members) => {
            let (objects, bases): (Vec<&Type>, Vec<&Type>) = members
                .iter()
                .partition(|member| {
                    matches!(member.kind, TypeKind::Object(_)) && member.facets.is_empty()
                });
            let bases: Vec<String> = bases
                .into_iter()
                .map(|base| {
                    expression(base, ctx).unwrap_or_else(|| {
                        ctx.warn(at, "composition member has no type expression, kept as any");
                        "any".to_string()
                    })
                })
                .collect();
            let base = match bases.as_slice() {
                [] => json!("object"),
                [single] => json!(single),
                _ => json!(bases),
            };
            map.insert("type".to_string(), base);
            for member in objects {
                if let TypeKind::Object(object) = &member.kind {
                    write_object(object, &mut map, ctx, at, depth);
                }
            }
        }
        TypeKind::Choice(members) => {
            map.insert("type".to_string(), json!(union_expression(members, ctx, at)));
        }
    }

    if let Some(hint) = hint {
        extra.push(Annotation::scalar(oas::FORMAT, hint));
    }
    write_facets(&ty.facets, &mut map);
    extra.extend(ty.annotations.iter().cloned());
    annotations::export_into(&mut map, &extra, ctx);

    match map.len() {
        1 if map.get("type").is_some_and(Value::is_string) => map.remove("type").unwrap_or_default(),
        _ => Value::Object(map),
    }
}

fn write_array(array: &ArrayType, items: Value, map: &mut Map) {
    map.insert("type".to_string(), json!("array"));
    map.insert("items".to_string(), items);
    put(map, "minItems", array.min_items);
    put(map, "maxItems", array.max_items);
    if array.unique_items {
        map.insert("uniqueItems".to_string(), Value::Bool(true));
    }
}

fn write_object(
    object: &ObjectType,
    map: &mut Map,
    ctx: &mut ExportContext,
    at: &str,
    depth: usize,
) {
    let mut properties = Map::new();
    for property in &object.properties {
        let here = join(&join(at, "properties"), &property.name);
        let mut value = write(&property.schema, ctx, &here, depth + 1);
        if !property.required {
            let mut declaration = match value {
                Value::Object(declaration) => declaration,
                expression => {
                    let mut declaration = Map::new();
                    declaration.insert("type".to_string(), expression);
                    declaration
                }
            };
            declaration.insert("required".to_string(), Value::Bool(false));
            value = Value::Object(declaration);
        }
        properties.insert(property.name.clone(), value);
    }
    if !properties.is_empty() {
        map.insert("properties".to_string(), Value::Object(properties));
    }
    match &object.additional_properties {
        Some(AdditionalProperties::Allowed(allowed)) => {
            map.insert("additionalProperties".to_string(), Value::Bool(*allowed));
        }
        Some(AdditionalProperties::Schema(schema)) => {
            let value = write(schema, ctx, &join(at, "additionalProperties"), depth + 1);
            map.insert("additionalProperties".to_string(), value);
        }
        None => {}
    }
    put(map, "discriminator", object.discriminator.clone());
    put(map, "discriminatorValue", object.discriminator_value.clone());
    put(map, "minProperties", object.min_properties);
    put(map, "maxProperties", object.max_properties);
}

fn write_facets(facets: &Facets, map: &mut Map) {
    put(map, "displayName", facets.display_name.clone());
    put(map, "description", facets.description.clone());
    if !facets.enum_values.is_empty() {
        map.insert("enum".to_string(), Value::Array(facets.enum_values.clone()));
    }
    put(map, "pattern", facets.pattern.clone());
    put(map, "minLength", facets.min_length);
    put(map, "maxLength", facets.max_length);
    put(map, "minimum", facets.minimum.clone());
    put(map, "maximum", facets.maximum.clone());
    put(map, "multipleOf", facets.multiple_of.clone());
    for (native, text) in &facets.templated {
        if !map.contains_key(native) {
            map.insert(native.clone(), json!(text));
        }
    }
    put(map, "default", facets.default.clone());
    put(map, "example", facets.example.clone());
    if !facets.file_types.is_empty() {
        map.insert("fileTypes".to_string(), json!(facets.file_types));
    }
}

/// A bare type expression for a type, if one exists.
fn expression(ty: &Type, ctx: &ExportContext) -> Option<String> {
    if !ty.facets.is_empty() || !ty.annotations.is_empty() {
        return None;
    }
    match &ty.kind {
        TypeKind::Reference(name) => Some(name.clone()),
        TypeKind::Scalar(tag) => {
            let native = ctx.native(*tag);
            match (native.type_name, native.format, native.side) {
                (Some(name), None, None) => Some(name.to_string()),
                _ => None,
            }
        }
        TypeKind::Array(ArrayType {
            items: Items::Single(item),
            min_items: None,
            max_items: None,
            unique_items: false,
        }) => {
            let inner = expression(item, ctx)?;
            Some(if inner.contains('|') {
                format!("({inner})[]")
            } else {
                format!("{inner}[]")
            })
        }
        TypeKind::Choice(members) => members
            .iter()
            .map(|member| expression(member, ctx))
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join(" | ")),
        _ => None,
    }
}

fn union_expression(members: &[Type], ctx: &mut ExportContext, at: &str) -> String {
    let parts: Vec<String> = members
        .iter()
        .map(|member| {
            expression(member, ctx).unwrap_or_else(|| {
                ctx.warn(at, "union member has no type expression, kept as any");
                "any".to_string()
            })
        })
        .collect();
    parts.join(" | ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn ctx() -> ImportContext {
        let mut ctx = ImportContext::new(DialectKind::Raml10);
        ctx.declare_types(["Pet", "Cat", "Dog"]);
        ctx
    }

    fn import(value: Value) -> Type {
        read_type(&value, &mut ctx(), "/types/X").unwrap()
    }

    fn export(ty: &Type) -> Value {
        write_type(ty, &mut ExportContext::new(DialectKind::Raml10, &[]), "/types/X")
    }

    #[rstest(expression, expected,
        case("integer", Type::scalar(InternalType::Integer)),
        case("Pet", Type::reference("Pet")),
        case("Pet[]", Type::array(Type::reference("Pet"))),
        case("Cat | Dog", Type::new(TypeKind::Choice(vec![Type::reference("Cat"), Type::reference("Dog")]))),
        case("(Cat | Dog)[]", Type::array(Type::new(TypeKind::Choice(vec![Type::reference("Cat"), Type::reference("Dog")])))),
        case("<<item>>", Type::reference("<<item>>")),
    )]
    fn expressions(expression: &str, expected: Type) {
        assert_eq!(import(json!(expression)), expected);
        assert_eq!(export(&expected), json!(expression));
    }

    #[test]
    fn optional_properties() {
        let ty = import(json!({
            "properties": {
                "name": "string",
                "nick?": "string",
                "age": {"type": "integer", "required": false}
            }
        }));
        let TypeKind::Object(object) = &ty.kind else {
            panic!("expected an object");
        };
        let required: Vec<bool> = object.properties.iter().map(|p| p.required).collect();
        assert_eq!(required, vec![true, false, false]);
        assert_eq!(object.properties[1].name, "nick");
    }

    #[test]
    fn inheritance_with_properties_is_a_composition() {
        let ty = import(json!({"type": "Pet", "properties": {"lives": "integer"}}));
        let TypeKind::Composition(members) = &ty.kind else {
            panic!("expected a composition");
        };
        assert_eq!(members[0], Type::reference("Pet"));
        assert_eq!(
            export(&ty),
            json!({"type": "Pet", "properties": {"lives": "integer"}})
        );
    }

    #[test]
    fn side_channel_restores_lossy_tags() {
        let ty = Type::scalar(InternalType::Byte);
        let written = export(&ty);
        assert_eq!(written, json!({"type": "string", "(oas-format)": "byte"}));
        assert_eq!(import(written), ty);
    }

    #[test]
    fn format_hints_travel_as_oas_format() {
        let mut ty = Type::scalar(InternalType::String);
        ty.facets.format = Some("uuid".into());
        let written = export(&ty);
        assert_eq!(written, json!({"type": "string", "(oas-format)": "uuid"}));
        assert_eq!(import(written), ty);
    }

    #[test]
    fn oas_only_facets_become_annotations() {
        let mut ty = Type::scalar(InternalType::Integer);
        ty.facets.minimum = Some(0.into());
        ty.facets.exclusive_minimum = true;
        ty.facets.title = Some("Count".into());
        let written = export(&ty);
        assert_eq!(written["(oas-exclusiveMinimum)"], json!(true));
        assert_eq!(written["(oas-title)"], json!("Count"));
        assert_eq!(import(written), ty);
    }

    #[test]
    fn placeholder_facets_are_kept_as_written() {
        let value = json!({"type": "integer", "maximum": "<<max>>", "minimum": 1});
        let ty = import(value.clone());
        assert_eq!(ty.facets.maximum, None);
        assert_eq!(ty.facets.minimum, Some(1.into()));
        assert_eq!(ty.facets.templated["maximum"], "<<max>>");
        assert_eq!(export(&ty), value);
    }

    #[test]
    fn unknown_names_coerce_to_string() {
        let mut ctx = ctx();
        let ty = read_type(&json!("Unicorn"), &mut ctx, "/types/X").unwrap();
        assert_eq!(ty, Type::scalar(InternalType::String));
        assert_eq!(ctx.diagnostics.len(), 1);
    }

    #[test]
    fn inline_json_schema() {
        let ty = import(json!(r#"{"type": "object", "properties": {"id": {"type": "integer"}}}"#));
        let TypeKind::Object(object) = &ty.kind else {
            panic!("expected an object");
        };
        assert_eq!(object.properties[0].schema.tag(), Some(InternalType::Integer));
    }

    #[test]
    fn raml08_dates() {
        let mut ctx = ImportContext::new(DialectKind::Raml08);
        let ty = read_type(&json!({"type": "date"}), &mut ctx, "/x").unwrap();
        assert_eq!(ty.tag(), Some(InternalType::Timestamp));
    }
}
