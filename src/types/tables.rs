//! Per-dialect type grammars

use super::NativeType;
use crate::dialect::DialectKind;
use crate::ir::InternalType;
use crate::ir::InternalType as T;

pub(super) fn lookup(
    dialect: DialectKind,
    type_name: &str,
    format: Option<&str>,
) -> Option<InternalType> {
    match dialect {
        DialectKind::Oas20 | DialectKind::Oas30 => oas_lookup(dialect, type_name, format),
        DialectKind::Raml10 => raml10_lookup(type_name, format),
        DialectKind::Raml08 => raml08_lookup(type_name, format),
    }
}

fn oas_lookup(dialect: DialectKind, type_name: &str, format: Option<&str>) -> Option<InternalType> {
    let tag = match (type_name, format) {
        ("string", None) => T::String,
        ("string", Some("byte")) => T::Byte,
        ("string", Some("binary")) => T::Binary,
        ("string", Some("password")) => T::Password,
        ("string", Some("date")) => T::DateOnly,
        ("string", Some("date-time")) => T::DateTime,
        ("integer", None) => T::Integer,
        ("integer", Some("int32")) => T::Int32,
        ("integer", Some("int64")) => T::Int64,
        ("number", None) => T::Number,
        ("number", Some("float")) => T::Float,
        ("number", Some("double")) => T::Double,
        ("boolean", None) => T::Boolean,
        ("object", None) => T::Object,
        ("array", None) => T::Array,
        ("file", None) if dialect == DialectKind::Oas20 => T::File,
        _ => return None,
    };
    Some(tag)
}

fn raml10_number_format(format: &str) -> Option<InternalType> {
    let tag = match format {
        "int" => T::Int,
        "int8" => T::Int8,
        "int16" => T::Int16,
        "int32" => T::Int32,
        "int64" | "long" => T::Int64,
        "float" => T::Float,
        "double" => T::Double,
        _ => return None,
    };
    Some(tag)
}

fn raml10_lookup(type_name: &str, format: Option<&str>) -> Option<InternalType> {
    let tag = match (type_name, format) {
        ("string", None) => T::String,
        ("integer", None) => T::Integer,
        ("number", None) => T::Number,
        ("integer", Some(f)) => raml10_number_format(f).filter(|tag| tag.is_integer())?,
        ("number", Some(f)) => raml10_number_format(f)?,
        ("boolean", None) => T::Boolean,
        ("date-only", None) => T::DateOnly,
        ("time-only", None) => T::TimeOnly,
        ("datetime", None) | ("datetime", Some("rfc3339")) => T::DateTime,
        ("datetime", Some("rfc2616")) => T::Timestamp,
        ("datetime-only", None) => T::DateTimeOnly,
        ("file", None) => T::File,
        ("nil", None) => T::Null,
        ("any", None) => T::Any,
        ("object", None) => T::Object,
        ("array", None) => T::Array,
        _ => return None,
    };
    Some(tag)
}

fn raml08_lookup(type_name: &str, format: Option<&str>) -> Option<InternalType> {
    if format.is_some() {
        return None;
    }
    let tag = match type_name {
        "string" => T::String,
        "number" => T::Number,
        "integer" => T::Integer,
        "date" => T::Timestamp,
        "boolean" => T::Boolean,
        "file" => T::File,
        _ => return None,
    };
    Some(tag)
}

pub(super) fn oas_native(tag: InternalType, v3: bool) -> NativeType {
    match tag {
        T::String => NativeType::exact("string", None),
        T::Byte => NativeType::exact("string", Some("byte")),
        T::Binary => NativeType::exact("string", Some("binary")),
        T::Password => NativeType::exact("string", Some("password")),
        T::DateOnly => NativeType::exact("string", Some("date")),
        T::DateTime => NativeType::exact("string", Some("date-time")),
        T::Integer => NativeType::exact("integer", None),
        T::Int32 => NativeType::exact("integer", Some("int32")),
        T::Int64 => NativeType::exact("integer", Some("int64")),
        T::Number => NativeType::exact("number", None),
        T::Float => NativeType::exact("number", Some("float")),
        T::Double => NativeType::exact("number", Some("double")),
        T::Boolean => NativeType::exact("boolean", None),
        T::Object => NativeType::exact("object", None),
        T::Array => NativeType::exact("array", None),
        T::File if v3 => NativeType::lossy(Some("string"), Some("binary"), "file"),
        T::File => NativeType::exact("file", None),
        T::Int | T::Int8 | T::Int16 => NativeType::lossy(Some("integer"), None, tag.as_str()),
        T::TimeOnly | T::DateTimeOnly | T::Timestamp => {
            NativeType::lossy(Some("string"), None, tag.as_str())
        }
        T::Null => NativeType::lossy(None, None, "nil"),
        T::Any => NativeType {
            type_name: None,
            format: None,
            side: None,
        },
    }
}

pub(super) fn raml10_native(tag: InternalType) -> NativeType {
    match tag {
        T::String => NativeType::exact("string", None),
        T::Byte => NativeType::lossy(Some("string"), None, "byte"),
        T::Password => NativeType::lossy(Some("string"), None, "password"),
        T::Binary => NativeType::lossy(Some("file"), None, "binary"),
        T::Number => NativeType::exact("number", None),
        T::Integer => NativeType::exact("integer", None),
        T::Int => NativeType::exact("integer", Some("int")),
        T::Int8 => NativeType::exact("integer", Some("int8")),
        T::Int16 => NativeType::exact("integer", Some("int16")),
        T::Int32 => NativeType::exact("integer", Some("int32")),
        T::Int64 => NativeType::exact("integer", Some("int64")),
        T::Float => NativeType::exact("number", Some("float")),
        T::Double => NativeType::exact("number", Some("double")),
        T::Boolean => NativeType::exact("boolean", None),
        T::DateOnly => NativeType::exact("date-only", None),
        T::TimeOnly => NativeType::exact("time-only", None),
        T::DateTime => NativeType::exact("datetime", None),
        T::DateTimeOnly => NativeType::exact("datetime-only", None),
        T::Timestamp => NativeType::exact("datetime", Some("rfc2616")),
        T::File => NativeType::exact("file", None),
        T::Object => NativeType::exact("object", None),
        T::Array => NativeType::exact("array", None),
        T::Null => NativeType::exact("nil", None),
        T::Any => NativeType::exact("any", None),
    }
}

pub(super) fn raml08_native(tag: InternalType) -> NativeType {
    match tag {
        T::String => NativeType::exact("string", None),
        T::Number => NativeType::exact("number", None),
        T::Integer => NativeType::exact("integer", None),
        T::Timestamp => NativeType::exact("date", None),
        T::Boolean => NativeType::exact("boolean", None),
        T::File => NativeType::exact("file", None),
        T::Int | T::Int8 | T::Int16 | T::Int32 | T::Int64 => {
            NativeType::lossy(Some("integer"), None, tag.as_str())
        }
        T::Float | T::Double => NativeType::lossy(Some("number"), None, tag.as_str()),
        T::DateOnly => NativeType::lossy(Some("string"), None, "date"),
        T::DateTime => NativeType::lossy(Some("string"), None, "date-time"),
        T::Null => NativeType::lossy(Some("string"), None, "nil"),
        T::Byte
        | T::Binary
        | T::Password
        | T::TimeOnly
        | T::DateTimeOnly
        | T::Object
        | T::Array
        | T::Any => NativeType::lossy(Some("string"), None, tag.as_str()),
    }
}

pub(super) fn legal_pairs(dialect: DialectKind) -> Vec<(&'static str, Option<&'static str>)> {
    match dialect {
        DialectKind::Oas20 | DialectKind::Oas30 => {
            let mut pairs = vec![
                ("string", None),
                ("string", Some("byte")),
                ("string", Some("binary")),
                ("string", Some("password")),
                ("string", Some("date")),
                ("string", Some("date-time")),
                ("integer", None),
                ("integer", Some("int32")),
                ("integer", Some("int64")),
                ("number", None),
                ("number", Some("float")),
                ("number", Some("double")),
                ("boolean", None),
                ("object", None),
                ("array", None),
            ];
            if dialect == DialectKind::Oas20 {
                pairs.push(("file", None));
            }
            pairs
        }
        DialectKind::Raml10 => vec![
            ("string", None),
            ("number", None),
            ("integer", None),
            ("integer", Some("int")),
            ("integer", Some("int8")),
            ("integer", Some("int16")),
            ("integer", Some("int32")),
            ("integer", Some("int64")),
            ("number", Some("float")),
            ("number", Some("double")),
            ("boolean", None),
            ("date-only", None),
            ("time-only", None),
            ("datetime", None),
            ("datetime", Some("rfc2616")),
            ("datetime-only", None),
            ("file", None),
            ("nil", None),
            ("any", None),
            ("object", None),
            ("array", None),
        ],
        DialectKind::Raml08 => vec![
            ("string", None),
            ("number", None),
            ("integer", None),
            ("date", None),
            ("boolean", None),
            ("file", None),
        ],
    }
}
