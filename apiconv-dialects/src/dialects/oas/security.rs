//! Security definitions
//!
//!     | OAS                     | IR                                          |
//!     |-------------------------|---------------------------------------------|
//!     | `basic`, `http` basic   | Basic                                       |
//!     | `http` digest (3.0)     | Digest                                      |
//!     | `apiKey`                | ApiKey, or PassThrough with one carrier     |
//!     | `oauth2`                | OAuth2                                      |
//!     | anything else           | Custom, original kept in `oas-securityScheme` |
//!
//!     Schemes with no OAS spelling are not written natively; the caller carries them as
//!     RAML fragments instead.

use apiconv::annotations::{self, oas};
use apiconv::ir::{
    find_annotation, take_annotation, Location, OAuthFlow, SchemeKind, SchemeSettings, Scope,
    SecurityScheme,
};
use apiconv::tree::{get_string, join, map_or_empty, put, Map};
use apiconv::{ConvertError, DialectKind, ExportContext, Family, ImportContext};
use serde_json::{json, Value};

fn flow_from_oas(flow: &str) -> OAuthFlow {
    match flow {
        "accessCode" | "authorizationCode" => OAuthFlow::AuthorizationCode,
        "implicit" => OAuthFlow::Implicit,
        "password" => OAuthFlow::Password,
        "application" | "clientCredentials" => OAuthFlow::ClientCredentials,
        other => OAuthFlow::Custom(other.to_string()),
    }
}

fn flow_to_oas(flow: &OAuthFlow, dialect: DialectKind) -> Option<&'static str> {
    let v3 = dialect == DialectKind::Oas30;
    match flow {
        OAuthFlow::AuthorizationCode if v3 => Some("authorizationCode"),
        OAuthFlow::AuthorizationCode => Some("accessCode"),
        OAuthFlow::Implicit => Some("implicit"),
        OAuthFlow::Password => Some("password"),
        OAuthFlow::ClientCredentials if v3 => Some("clientCredentials"),
        OAuthFlow::ClientCredentials => Some("application"),
        OAuthFlow::Custom(_) => None,
    }
}

/// Read one OAS 2.0 security definition.
pub fn read_definition(
    name: &str,
    value: &Value,
    ctx: &mut ImportContext,
    at: &str,
) -> Result<SecurityScheme, ConvertError> {
    let mut map = map_or_empty(value, at)?.cloned().unwrap_or_default();
    let original = Value::Object(map.clone());
    let type_name = get_string(&map, "type")
        .ok_or_else(|| ConvertError::malformed(at, "security definition needs a 'type'"))?;
    let annotations = annotations::import(Family::Oas, &mut map);

    let mut settings = SchemeSettings::default();
    let kind = match type_name.as_str() {
        "basic" => SchemeKind::Basic,
        "apiKey" => {
            settings.key_name = get_string(&map, "name");
            settings.key_location = get_string(&map, "in").and_then(|l| Location::from_oas(&l));
            if settings.key_name.is_none() {
                return Err(ConvertError::malformed(at, "apiKey definition needs a 'name'"));
            }
            SchemeKind::ApiKey
        }
        "oauth2" => {
            settings.flows = get_string(&map, "flow")
                .map(|flow| vec![flow_from_oas(&flow)])
                .unwrap_or_default();
            settings.authorization_uri = get_string(&map, "authorizationUrl");
            settings.access_token_uri = get_string(&map, "tokenUrl");
            settings.scopes = read_scopes(map.get("scopes"));
            SchemeKind::OAuth2
        }
        other => {
            ctx.warn(
                join(at, "type"),
                format!("security type '{other}' has no RAML counterpart, kept verbatim"),
            );
            SchemeKind::Custom(other.to_string())
        }
    };

    let mut scheme = SecurityScheme::new(name, kind);
    scheme.description = get_string(&map, "description");
    scheme.settings = settings;
    scheme.annotations = annotations;
    if matches!(scheme.kind, SchemeKind::Custom(_)) {
        scheme
            .annotations
            .push(apiconv::ir::Annotation::from_json(oas::SECURITY_SCHEME, &original));
    }
    Ok(scheme)
}

fn read_scopes(value: Option<&Value>) -> Vec<Scope> {
    match value {
        Some(Value::Object(scopes)) => scopes
            .iter()
            .map(|(name, description)| Scope {
                name: name.clone(),
                description: description
                    .as_str()
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn write_scopes(scopes: &[Scope]) -> Value {
    let map: Map = scopes
        .iter()
        .map(|scope| {
            let description = scope.description.clone().unwrap_or_default();
            (scope.name.clone(), Value::String(description))
        })
        .collect();
    Value::Object(map)
}

/// Write a scheme for OAS, or `None` when the dialect has no spelling for it.
pub fn write_definition(
    scheme: &SecurityScheme,
    ctx: &mut ExportContext,
    at: &str,
) -> Option<Value> {
    let v3 = ctx.dialect == DialectKind::Oas30;
    if let Some(original) = find_annotation(&scheme.annotations, oas::SECURITY_SCHEME) {
        return Some(original.to_json());
    }
    let mut map = Map::new();
    match &scheme.kind {
        SchemeKind::Basic if v3 => {
            map.insert("type".to_string(), json!("http"));
            map.insert("scheme".to_string(), json!("basic"));
        }
        SchemeKind::Basic => {
            map.insert("type".to_string(), json!("basic"));
        }
        SchemeKind::Digest if v3 => {
            map.insert("type".to_string(), json!("http"));
            map.insert("scheme".to_string(), json!("digest"));
        }
        SchemeKind::ApiKey | SchemeKind::PassThrough => {
            let (name, location) = api_key(scheme)?;
            map.insert("type".to_string(), json!("apiKey"));
            map.insert("name".to_string(), json!(name));
            map.insert("in".to_string(), json!(location.as_str()));
        }
        SchemeKind::OAuth2 => {
            map.insert("type".to_string(), json!("oauth2"));
            write_oauth2(scheme, &mut map, ctx, at);
        }
        SchemeKind::Digest | SchemeKind::OAuth1 | SchemeKind::Custom(_) => return None,
    }
    put(&mut map, "description", scheme.description.clone());
    let mut extra = scheme.annotations.clone();
    take_annotation(&mut extra, oas::SECURITY_SCHEME);
    annotations::export_into(&mut map, &extra, ctx);
    Some(Value::Object(map))
}

/// Name and location of the key, from settings or from a single `describedBy` carrier.
fn api_key(scheme: &SecurityScheme) -> Option<(String, Location)> {
    if let Some(name) = &scheme.settings.key_name {
        return Some((
            name.clone(),
            scheme.settings.key_location.unwrap_or(Location::Header),
        ));
    }
    let carrier = scheme.described_by.as_ref()?.single_carrier()?;
    Some((carrier.name.clone(), carrier.location))
}

fn write_oauth2(scheme: &SecurityScheme, map: &mut Map, ctx: &mut ExportContext, at: &str) {
    let settings = &scheme.settings;
    let flows: Vec<(&OAuthFlow, &'static str)> = settings
        .flows
        .iter()
        .filter_map(|flow| flow_to_oas(flow, ctx.dialect).map(|name| (flow, name)))
        .collect();
    let fill = |target: &mut Map, flow: &OAuthFlow| {
        if matches!(flow, OAuthFlow::AuthorizationCode | OAuthFlow::Implicit) {
            put(target, "authorizationUrl", settings.authorization_uri.clone());
        }
        if !matches!(flow, OAuthFlow::Implicit) {
            put(target, "tokenUrl", settings.access_token_uri.clone());
        }
        target.insert("scopes".to_string(), write_scopes(&settings.scopes));
    };

    if ctx.dialect == DialectKind::Oas30 {
        let mut node = Map::new();
        for (flow, name) in &flows {
            let mut entry = Map::new();
            fill(&mut entry, flow);
            node.insert(name.to_string(), Value::Object(entry));
        }
        map.insert("flows".to_string(), Value::Object(node));
        return;
    }
    match flows.as_slice() {
        [] => {
            ctx.warn(at, "OAuth 2.0 scheme without a supported grant, written as implicit");
            map.insert("flow".to_string(), json!("implicit"));
            fill(map, &OAuthFlow::Implicit);
        }
        [(flow, name), rest @ ..] => {
            if !rest.is_empty() {
                ctx.warn(at, format!("OAS 2.0 holds one OAuth 2.0 flow, kept '{name}'"));
            }
            map.insert("flow".to_string(), json!(name));
            fill(map, flow);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiconv::ir::{DescribedBy, InternalType, Parameter, Type};

    fn read(value: Value) -> SecurityScheme {
        let mut ctx = ImportContext::new(DialectKind::Oas20);
        read_definition("scheme", &value, &mut ctx, "/securityDefinitions/scheme").unwrap()
    }

    fn write(scheme: &SecurityScheme, dialect: DialectKind) -> Option<Value> {
        let mut ctx = ExportContext::new(dialect, &[]);
        write_definition(scheme, &mut ctx, "/securityDefinitions/scheme")
    }

    #[test]
    fn oauth2_definitions_round_trip() {
        let value = json!({
            "type": "oauth2",
            "flow": "accessCode",
            "authorizationUrl": "https://a/auth",
            "tokenUrl": "https://a/token",
            "scopes": {"read": "Read access", "write": ""}
        });
        let scheme = read(value.clone());
        assert_eq!(scheme.settings.flows, vec![OAuthFlow::AuthorizationCode]);
        assert_eq!(scheme.settings.scopes[1].description, None);
        assert_eq!(write(&scheme, DialectKind::Oas20), Some(value));
    }

    #[test]
    fn oauth2_flows_nest_in_3_0() {
        let scheme = read(json!({
            "type": "oauth2",
            "flow": "application",
            "tokenUrl": "https://a/token",
            "scopes": {}
        }));
        assert_eq!(
            write(&scheme, DialectKind::Oas30),
            Some(json!({
                "type": "oauth2",
                "flows": {"clientCredentials": {"tokenUrl": "https://a/token", "scopes": {}}}
            }))
        );
    }

    #[test]
    fn pass_through_with_one_header_is_an_api_key() {
        let mut scheme = SecurityScheme::new("key", SchemeKind::PassThrough);
        scheme.described_by = Some(DescribedBy {
            headers: vec![Parameter::new(
                "X-Key",
                Location::Header,
                Type::scalar(InternalType::String),
            )],
            ..DescribedBy::default()
        });
        assert_eq!(
            write(&scheme, DialectKind::Oas20),
            Some(json!({"type": "apiKey", "name": "X-Key", "in": "header"}))
        );
        scheme.described_by = None;
        assert_eq!(write(&scheme, DialectKind::Oas20), None);
    }

    #[test]
    fn digest_exists_only_in_3_0() {
        let scheme = SecurityScheme::new("digest", SchemeKind::Digest);
        assert_eq!(write(&scheme, DialectKind::Oas20), None);
        assert_eq!(
            write(&scheme, DialectKind::Oas30),
            Some(json!({"type": "http", "scheme": "digest"}))
        );
    }

    #[test]
    fn unknown_types_are_kept_verbatim() {
        let value = json!({"type": "mutualTLS", "x-level": 2});
        let mut ctx = ImportContext::new(DialectKind::Oas20);
        let scheme = read_definition("tls", &value, &mut ctx, "/s").unwrap();
        assert_eq!(scheme.kind, SchemeKind::Custom("mutualTLS".to_string()));
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(write(&scheme, DialectKind::Oas20), Some(value));
    }
}
