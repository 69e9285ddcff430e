//! Security schemes

use super::{Reader, Writer};
use apiconv::annotations;
use apiconv::ir::{
    take_annotation, Annotation, AnnotationValue, DescribedBy, InternalType, Location, OAuthFlow,
    Parameter, SchemeKind, SchemeSettings, Scope, SecurityScheme, Type,
};
use apiconv::tree::{get_string, join, map_or_empty, put, put_list, put_map, string_list, Map};
use apiconv::{ConvertError, Family};
use serde_json::{json, Value};

/// Scope descriptions, which RAML settings cannot hold.
pub const SCOPE_DESCRIPTIONS: &str = "oas-scopes";

fn kind_from_raml(type_name: &str) -> SchemeKind {
    match type_name {
        "OAuth 2.0" => SchemeKind::OAuth2,
        "OAuth 1.0" => SchemeKind::OAuth1,
        "Basic Authentication" => SchemeKind::Basic,
        "Digest Authentication" => SchemeKind::Digest,
        "Pass Through" => SchemeKind::PassThrough,
        other => SchemeKind::Custom(other.to_string()),
    }
}

fn kind_to_raml(kind: &SchemeKind) -> String {
    match kind {
        SchemeKind::OAuth2 => "OAuth 2.0".to_string(),
        SchemeKind::OAuth1 => "OAuth 1.0".to_string(),
        SchemeKind::Basic => "Basic Authentication".to_string(),
        SchemeKind::Digest => "Digest Authentication".to_string(),
        SchemeKind::PassThrough | SchemeKind::ApiKey => "Pass Through".to_string(),
        SchemeKind::Custom(name) if name.starts_with("x-") => name.clone(),
        SchemeKind::Custom(name) => format!("x-{name}"),
    }
}

fn flow_from_raml(grant: &str) -> OAuthFlow {
    match grant {
        "authorization_code" | "code" => OAuthFlow::AuthorizationCode,
        "implicit" | "token" => OAuthFlow::Implicit,
        "password" | "owner" => OAuthFlow::Password,
        "client_credentials" | "credentials" => OAuthFlow::ClientCredentials,
        other => OAuthFlow::Custom(other.to_string()),
    }
}

fn flow_to_raml(flow: &OAuthFlow) -> String {
    match flow {
        OAuthFlow::AuthorizationCode => "authorization_code".to_string(),
        OAuthFlow::Implicit => "implicit".to_string(),
        OAuthFlow::Password => "password".to_string(),
        OAuthFlow::ClientCredentials => "client_credentials".to_string(),
        OAuthFlow::Custom(uri) => uri.clone(),
    }
}

impl Reader {
    pub fn read_security_scheme(
        &mut self,
        name: &str,
        value: &Value,
        at: &str,
    ) -> Result<SecurityScheme, ConvertError> {
        let mut map = map_or_empty(value, at)?.cloned().unwrap_or_default();
        let type_name = get_string(&map, "type").ok_or_else(|| {
            ConvertError::malformed(at, "security scheme needs a 'type'")
        })?;
        let mut scheme = SecurityScheme::new(name, kind_from_raml(&type_name));
        scheme.annotations = annotations::import(Family::Raml, &mut map);
        scheme.description = get_string(&map, "description");

        if let Some(described_by) = map.get("describedBy") {
            let here = join(at, "describedBy");
            if let Some(described) = map_or_empty(described_by, &here)? {
                let described = DescribedBy {
                    headers: self.read_parameters(
                        described.get("headers"),
                        Location::Header,
                        &join(&here, "headers"),
                    )?,
                    query_parameters: self.read_parameters(
                        described.get("queryParameters"),
                        Location::Query,
                        &join(&here, "queryParameters"),
                    )?,
                    responses: self
                        .read_responses(described.get("responses"), &join(&here, "responses"))?,
                };
                scheme.described_by = Some(described);
            }
        }

        if let Some(Value::Object(settings)) = map.get("settings") {
            scheme.settings = read_settings(settings);
        }
        if let Some(descriptions) = take_annotation(&mut scheme.annotations, SCOPE_DESCRIPTIONS) {
            for scope in &mut scheme.settings.scopes {
                scope.description = descriptions
                    .get(&scope.name)
                    .and_then(AnnotationValue::as_str)
                    .map(str::to_string);
            }
        }
        Ok(scheme)
    }
}

fn read_settings(settings: &Map) -> SchemeSettings {
    SchemeSettings {
        authorization_uri: get_string(settings, "authorizationUri"),
        access_token_uri: get_string(settings, "accessTokenUri"),
        request_token_uri: get_string(settings, "requestTokenUri"),
        token_credentials_uri: get_string(settings, "tokenCredentialsUri"),
        flows: string_list(settings.get("authorizationGrants"))
            .iter()
            .map(|grant| flow_from_raml(grant))
            .collect(),
        scopes: string_list(settings.get("scopes"))
            .into_iter()
            .map(|name| Scope {
                name,
                description: None,
            })
            .collect(),
        signatures: string_list(settings.get("signatures")),
        ..SchemeSettings::default()
    }
}

impl Writer {
    pub fn write_security_scheme(&mut self, scheme: &SecurityScheme, at: &str) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), json!(kind_to_raml(&scheme.kind)));
        put(&mut map, "description", scheme.description.clone());

        let described_by = match (&scheme.described_by, &scheme.kind) {
            (Some(described), _) => Some(described.clone()),
            (None, SchemeKind::ApiKey) => api_key_carrier(&scheme.settings),
            (None, _) => None,
        };
        if let Some(described) = described_by {
            let here = join(at, "describedBy");
            let mut node = Map::new();
            let headers = self.write_parameters(&described.headers, &join(&here, "headers"));
            put_map(&mut node, "headers", headers);
            let query = self
                .write_parameters(&described.query_parameters, &join(&here, "queryParameters"));
            put_map(&mut node, "queryParameters", query);
            let mut responses = Map::new();
            for response in &described.responses {
                let value = self.write_response(response, &join(&here, &response.code));
                responses.insert(response.code.clone(), value);
            }
            put_map(&mut node, "responses", responses);
            put_map(&mut map, "describedBy", node);
        }

        let settings = &scheme.settings;
        let mut node = Map::new();
        put(&mut node, "requestTokenUri", settings.request_token_uri.clone());
        put(&mut node, "authorizationUri", settings.authorization_uri.clone());
        put(&mut node, "tokenCredentialsUri", settings.token_credentials_uri.clone());
        put(&mut node, "accessTokenUri", settings.access_token_uri.clone());
        let grants: Vec<String> = settings.flows.iter().map(flow_to_raml).collect();
        put_list(&mut node, "authorizationGrants", &grants);
        let scopes: Vec<String> = settings.scopes.iter().map(|s| s.name.clone()).collect();
        put_list(&mut node, "scopes", &scopes);
        put_list(&mut node, "signatures", &settings.signatures);
        put_map(&mut map, "settings", node);

        let mut extra = scheme.annotations.clone();
        let descriptions: Vec<Annotation> = settings
            .scopes
            .iter()
            .filter_map(|scope| {
                let description = scope.description.clone()?;
                Some(Annotation::scalar(scope.name.clone(), description))
            })
            .collect();
        if !descriptions.is_empty() {
            extra.push(Annotation::new(
                SCOPE_DESCRIPTIONS,
                AnnotationValue::Map(descriptions),
            ));
        }
        annotations::export_into(&mut map, &extra, &mut self.ctx);
        Value::Object(map)
    }
}

/// The header or query parameter an API key travels in.
fn api_key_carrier(settings: &SchemeSettings) -> Option<DescribedBy> {
    let name = settings.key_name.clone()?;
    let location = settings.key_location.unwrap_or(Location::Header);
    let carrier =
        Parameter::new(name, location, Type::scalar(InternalType::String)).required(true);
    let mut described = DescribedBy::default();
    match location {
        Location::Query => described.query_parameters.push(carrier),
        _ => described.headers.push(carrier),
    }
    Some(described)
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiconv::{DialectKind, ImportContext};
    use rstest::rstest;

    fn read(value: Value, dialect: DialectKind) -> SecurityScheme {
        let mut reader = Reader::new(ImportContext::new(dialect));
        reader
            .read_security_scheme("scheme", &value, "/securitySchemes/scheme")
            .unwrap()
    }

    #[rstest(type_name, kind,
        case("OAuth 2.0", SchemeKind::OAuth2),
        case("Basic Authentication", SchemeKind::Basic),
        case("Pass Through", SchemeKind::PassThrough),
        case("x-custom", SchemeKind::Custom("x-custom".to_string())),
    )]
    fn scheme_types(type_name: &str, kind: SchemeKind) {
        assert_eq!(read(json!({"type": type_name}), DialectKind::Raml10).kind, kind);
        assert_eq!(kind_to_raml(&kind), type_name);
    }

    #[test]
    fn raml08_grant_names_are_normalized() {
        let scheme = read(
            json!({"type": "OAuth 2.0", "settings": {
                "authorizationUri": "https://a/auth",
                "accessTokenUri": "https://a/token",
                "authorizationGrants": ["code", "credentials"]
            }}),
            DialectKind::Raml08,
        );
        assert_eq!(
            scheme.settings.flows,
            vec![OAuthFlow::AuthorizationCode, OAuthFlow::ClientCredentials]
        );
    }

    #[test]
    fn api_keys_are_written_as_pass_through() {
        let mut scheme = SecurityScheme::new("key", SchemeKind::ApiKey);
        scheme.settings.key_name = Some("X-Api-Key".to_string());
        scheme.settings.key_location = Some(Location::Header);

        let mut writer = Writer::new(&[]);
        let written = writer.write_security_scheme(&scheme, "/securitySchemes/key");
        assert_eq!(
            written,
            json!({"type": "Pass Through", "describedBy": {"headers": {"X-Api-Key": "string"}}})
        );

        let back = read(written, DialectKind::Raml10);
        assert_eq!(back.kind, SchemeKind::PassThrough);
        let carrier = back.described_by.as_ref().and_then(DescribedBy::single_carrier);
        assert_eq!(carrier.map(|p| p.name.as_str()), Some("X-Api-Key"));
    }

    #[test]
    fn scope_descriptions_survive_a_round_trip() {
        let mut scheme = SecurityScheme::new("oauth", SchemeKind::OAuth2);
        scheme.settings.flows = vec![OAuthFlow::Implicit];
        scheme.settings.authorization_uri = Some("https://a/auth".to_string());
        scheme.settings.scopes = vec![Scope {
            name: "read".to_string(),
            description: Some("Read access".to_string()),
        }];

        let mut writer = Writer::new(&[]);
        let written = writer.write_security_scheme(&scheme, "/securitySchemes/oauth");
        assert_eq!(written["(oas-scopes)"], json!({"read": "Read access"}));

        let mut back = read(written, DialectKind::Raml10);
        back.name = "oauth".to_string();
        assert_eq!(back, scheme);
    }
}
