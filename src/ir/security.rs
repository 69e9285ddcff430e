//! Security schemes and requirements

use super::annotation::Annotation;
use super::parameter::{Location, Parameter, Response};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    Basic,
    ApiKey,
    OAuth2,
    OAuth1,
    Digest,
    PassThrough,
    /// A vendor scheme (`x-custom` in RAML).
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OAuthFlow {
    AuthorizationCode,
    Implicit,
    Password,
    ClientCredentials,
    /// A grant identified by an absolute URI.
    Custom(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemeSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorization_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_token_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_credentials_uri: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flows: Vec<OAuthFlow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<Scope>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_location: Option<Location>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<String>,
}

/// Headers and query parameters that carry a credential, plus the responses a scheme adds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescribedBy {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<Parameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub query_parameters: Vec<Parameter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub responses: Vec<Response>,
}

impl DescribedBy {
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.query_parameters.is_empty() && self.responses.is_empty()
    }

    /// The single credential carrier, if there is exactly one.
    pub fn single_carrier(&self) -> Option<&Parameter> {
        match (self.headers.as_slice(), self.query_parameters.as_slice()) {
            ([header], []) => Some(header),
            ([], [query]) => Some(query),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SecurityScheme {
    pub name: String,
    pub kind: SchemeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "is_default_settings")]
    pub settings: SchemeSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub described_by: Option<DescribedBy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub annotations: Vec<Annotation>,
}

fn is_default_settings(settings: &SchemeSettings) -> bool {
    *settings == SchemeSettings::default()
}

impl SecurityScheme {
    pub fn new(name: impl Into<String>, kind: SchemeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            description: None,
            settings: SchemeSettings::default(),
            described_by: None,
            annotations: Vec::new(),
        }
    }
}

/// A `securedBy` entry: a scheme name and the scopes requested from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRequirement {
    pub scheme: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl SecurityRequirement {
    pub fn new(scheme: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            scopes: Vec::new(),
        }
    }
}
