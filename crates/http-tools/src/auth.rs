//! Authentication schemes applied to outbound requests.
//!
//! Four schemes are supported, each expressed as header and/or query mutations:
//! - `apiKey` (header, query or cookie)
//! - `http` with `bearer` or `basic`
//! - `oauth2` with a pre-issued access token (no refresh)

use crate::config::AuthConfig;
use base64::Engine as _;
use serde_json::{Map, Value};
use std::fmt;
use tracing::{debug, warn};

const DEFAULT_API_KEY_HEADER: &str = "X-API-Key";
const DEFAULT_API_KEY_QUERY: &str = "api_key";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiKeyLocation {
    Header,
    Query,
    Cookie,
}

#[derive(Clone, PartialEq, Eq)]
pub enum AuthScheme {
    ApiKey {
        name: String,
        value: String,
        location: ApiKeyLocation,
    },
    Bearer {
        token: String,
    },
    Basic {
        username: String,
        password: String,
    },
    OAuth2 {
        access_token: String,
    },
}

impl AuthScheme {
    /// Interpret a raw auth descriptor.
    ///
    /// Returns `None` when no scheme applies (no type, unknown type/scheme, or an `oauth2`
    /// descriptor without an access token). Unknown values are logged, not rejected.
    #[must_use]
    pub fn resolve(config: &AuthConfig) -> Option<Self> {
        let kind = config.kind.as_deref()?;
        let creds = &config.credentials;

        match kind {
            "apiKey" => {
                let location = match credential(creds, "location").as_deref() {
                    None | Some("header") => ApiKeyLocation::Header,
                    Some("query") => ApiKeyLocation::Query,
                    Some("cookie") => ApiKeyLocation::Cookie,
                    Some(other) => {
                        warn!(
                            location = %other,
                            "unknown API key location; requests are sent unauthenticated"
                        );
                        return None;
                    }
                };
                let default_name = match location {
                    ApiKeyLocation::Header => DEFAULT_API_KEY_HEADER,
                    ApiKeyLocation::Query | ApiKeyLocation::Cookie => DEFAULT_API_KEY_QUERY,
                };
                Some(Self::ApiKey {
                    name: credential(creds, "name").unwrap_or_else(|| default_name.to_string()),
                    value: credential(creds, "value").unwrap_or_default(),
                    location,
                })
            }
            "http" => {
                let scheme = credential(creds, "scheme")
                    .unwrap_or_else(|| "bearer".to_string())
                    .to_ascii_lowercase();
                match scheme.as_str() {
                    "bearer" => Some(Self::Bearer {
                        token: credential(creds, "token").unwrap_or_default(),
                    }),
                    "basic" => Some(Self::Basic {
                        username: credential(creds, "username").unwrap_or_default(),
                        password: credential(creds, "password").unwrap_or_default(),
                    }),
                    other => {
                        warn!(scheme = %other, "unknown HTTP auth scheme; requests are sent unauthenticated");
                        None
                    }
                }
            }
            "oauth2" => match credential(creds, "access_token") {
                Some(access_token) if !access_token.is_empty() => Some(Self::OAuth2 { access_token }),
                _ => {
                    warn!("oauth2 auth configured without access_token; requests are sent unauthenticated");
                    None
                }
            },
            other => {
                warn!(auth_type = %other, "unknown auth type; requests are sent unauthenticated");
                None
            }
        }
    }

    /// Short label for logs (never includes secrets).
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ApiKey {
                location: ApiKeyLocation::Header,
                ..
            } => "apiKey(header)",
            Self::ApiKey {
                location: ApiKeyLocation::Query,
                ..
            } => "apiKey(query)",
            Self::ApiKey {
                location: ApiKeyLocation::Cookie,
                ..
            } => "apiKey(cookie)",
            Self::Bearer { .. } => "bearer",
            Self::Basic { .. } => "basic",
            Self::OAuth2 { .. } => "oauth2",
        }
    }

    /// Headers contributed by this scheme.
    #[must_use]
    pub fn headers(&self) -> Vec<(String, String)> {
        match self {
            Self::ApiKey {
                name,
                value,
                location: ApiKeyLocation::Header,
            } => {
                debug!(header = %name, "using API key header");
                vec![(name.clone(), value.clone())]
            }
            Self::ApiKey {
                name,
                value,
                location: ApiKeyLocation::Cookie,
            } => vec![("Cookie".to_string(), format!("{name}={value}"))],
            Self::ApiKey {
                location: ApiKeyLocation::Query,
                ..
            } => Vec::new(),
            Self::Bearer { token } => vec![authorization(format!("Bearer {token}"))],
            Self::Basic { username, password } => {
                let encoded = base64::engine::general_purpose::STANDARD
                    .encode(format!("{username}:{password}"));
                vec![authorization(format!("Basic {encoded}"))]
            }
            Self::OAuth2 { access_token } => vec![authorization(format!("Bearer {access_token}"))],
        }
    }

    /// Query parameters contributed by this scheme.
    #[must_use]
    pub fn query_params(&self) -> Vec<(String, String)> {
        match self {
            Self::ApiKey {
                name,
                value,
                location: ApiKeyLocation::Query,
            } => vec![(name.clone(), value.clone())],
            _ => Vec::new(),
        }
    }
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiKey { name, location, .. } => f
                .debug_struct("ApiKey")
                .field("name", name)
                .field("location", location)
                .finish_non_exhaustive(),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .finish_non_exhaustive(),
            Self::Bearer { .. } => f.write_str("Bearer"),
            Self::OAuth2 { .. } => f.write_str("OAuth2"),
        }
    }
}

fn authorization(value: String) -> (String, String) {
    ("Authorization".to_string(), value)
}

fn credential(creds: &Map<String, Value>, key: &str) -> Option<String> {
    match creds.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn auth(v: Value) -> AuthConfig {
        serde_json::from_value(v).expect("auth config")
    }

    #[test]
    fn api_key_defaults_to_header() {
        let scheme = AuthScheme::resolve(&auth(json!({
            "type": "apiKey",
            "credentials": {"value": "k-1"}
        })))
        .expect("scheme");

        assert_eq!(
            scheme.headers(),
            vec![("X-API-Key".to_string(), "k-1".to_string())]
        );
        assert!(scheme.query_params().is_empty());
    }

    #[test]
    fn api_key_in_query_uses_default_name() {
        let scheme = AuthScheme::resolve(&auth(json!({
            "type": "apiKey",
            "credentials": {"location": "query", "value": "k-2"}
        })))
        .expect("scheme");

        assert!(scheme.headers().is_empty());
        assert_eq!(
            scheme.query_params(),
            vec![("api_key".to_string(), "k-2".to_string())]
        );
    }

    #[test]
    fn http_scheme_defaults_to_bearer() {
        let scheme = AuthScheme::resolve(&auth(json!({
            "type": "http",
            "credentials": {"token": "tok"}
        })))
        .expect("scheme");

        assert_eq!(
            scheme.headers(),
            vec![("Authorization".to_string(), "Bearer tok".to_string())]
        );
    }

    #[test]
    fn basic_auth_is_base64_encoded() {
        let scheme = AuthScheme::resolve(&auth(json!({
            "type": "http",
            "credentials": {"scheme": "Basic", "username": "user", "password": "pass"}
        })))
        .expect("scheme");

        assert_eq!(
            scheme.headers(),
            vec![("Authorization".to_string(), "Basic dXNlcjpwYXNz".to_string())]
        );
    }

    #[test]
    fn oauth2_passes_access_token_through() {
        let scheme = AuthScheme::resolve(&auth(json!({
            "type": "oauth2",
            "credentials": {"access_token": "at-1"}
        })))
        .expect("scheme");

        assert_eq!(
            scheme.headers(),
            vec![("Authorization".to_string(), "Bearer at-1".to_string())]
        );
    }

    #[test]
    fn oauth2_without_token_is_ignored() {
        let resolved = AuthScheme::resolve(&auth(json!({
            "type": "oauth2",
            "credentials": {}
        })));
        assert!(resolved.is_none());
    }

    #[test]
    fn unknown_types_and_schemes_are_ignored() {
        assert!(AuthScheme::resolve(&auth(json!({"type": "mutualTLS"}))).is_none());
        assert!(
            AuthScheme::resolve(&auth(json!({
                "type": "http",
                "credentials": {"scheme": "digest"}
            })))
            .is_none()
        );
        assert!(AuthScheme::resolve(&AuthConfig::default()).is_none());
    }

    #[test]
    fn debug_output_omits_secrets() {
        let scheme = AuthScheme::Basic {
            username: "user".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{scheme:?}");
        assert!(rendered.contains("user"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn api_key_in_cookie_is_sent_as_cookie_header() {
        let scheme = AuthScheme::resolve(&auth(json!({
            "type": "apiKey",
            "credentials": {"location": "cookie", "name": "sid", "value": "v"}
        })))
        .expect("scheme");
        assert_eq!(scheme.kind(), "apiKey(cookie)");
        assert_eq!(
            scheme.headers(),
            vec![("Cookie".to_string(), "sid=v".to_string())]
        );
        assert!(scheme.query_params().is_empty());
    }

    #[test]
    fn api_key_in_unknown_location_applies_no_auth() {
        let scheme = AuthScheme::resolve(&auth(json!({
            "type": "apiKey",
            "credentials": {"location": "body", "name": "k", "value": "v"}
        })));
        assert!(scheme.is_none());
    }
}
