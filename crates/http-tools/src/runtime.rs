//! Executes catalog tools against the wrapped REST API.
//!
//! One call is one HTTP request: arguments are placed into path/query/header/body according to
//! the tool's metadata, auth is applied, and the response is relayed back as MCP content.

use crate::auth::AuthScheme;
use crate::catalog::{CatalogTool, QuerySerialization, ToolCatalog};
use crate::config::{ApiConfig, HttpParamLocation};
use crate::query::{
    QueryPair, build_query_string, encode_path_segment, serialize_query_param, value_to_string,
};
use crate::safety::{build_client, read_body_limited, redact_url, sanitize_reqwest_error};
use crate::semantics::carries_body;
use base64::Engine as _;
use mime::Mime;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum HttpToolsError {
    #[error("config error: {0}")]
    Config(String),
    #[error("{0}")]
    Runtime(String),
    #[error("{0}")]
    Http(String),
    #[error("Request failed: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, HttpToolsError>;

impl From<reqwest::Error> for HttpToolsError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(sanitize_reqwest_error(&value))
    }
}

/// What a successful upstream call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Json(Value),
    Image { bytes: Vec<u8>, mime_type: String },
}

#[derive(Clone)]
pub struct ApiToolSource {
    inner: Arc<ApiToolSourceInner>,
}

struct ApiToolSourceInner {
    catalog: ToolCatalog,
    base_url: String,
    auth: Option<AuthScheme>,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
    max_response_bytes: Option<usize>,
    client: Client,
}

#[derive(Debug, Default)]
struct RequestParts {
    path: String,
    query_params: Vec<QueryPair>,
    headers: Vec<(String, String)>,
    body: Option<Value>,
}

/// Normalize a configured base URL.
///
/// Trailing slashes are removed. A bare path (`/api`) is anchored at `localhost`; a value without
/// a scheme gets one: `http` for `localhost`/`127.0.0.1`, `https` otherwise.
#[must_use]
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }

    let scheme = if trimmed.contains("localhost") || trimmed.contains("127.0.0.1") {
        "http"
    } else {
        "https"
    };
    if trimmed.starts_with('/') {
        format!("{scheme}://localhost{trimmed}")
    } else {
        format!("{scheme}://{trimmed}")
    }
}

impl ApiToolSource {
    /// Build a tool source over a compiled catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is invalid after normalization, a default header is not a
    /// valid HTTP header, or the HTTP client cannot be built.
    pub fn new(catalog: ToolCatalog, config: ApiConfig) -> Result<Self> {
        let base_url = normalize_base_url(&config.base_url);
        Url::parse(&base_url).map_err(|e| {
            HttpToolsError::Config(format!("Invalid base_url '{}': {e}", config.base_url))
        })?;

        let mut default_headers = HeaderMap::new();
        insert_headers(
            &mut default_headers,
            config
                .default_headers
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        )
        .map_err(|e| HttpToolsError::Config(format!("Invalid default header: {e}")))?;

        let auth = match config.auth.as_ref() {
            Some(a) if a.is_configured() => AuthScheme::resolve(a),
            Some(_) => {
                debug!("auth config has no type or credentials; requests are sent unauthenticated");
                None
            }
            None => None,
        };

        let timeout = match config.timeout_secs {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => Some(DEFAULT_TIMEOUT),
        };

        Ok(Self {
            inner: Arc::new(ApiToolSourceInner {
                catalog,
                base_url,
                auth,
                default_headers,
                timeout,
                max_response_bytes: config.max_response_bytes,
                client: build_client(config.follow_redirects)?,
            }),
        })
    }

    #[must_use]
    pub fn catalog(&self) -> &ToolCatalog {
        &self.inner.catalog
    }

    /// Normalized base URL every tool path is appended to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Label of the active auth scheme, if any.
    #[must_use]
    pub fn auth_kind(&self) -> Option<&'static str> {
        self.inner.auth.as_ref().map(AuthScheme::kind)
    }

    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.inner.catalog.list_tools()
    }

    /// Issue the HTTP request for one tool call.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool is unknown, a path placeholder has no value, a header is
    /// invalid, the transport fails, or the API answers with a non-2xx status.
    pub async fn execute(&self, tool_name: &str, arguments: JsonObject) -> Result<ToolOutput> {
        let inner = &self.inner;
        let tool = inner
            .catalog
            .get(tool_name)
            .ok_or_else(|| HttpToolsError::Runtime(format!("Unknown tool: {tool_name}")))?;

        let mut parts = build_request_parts(tool, arguments)?;
        if let Some(auth) = &inner.auth {
            apply_query_auth(auth, &mut parts.query_params);
        }
        let url = build_url(&inner.base_url, &parts.path, &parts.query_params)?;

        let mut headers = inner.default_headers.clone();
        if let Some(auth) = &inner.auth {
            insert_headers(&mut headers, auth.headers())
                .map_err(|e| HttpToolsError::Config(format!("Invalid auth header: {e}")))?;
        }
        insert_headers(&mut headers, parts.headers)
            .map_err(|e| HttpToolsError::Runtime(format!("Invalid header parameter: {e}")))?;

        debug!(
            tool = %tool.name,
            method = %tool.method,
            url = %redact_url(&url),
            "executing API request"
        );

        let mut request = inner
            .client
            .request(tool.method.clone(), url)
            .headers(headers);
        if let Some(body) = parts.body.as_ref() {
            request = request.json(body);
        }
        if let Some(t) = inner.timeout {
            request = request.timeout(t);
        }

        let response = request.send().await?;
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = read_body_limited(response, inner.max_response_bytes).await?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            warn!(tool = %tool.name, status = status.as_u16(), "API returned an error status");
            return Err(HttpToolsError::Http(format!(
                "API request failed: {} - {text}",
                status.as_u16()
            )));
        }

        if is_image_content_type(content_type.as_deref()) {
            let mime_type = content_type.unwrap_or_else(|| "image/*".to_string());
            return Ok(ToolOutput::Image { bytes, mime_type });
        }

        Ok(ToolOutput::Json(decode_body(&bytes, content_type.as_deref())))
    }

    /// Execute a tool call and shape the outcome as an MCP result.
    ///
    /// Upstream and argument-placement failures become an error *result* (`isError: true`) so the
    /// caller sees the API's message.
    ///
    /// # Errors
    ///
    /// Returns an error only when the tool name is unknown.
    pub async fn call_tool(&self, tool_name: &str, arguments: JsonObject) -> Result<CallToolResult> {
        let Some(tool) = self.inner.catalog.get(tool_name) else {
            return Err(HttpToolsError::Runtime(format!("Unknown tool: {tool_name}")));
        };
        let structured = tool.has_output_schema();

        let started = Instant::now();
        let outcome = self.execute(tool_name, arguments).await;
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            Ok(ToolOutput::Image { bytes, mime_type }) => {
                debug!(tool = %tool_name, elapsed_ms, "tool call returned an image");
                let b64 = base64::engine::general_purpose::STANDARD.encode(bytes);
                Ok(CallToolResult::success(vec![Content::image(b64, mime_type)]))
            }
            Ok(ToolOutput::Json(body)) => {
                debug!(tool = %tool_name, elapsed_ms, "tool call succeeded");
                let text = pretty_json(&body);
                if structured && body.is_object() {
                    // Keep the text block too: some clients only render `content`.
                    Ok(CallToolResult {
                        content: vec![Content::text(text)],
                        structured_content: Some(body),
                        is_error: Some(false),
                        meta: None,
                    })
                } else {
                    Ok(CallToolResult::success(vec![Content::text(text)]))
                }
            }
            Err(e) => {
                warn!(tool = %tool_name, elapsed_ms, error = %e, "tool call failed");
                let payload = json!({ "error": e.to_string() });
                Ok(CallToolResult::error(vec![Content::text(pretty_json(
                    &payload,
                ))]))
            }
        }
    }
}

fn pretty_json(v: &Value) -> String {
    serde_json::to_string_pretty(v).unwrap_or_else(|_| v.to_string())
}

fn build_request_parts(tool: &CatalogTool, arguments: JsonObject) -> Result<RequestParts> {
    let mut path_values: HashMap<String, String> = HashMap::new();
    let mut query_params: Vec<QueryPair> = Vec::new();
    let mut headers: Vec<(String, String)> = Vec::new();
    let mut body_fields: Map<String, Value> = Map::new();
    let mut body_payload: Option<Value> = None;
    let mut body_given = false;
    let mut leftovers: Map<String, Value> = Map::new();

    for (key, value) in arguments {
        // An explicit `body` key counts even when null: it still routes leftovers to the query.
        let explicit_body = key == "body"
            && tool.parameters.get(&key).is_none_or(|p| {
                p.location == HttpParamLocation::Body && p.http_name == "body"
            });
        if explicit_body {
            body_given = true;
            if !value.is_null() {
                body_payload = Some(value);
            }
            continue;
        }
        if value.is_null() {
            continue;
        }

        if let Some(param) = tool.parameters.get(&key) {
            match param.location {
                HttpParamLocation::Path => {
                    path_values.insert(param.http_name.clone(), value_to_string(&value));
                }
                HttpParamLocation::Query => {
                    let ser = param.query.clone().unwrap_or_default();
                    query_params.extend(serialize_query_param(
                        &param.http_name,
                        &value,
                        param.required,
                        &ser,
                    ));
                }
                HttpParamLocation::Header => {
                    headers.push((param.http_name.clone(), value_to_string(&value)));
                }
                HttpParamLocation::Body => {
                    body_fields.insert(param.http_name.clone(), value);
                }
            }
        } else if tool.path_keys.contains(&key) {
            path_values.insert(key, value_to_string(&value));
        } else if let Some(header) = key.strip_prefix("header_") {
            headers.push((header.to_string(), value_to_string(&value)));
        } else {
            leftovers.insert(key, value);
        }
    }

    if !leftovers.is_empty() {
        if !body_given && carries_body(&tool.method) {
            body_fields.extend(leftovers);
        } else {
            let ser = QuerySerialization::default();
            for (key, value) in &leftovers {
                query_params.extend(serialize_query_param(key, value, false, &ser));
            }
        }
    }

    let mut path = tool.path.clone();
    for key in &tool.path_keys {
        let Some(value) = path_values.get(key) else {
            return Err(HttpToolsError::Runtime(format!(
                "Missing path parameter: {key}"
            )));
        };
        path = path.replace(&format!("{{{key}}}"), &encode_path_segment(value));
    }

    let body = match body_payload {
        Some(Value::Object(mut payload)) => {
            payload.extend(body_fields);
            Some(Value::Object(payload))
        }
        Some(_) if !body_fields.is_empty() => {
            let names: Vec<&str> = body_fields.keys().map(String::as_str).collect();
            return Err(HttpToolsError::Runtime(format!(
                "Body fields require an object body: {}",
                names.join(", ")
            )));
        }
        Some(payload) => Some(payload),
        None if body_fields.is_empty() => None,
        None => Some(Value::Object(body_fields)),
    }
    .filter(|b| !is_empty_body(b));

    Ok(RequestParts {
        path,
        query_params,
        headers,
        body,
    })
}

/// Bodies that are not worth sending: `null`, `false`, `0`, `""`, `[]`, `{}`.
fn is_empty_body(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}

fn apply_query_auth(auth: &AuthScheme, query_params: &mut Vec<QueryPair>) {
    for (name, value) in auth.query_params() {
        // A caller-supplied parameter of the same name wins.
        if query_params.iter().any(|p| p.key == name) {
            continue;
        }
        query_params.push(QueryPair::plain(name, value));
    }
}

fn build_url(base_url: &str, path: &str, query_params: &[QueryPair]) -> Result<Url> {
    let mut url = Url::parse(&format!("{base_url}{path}"))
        .map_err(|e| HttpToolsError::Runtime(format!("Invalid URL: {e}")))?;
    if !query_params.is_empty() {
        url.set_query(Some(&build_query_string(query_params)));
    }
    Ok(url)
}

/// Insert headers, replacing any existing value of the same (case-insensitive) name.
fn insert_headers(
    map: &mut HeaderMap,
    headers: impl IntoIterator<Item = (String, String)>,
) -> std::result::Result<(), String> {
    for (name, value) in headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| format!("'{name}': {e}"))?;
        let header_value = HeaderValue::from_str(&value).map_err(|e| format!("'{name}': {e}"))?;
        map.insert(header_name, header_value);
    }
    Ok(())
}

fn is_image_content_type(content_type: Option<&str>) -> bool {
    content_type
        .and_then(|ct| ct.parse::<Mime>().ok())
        .is_some_and(|m| m.type_() == mime::IMAGE)
}

/// JSON bodies are relayed as-is; anything else is wrapped as `{"data": ...}`.
fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Value {
    if let Ok(v) = serde_json::from_slice::<Value>(bytes) {
        return v;
    }
    match std::str::from_utf8(bytes) {
        Ok(text) => json!({ "data": text }),
        Err(_) => json!({
            "data": {
                "encoding": "base64",
                "mimeType": content_type,
                "data": base64::engine::general_purpose::STANDARD.encode(bytes),
            }
        }),
    }
}
