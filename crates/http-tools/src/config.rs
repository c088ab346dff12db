//! Serialized shapes consumed by the runtime.
//!
//! `tools.json` is produced ahead of time from an `OpenAPI` document (one tool per operation);
//! [`ApiConfig`] carries the outbound side (base URL, credentials, limits).

use rmcp::model::ToolAnnotations;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::runtime::{HttpToolsError, Result};

/// The generated tool catalog document.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsFile {
    #[serde(default)]
    pub tools: Vec<ToolDefinition>,
}

impl ToolsFile {
    /// Parse a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a JSON document of the expected shape.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| HttpToolsError::Config(format!("Invalid tools document: {e}")))
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            HttpToolsError::Config(format!("Failed to read tools file '{}': {e}", path.display()))
        })?;
        Self::from_json(&text)
    }
}

/// One tool, as emitted by the generator.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "empty_object_schema")]
    pub input_schema: Value,
    #[serde(default)]
    pub output_schema: Option<Value>,
    #[serde(default)]
    pub annotations: Option<ToolAnnotations>,
    pub metadata: ToolMetadata,
}

fn empty_object_schema() -> Value {
    serde_json::json!({ "type": "object" })
}

/// Request template for a tool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolMetadata {
    /// HTTP method (case-insensitive).
    pub method: String,
    /// Path template, e.g. `/pet/{petId}`.
    pub path: String,
    #[serde(default)]
    pub operation_id: Option<String>,
    /// Explicit parameter placement. Arguments not listed here are placed by convention.
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    /// Argument key in the tool input.
    pub name: String,
    #[serde(rename = "in")]
    pub location: HttpParamLocation,
    #[serde(default)]
    pub required: Option<bool>,
    /// Name on the wire, if it differs from the argument key.
    #[serde(default)]
    pub http_name: Option<String>,
    #[serde(default)]
    pub style: Option<QueryStyleConfig>,
    #[serde(default)]
    pub explode: Option<bool>,
    #[serde(default)]
    pub allow_reserved: Option<bool>,
    #[serde(default)]
    pub allow_empty_value: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpParamLocation {
    Path,
    Query,
    Header,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QueryStyleConfig {
    Form,
    SpaceDelimited,
    PipeDelimited,
    DeepObject,
}

/// Raw authentication descriptor (`{"type": ..., "credentials": {...}}`).
///
/// Interpretation lives in [`crate::auth::AuthScheme::resolve`].
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct AuthConfig {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub credentials: Map<String, Value>,
}

impl AuthConfig {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| !k.is_empty()) && !self.credentials.is_empty()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("kind", &self.kind)
            .field("credentials", &self.credentials.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Outbound settings for the wrapped API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub auth: Option<AuthConfig>,
    /// Headers sent with every request (overridden by auth and per-call headers).
    pub default_headers: BTreeMap<String, String>,
    /// Per-request timeout in seconds. `Some(0)` disables the timeout.
    pub timeout_secs: Option<u64>,
    /// Maximum response body size. `None` = unlimited.
    pub max_response_bytes: Option<usize>,
    pub follow_redirects: bool,
}

impl ApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth: None,
            default_headers: BTreeMap::new(),
            timeout_secs: None,
            max_response_bytes: None,
            follow_redirects: true,
        }
    }
}
