//! Adapter configuration (`config.json` / `config.yaml`).

use crate::error::{AdapterError, Result};
use restmcp_http_tools::config::{ApiConfig, AuthConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_session_id() -> String {
    "standalone".to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_true() -> bool {
    true
}

/// Settings for one adapter instance: which API to wrap and where to listen.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdapterConfig {
    pub server_name: String,
    pub base_url: String,
    /// Opaque identifier of the deployment; only echoed in logs.
    #[serde(default = "default_session_id")]
    pub session_id: String,
    #[serde(default)]
    pub auth_config: Option<AuthConfig>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Per-request timeout; `0` disables it, absent means 30s.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub default_headers: BTreeMap<String, String>,
    #[serde(default)]
    pub max_response_bytes: Option<usize>,
    #[serde(default = "default_true")]
    pub follow_redirects: bool,
}

impl AdapterConfig {
    /// Load a config file. `.yaml`/`.yml` files are parsed as YAML, everything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a required field is empty.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            AdapterError::Config(format!("Failed to read '{}': {e}", path.display()))
        })?;

        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));

        let config: Self = if is_yaml {
            serde_yaml::from_str(&text)?
        } else {
            serde_json::from_str(&text)?
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.server_name.trim().is_empty() {
            return Err(AdapterError::Config("server_name must not be empty".into()));
        }
        if self.base_url.trim().is_empty() {
            return Err(AdapterError::Config("base_url must not be empty".into()));
        }
        Ok(())
    }

    /// Outbound settings for the HTTP runtime.
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        let mut api = ApiConfig::new(self.base_url.clone());
        api.auth.clone_from(&self.auth_config);
        api.default_headers.clone_from(&self.default_headers);
        api.timeout_secs = self.timeout_secs;
        api.max_response_bytes = self.max_response_bytes;
        api.follow_redirects = self.follow_redirects;
        api
    }

    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL clients use to reach the MCP endpoint.
    #[must_use]
    pub fn connection_url(&self) -> String {
        connection_url(&self.host, self.port)
    }
}

/// `http` for loopback/wildcard hosts, `https` otherwise; `0.0.0.0` is shown as `localhost`.
#[must_use]
pub fn connection_url(host: &str, port: u16) -> String {
    let local = matches!(host, "localhost" | "127.0.0.1" | "0.0.0.0");
    let proto = if local { "http" } else { "https" };
    let display_host = if host == "0.0.0.0" { "localhost" } else { host };
    format!("{proto}://{display_host}:{port}/mcp")
}
