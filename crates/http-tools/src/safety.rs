//! Outbound HTTP guards: redirect policy, response size limits and secret redaction.
//!
//! API keys may travel in the query string, so any URL that reaches an error message or a log
//! line goes through [`redact_url`] first.

use crate::runtime::{HttpToolsError, Result};
use reqwest::Client;
use url::Url;

/// Maximum redirect hops when redirects are enabled.
const MAX_REDIRECTS: usize = 10;

/// Build the outbound client.
///
/// # Errors
///
/// Returns an error if the TLS backend cannot be initialised.
pub fn build_client(follow_redirects: bool) -> Result<Client> {
    let policy = if follow_redirects {
        reqwest::redirect::Policy::limited(MAX_REDIRECTS)
    } else {
        reqwest::redirect::Policy::none()
    };
    Client::builder()
        .redirect(policy)
        .build()
        .map_err(|e| HttpToolsError::Config(format!("Failed to build HTTP client: {e}")))
}

/// Read a response body, failing once it exceeds `max_bytes`.
///
/// # Errors
///
/// Returns an error if the body is larger than the limit or the connection fails mid-body.
pub async fn read_body_limited(
    mut response: reqwest::Response,
    max_bytes: Option<usize>,
) -> Result<Vec<u8>> {
    let Some(max) = max_bytes else {
        let bytes = response.bytes().await.map_err(HttpToolsError::from)?;
        return Ok(bytes.to_vec());
    };

    if let Some(len) = response.content_length()
        && len > max as u64
    {
        return Err(HttpToolsError::Http(format!(
            "Response too large: {len} bytes (limit {max})"
        )));
    }

    let mut out: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(HttpToolsError::from)? {
        if out.len().saturating_add(chunk.len()) > max {
            return Err(HttpToolsError::Http(format!(
                "Response too large: exceeded {max} bytes"
            )));
        }
        out.extend_from_slice(&chunk);
    }

    Ok(out)
}

/// Drop userinfo, query and fragment from a URL.
#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

/// Render a transport error with its cause chain, URL secrets redacted.
///
/// reqwest's `Display` stops at "error sending request"; the cause (refused connection, DNS
/// failure, timeout) only shows up in `source()`.
#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !msg.contains(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    if e.is_timeout() && !msg.contains("timed out") {
        msg.push_str(": operation timed out");
    }
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}
