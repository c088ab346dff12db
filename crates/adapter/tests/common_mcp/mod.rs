#![allow(dead_code)]

use anyhow::Context as _;
use futures::StreamExt as _;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::io::AsyncBufReadExt as _;
use tokio_util::io::StreamReader;

const PROTOCOL_VERSION: &str = "2025-03-26";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Test-only MCP client for the adapter's streamable HTTP endpoint (`/mcp`).
///
/// Every request is a POST answered with a `text/event-stream` carrying one JSON-RPC message.
pub struct McpSession {
    client: reqwest::Client,
    endpoint: String,
    session_id: String,
    next_id: std::sync::atomic::AtomicU64,
}

impl McpSession {
    /// Run the `initialize` handshake and send `notifications/initialized`.
    pub async fn connect(base_url: &str) -> anyhow::Result<Self> {
        let client = reqwest::Client::new();
        let endpoint = format!("{}/mcp", base_url.trim_end_matches('/'));

        let init = post_message(
            &client,
            &endpoint,
            None,
            &json!({
                "jsonrpc": "2.0",
                "id": 0,
                "method": "initialize",
                "params": {
                    "protocolVersion": PROTOCOL_VERSION,
                    "capabilities": {},
                    "clientInfo": {"name": "restmcp-adapter-tests", "version": "0"}
                }
            }),
        )
        .await?;

        let session_id = init
            .headers()
            .get("Mcp-Session-Id")
            .and_then(|h| h.to_str().ok())
            .context("initialize response has no Mcp-Session-Id header")?
            .to_string();

        let reply = first_sse_message(init).await?;
        anyhow::ensure!(reply["id"] == json!(0), "unexpected initialize reply: {reply}");
        anyhow::ensure!(
            reply["result"]["capabilities"]["tools"].is_object(),
            "server does not advertise tools: {reply}"
        );

        let ack = post_message(
            &client,
            &endpoint,
            Some(&session_id),
            &json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
        )
        .await?;
        anyhow::ensure!(
            ack.status().as_u16() == 202,
            "notifications/initialized returned {}",
            ack.status()
        );

        Ok(Self {
            client,
            endpoint,
            session_id,
            next_id: std::sync::atomic::AtomicU64::new(1),
        })
    }

    /// Send one JSON-RPC request and return the full response message.
    pub async fn request(&self, method: &str, params: Value) -> anyhow::Result<Value> {
        let id = self
            .next_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let resp = post_message(
            &self.client,
            &self.endpoint,
            Some(&self.session_id),
            &json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params}),
        )
        .await?;

        let msg = tokio::time::timeout(DEFAULT_TIMEOUT, first_sse_message(resp))
            .await
            .with_context(|| format!("timed out waiting for {method} response"))??;
        anyhow::ensure!(msg["id"] == json!(id), "response id mismatch: {msg}");
        Ok(msg)
    }

    /// `tools/list`, returning `result.tools`.
    pub async fn list_tools(&self) -> anyhow::Result<Vec<Value>> {
        let msg = self.request("tools/list", json!({})).await?;
        msg["result"]["tools"]
            .as_array()
            .cloned()
            .with_context(|| format!("tools/list has no result.tools: {msg}"))
    }

    /// `tools/call`, returning the full response message (result or JSON-RPC error).
    pub async fn call_tool(&self, name: &str, arguments: Value) -> anyhow::Result<Value> {
        self.request("tools/call", json!({"name": name, "arguments": arguments}))
            .await
    }
}

/// JSON payload of a tool result: `structuredContent` when present, else the first text block
/// parsed as JSON.
pub fn tool_result_json(msg: &Value) -> anyhow::Result<Value> {
    let result = msg
        .get("result")
        .with_context(|| format!("tools/call has no result: {msg}"))?;

    if let Some(structured) = result.get("structuredContent") {
        return Ok(structured.clone());
    }

    let text = result["content"][0]["text"]
        .as_str()
        .with_context(|| format!("tools/call has no text content: {msg}"))?;
    serde_json::from_str(text).context("tool result text is not JSON")
}

async fn post_message(
    client: &reqwest::Client,
    endpoint: &str,
    session_id: Option<&str>,
    body: &Value,
) -> anyhow::Result<reqwest::Response> {
    let mut req = client
        .post(endpoint)
        .header("Accept", "application/json, text/event-stream")
        .json(body);
    if let Some(id) = session_id {
        req = req.header("Mcp-Session-Id", id);
    }

    req.send()
        .await
        .context("POST /mcp")?
        .error_for_status()
        .context("POST /mcp status")
}

/// Read SSE events until one carries a JSON `data:` payload.
async fn first_sse_message(resp: reqwest::Response) -> anyhow::Result<Value> {
    let bytes = resp.bytes_stream().map(|r| r.map_err(std::io::Error::other));
    let mut lines = tokio::io::BufReader::new(StreamReader::new(bytes)).lines();

    let mut data = String::new();
    while let Some(line) = lines.next_line().await.context("read event stream")? {
        let line = line.trim_end();
        if let Some(chunk) = line.strip_prefix("data:") {
            if !data.is_empty() {
                data.push('\n');
            }
            data.push_str(chunk.trim_start());
        } else if line.is_empty() && !data.is_empty() {
            // Priming events may carry an empty or non-JSON payload.
            match serde_json::from_str(&data) {
                Ok(v) => return Ok(v),
                Err(_) => data.clear(),
            }
        }
    }

    anyhow::bail!("event stream ended without a JSON message")
}
