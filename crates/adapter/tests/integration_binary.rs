mod common;
mod common_mcp;

use anyhow::Context as _;
use axum::Json;
use axum::extract::Path;
use axum::http::HeaderMap;
use axum::routing::get;
use serde_json::{Value, json};
use std::time::Duration;
use tempfile::tempdir;

use common::{TestServer, pick_unused_port, spawn_adapter, wait_tcp_ready};
use common_mcp::{McpSession, tool_result_json};
use restmcp_test_support::KillOnDrop;

async fn get_order(Path(order_id): Path<String>, headers: HeaderMap) -> Json<Value> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    Json(json!({
        "orderId": order_id,
        "apiKey": header("x-api-key"),
        "userAgent": header("user-agent"),
    }))
}

#[tokio::test]
async fn binary_serves_tools_from_config_files() -> anyhow::Result<()> {
    let upstream =
        TestServer::start(axum::Router::new().route("/store/order/{orderId}", get(get_order)))
            .await?;

    let dir = tempdir().context("create temp dir")?;
    let cfg_path = dir.path().join("config.yaml");
    std::fs::write(
        &cfg_path,
        format!(
            r"server_name: store
base_url: {base}
session_id: sess-bin
default_headers:
  User-Agent: restmcp-test
auth_config:
  type: apiKey
  credentials:
    name: X-Api-Key
    value: key-123
",
            base = upstream.base_url
        ),
    )
    .context("write config")?;

    let tools_path = dir.path().join("tools.json");
    std::fs::write(
        &tools_path,
        serde_json::to_vec_pretty(&json!({"tools": [{
            "name": "getOrderById",
            "description": "Find purchase order by ID",
            "inputSchema": {
                "type": "object",
                "properties": {"orderId": {"type": "string"}},
                "required": ["orderId"]
            },
            "metadata": {"method": "GET", "path": "/store/order/{orderId}"}
        }]}))?,
    )
    .context("write tools")?;

    let port = pick_unused_port()?;
    let adapter = KillOnDrop(spawn_adapter(&cfg_path, &tools_path, port)?);
    let addr = format!("127.0.0.1:{port}");
    wait_tcp_ready(&addr, Duration::from_secs(20)).await?;

    let session = McpSession::connect(&format!("http://{addr}")).await?;

    let tools = session.list_tools().await?;
    assert_eq!(tools[0]["name"], "getOrderById");

    let msg = session.call_tool("getOrderById", json!({"orderId": "a b"})).await?;
    let order = tool_result_json(&msg)?;
    assert_eq!(order["orderId"], "a b");
    assert_eq!(order["apiKey"], "key-123");
    assert_eq!(order["userAgent"], "restmcp-test");

    drop(adapter);
    upstream.stop().await
}
