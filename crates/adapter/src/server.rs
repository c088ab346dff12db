//! MCP surface: `tools/list` and `tools/call` over streamable HTTP at `/mcp`.

use crate::config::AdapterConfig;
use crate::error::Result;
use axum::Router;
use restmcp_http_tools::catalog::ToolCatalog;
use restmcp_http_tools::config::ToolsFile;
use restmcp_http_tools::runtime::ApiToolSource;
use restmcp_http_tools::validation::validate_arguments;
use rmcp::model::{
    CallToolRequestParams, CallToolResult, ListToolsResult, PaginatedRequestParams,
    ServerCapabilities, ServerInfo,
};
use rmcp::service::RequestContext;
use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::streamable_http_server::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ErrorData, RoleServer, ServerHandler};
use serde_json::json;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{info, warn};

/// Path the MCP service is mounted at.
pub const MCP_PATH: &str = "/mcp";

/// Bridges MCP tool calls to the wrapped REST API.
#[derive(Clone)]
pub struct BridgeServer {
    inner: Arc<BridgeServerInner>,
}

struct BridgeServerInner {
    name: String,
    session_id: String,
    source: ApiToolSource,
}

impl BridgeServer {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        session_id: impl Into<String>,
        source: ApiToolSource,
    ) -> Self {
        Self {
            inner: Arc::new(BridgeServerInner {
                name: name.into(),
                session_id: session_id.into(),
                source,
            }),
        }
    }

    /// Compile `tools` and point them at the API described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool catalog is invalid or the outbound client cannot be built.
    pub fn from_config(config: &AdapterConfig, tools: ToolsFile) -> Result<Self> {
        let catalog = ToolCatalog::new(tools.tools)?;
        let source = ApiToolSource::new(catalog, config.api_config())?;
        Ok(Self::new(
            config.server_name.clone(),
            config.session_id.clone(),
            source,
        ))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    #[must_use]
    pub fn source(&self) -> &ApiToolSource {
        &self.inner.source
    }

    async fn dispatch(
        &self,
        request: CallToolRequestParams,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        let inner = &self.inner;
        let tool_name: &str = &request.name;
        let arguments = request.arguments.unwrap_or_default();

        let Some(tool) = inner.source.catalog().get(tool_name) else {
            warn!(tool = %tool_name, session_id = %inner.session_id, "unknown tool");
            return Err(ErrorData::invalid_params(
                format!("unknown tool: {tool_name}"),
                Some(json!({ "tool": tool_name })),
            ));
        };

        if let Err(failure) = validate_arguments(tool, &arguments) {
            warn!(
                tool = %tool_name,
                session_id = %inner.session_id,
                error = %failure.message,
                "rejected tool arguments"
            );
            return Err(ErrorData::invalid_params(failure.message, Some(failure.data)));
        }

        let started = Instant::now();
        let result = inner
            .source
            .call_tool(tool_name, arguments)
            .await
            .map_err(|e| ErrorData::internal_error(e.to_string(), None))?;

        info!(
            tool = %tool_name,
            session_id = %inner.session_id,
            is_error = result.is_error.unwrap_or(false),
            elapsed_ms = started.elapsed().as_millis(),
            "tool call finished"
        );
        Ok(result)
    }
}

impl ServerHandler for BridgeServer {
    fn get_info(&self) -> ServerInfo {
        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info.name.clone_from(&self.inner.name);
        info.server_info.version = env!("CARGO_PKG_VERSION").to_string();
        info.instructions = Some(format!(
            "Tools for the {} API. Each tool issues one HTTP request.",
            self.inner.name
        ));
        info
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParams>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, ErrorData> {
        Ok(ListToolsResult {
            tools: self.inner.source.list_tools(),
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParams,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, ErrorData> {
        self.dispatch(request).await
    }
}

/// Build the HTTP router serving `server` at [`MCP_PATH`].
pub fn router(server: BridgeServer) -> Router {
    let service = StreamableHttpService::new(
        move || Ok(server.clone()),
        Arc::new(LocalSessionManager::default()),
        StreamableHttpServerConfig::default(),
    );
    Router::new().nest_service(MCP_PATH, service)
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the underlying server fails.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
}
