use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use restmcp_adapter::{AdapterConfig, BridgeServer, router, serve};
use restmcp_http_tools::config::ToolsFile;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

/// Serve a REST API's generated tools over MCP streamable HTTP.
#[derive(Debug, Parser)]
#[command(name = "restmcp-adapter", version, about)]
struct Cli {
    /// Adapter config (JSON, or YAML with a .yaml/.yml extension)
    #[arg(long, env = "RESTMCP_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Generated tools document [default: tools.json next to the config file]
    #[arg(long, env = "RESTMCP_TOOLS")]
    tools: Option<PathBuf>,

    /// Listen address (`host:port`), overriding the config's host and port
    #[arg(long, env = "RESTMCP_BIND")]
    bind: Option<String>,

    #[arg(long, env = "RESTMCP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, value_enum, default_value = "text")]
    log_format: LogFormat,
}

fn init_tracing(level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn tools_path(cli: &Cli) -> PathBuf {
    cli.tools.clone().unwrap_or_else(|| {
        cli.config
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("tools.json")
    })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level, cli.log_format);

    let config = AdapterConfig::load(&cli.config)
        .with_context(|| format!("load config {}", cli.config.display()))?;
    let tools_path = tools_path(&cli);
    let tools = ToolsFile::load(&tools_path)
        .with_context(|| format!("load tools {}", tools_path.display()))?;
    let server = BridgeServer::from_config(&config, tools).context("build tool server")?;
    if server.source().catalog().is_empty() {
        warn!(path = %tools_path.display(), "tools document defines no tools");
    }

    let bind = cli.bind.clone().unwrap_or_else(|| config.bind_addr());
    let listener = TcpListener::bind(&bind)
        .await
        .with_context(|| format!("bind {bind}"))?;
    let local = listener.local_addr().context("read local address")?;

    info!(
        server = %config.server_name,
        session_id = %config.session_id,
        tools = server.source().catalog().len(),
        base_url = %server.source().base_url(),
        auth = server.source().auth_kind().unwrap_or("none"),
        "starting MCP adapter"
    );
    info!(
        url = %restmcp_adapter::config::connection_url(&local.ip().to_string(), local.port()),
        "MCP endpoint ready"
    );

    serve(listener, router(server), shutdown_signal())
        .await
        .context("serve")?;
    Ok(())
}
