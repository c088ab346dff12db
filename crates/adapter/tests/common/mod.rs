#![allow(dead_code)]

use anyhow::Context as _;
use axum::Router;
use std::path::Path;
use std::process::{Child, Command};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub fn pick_unused_port() -> anyhow::Result<u16> {
    restmcp_test_support::pick_unused_port()
}

pub async fn wait_tcp_ready(addr: &str, timeout_dur: Duration) -> anyhow::Result<()> {
    restmcp_test_support::wait_tcp_ready(addr, timeout_dur).await
}

pub fn spawn_adapter(config_path: &Path, tools_path: &Path, port: u16) -> anyhow::Result<Child> {
    let bin = env!("CARGO_BIN_EXE_restmcp-adapter");
    Command::new(bin)
        .arg("--config")
        .arg(config_path)
        .arg("--tools")
        .arg(tools_path)
        .arg("--bind")
        .arg(format!("127.0.0.1:{port}"))
        .arg("--log-level")
        .arg("info")
        .spawn()
        .context("spawn adapter")
}

/// An in-process axum server bound to an ephemeral localhost port.
pub struct TestServer {
    pub base_url: String,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    pub async fn start(app: Router) -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind test server")?;
        let addr = listener.local_addr()?;
        let (tx, rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(restmcp_adapter::serve(listener, app, async move {
            let _ = rx.await;
        }));
        Ok(Self {
            base_url: format!("http://{addr}"),
            shutdown: Some(tx),
            handle,
        })
    }

    pub async fn stop(mut self) -> anyhow::Result<()> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.await.context("join test server")??;
        Ok(())
    }
}
