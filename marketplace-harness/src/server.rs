//! HTTP server of the mock backend

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

use crate::api::build_router;
use crate::state::AppState;

/// Mock marketplace backend
pub struct HarnessServer {
    state: Arc<AppState>,
    addr: String,
}

impl HarnessServer {
    /// Server over the seeded catalogue
    pub fn new(addr: impl Into<String>) -> Self {
        Self::with_state(AppState::seeded(), addr)
    }

    pub fn with_state(state: AppState, addr: impl Into<String>) -> Self {
        Self { state: Arc::new(state), addr: addr.into() }
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }

    /// Start the server and run until the process exits
    pub async fn run(self) -> Result<()> {
        let router = build_router(self.state);

        let listener = TcpListener::bind(&self.addr).await?;
        info!("Marketplace harness listening on {}", listener.local_addr()?);

        axum::serve(listener, router).await?;

        Ok(())
    }

    /// Bind and serve in the background; port 0 picks a free port
    pub async fn spawn(self) -> Result<RunningHarness> {
        let listener = TcpListener::bind(&self.addr).await?;
        let addr = listener.local_addr()?;
        let router = build_router(self.state.clone());

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Harness server stopped");
            }
        });
        info!("Marketplace harness listening on {}", addr);

        Ok(RunningHarness { addr, state: self.state, task })
    }
}

/// Background harness; the server stops when this is dropped
pub struct RunningHarness {
    addr: SocketAddr,
    state: Arc<AppState>,
    task: JoinHandle<()>,
}

impl RunningHarness {
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn state(&self) -> &Arc<AppState> {
        &self.state
    }
}

impl Drop for RunningHarness {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Seeded harness on a free local port
pub async fn spawn_local() -> Result<RunningHarness> {
    HarnessServer::new("127.0.0.1:0").spawn().await
}
