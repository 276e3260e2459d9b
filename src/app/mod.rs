//! Application composition and serving.
//!
//! Wires every subsystem once at startup:
//! - `compose` / `Services`: Builds and shares all subsystems
//! - `ExecutionHandle`: Supervised background execution context
//! - `router` and handlers: HTTP interface over `Services`
//! - `App`: Composed services, router and execution context together

pub mod api;
mod composer;
mod supervisor;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::{MissionControlError, Result};

pub use api::{ApiError, MissionList, router};
pub use composer::{Services, compose};
pub use supervisor::{ExecutionExit, ExecutionHandle, supervise};

use supervisor::wait_for_exit;

#[derive(Debug, Clone, Copy)]
pub struct AppOptions {
    /// Start the background execution context. Tests turn this off to drive
    /// the queues themselves.
    pub start_execution: bool,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            start_execution: true,
        }
    }
}

pub struct App {
    router: Router,
    services: Arc<Services>,
    execution: Option<ExecutionHandle>,
}

/// Compose services, build the router and start execution.
pub async fn create_app(config: &AppConfig, options: AppOptions) -> Result<App> {
    let services = compose(config).await?;
    let router = router(services.clone());

    let execution = if options.start_execution {
        Some(ExecutionHandle::spawn(services.clone()))
    } else {
        None
    };

    Ok(App {
        router,
        services,
        execution,
    })
}

impl App {
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The services instance handed to the router.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn execution(&self) -> Option<&ExecutionHandle> {
        self.execution.as_ref()
    }

    /// Resolves on ctrl-c or once the execution context has stopped for good.
    pub async fn shutdown_signal(&self) -> Option<ExecutionExit> {
        shutdown_signal(self.execution.as_ref().map(ExecutionHandle::subscribe)).await
    }

    /// Serve HTTP until shutdown. Fails when execution ran out of restarts.
    pub async fn serve(self) -> Result<()> {
        let address = self.services.config.server.address();
        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| MissionControlError::Server(format!("cannot bind {}: {}", address, e)))?;
        info!(%address, "Serving mission control API");

        let (exit_tx, exit_rx) = oneshot::channel();
        let execution = self.execution.as_ref().map(ExecutionHandle::subscribe);
        axum::serve(listener, self.router.clone())
            .with_graceful_shutdown(async move {
                let _ = exit_tx.send(shutdown_signal(execution).await);
            })
            .await
            .map_err(|e| MissionControlError::Server(e.to_string()))?;

        match exit_rx.await.ok().flatten() {
            Some(ExecutionExit::Exhausted { restarts }) => {
                error!(restarts, "Execution context gave up");
                Err(MissionControlError::Execution(format!(
                    "execution context failed after {} restarts",
                    restarts
                )))
            }
            _ => Ok(()),
        }
    }
}

async fn shutdown_signal(
    execution: Option<watch::Receiver<Option<ExecutionExit>>>,
) -> Option<ExecutionExit> {
    let stopped = async {
        match execution {
            Some(exit) => Some(wait_for_exit(exit).await),
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for ctrl-c");
            }
            info!("Shutdown requested");
            None
        }
        exit = stopped => exit,
    }
}
