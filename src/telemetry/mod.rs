//! Mission telemetry.
//!
//! Publishes execution progress:
//! - `TelemetryEvent`: Event types (mission started, step completed, etc.)
//! - `Telemetry`: Capability the execution engine publishes through
//! - `LogTelemetry`: Tracing output plus an optional JSON-lines event log

mod events;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::Result;

pub use events::{EventType, TelemetryEvent};

#[async_trait]
pub trait Telemetry: Send + Sync {
    /// Publishing never fails the caller; transport problems are logged.
    async fn publish(&self, event: &TelemetryEvent);
}

pub struct LogTelemetry {
    event_log: Option<PathBuf>,
}

impl LogTelemetry {
    pub fn new() -> Self {
        Self { event_log: None }
    }

    /// Telemetry that also appends to `event_log`, creating its folder up front.
    pub async fn with_event_log(event_log: impl Into<PathBuf>) -> Result<Self> {
        let event_log = event_log.into();
        if let Some(parent) = event_log.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        Ok(Self {
            event_log: Some(event_log),
        })
    }

    pub fn event_log(&self) -> Option<&Path> {
        self.event_log.as_deref()
    }

    async fn write_event_log(&self, path: &Path, event: &TelemetryEvent) {
        let line = match serde_json::to_string(event) {
            Ok(json) => format!("{}\n", json),
            Err(e) => {
                warn!(error = %e, "Failed to serialize telemetry event");
                return;
            }
        };

        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await;

        match result {
            Ok(mut file) => {
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    warn!(error = %e, "Failed to write event log");
                }
            }
            Err(e) => {
                warn!(error = %e, path = %path.display(), "Failed to open event log");
            }
        }
    }
}

impl Default for LogTelemetry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Telemetry for LogTelemetry {
    async fn publish(&self, event: &TelemetryEvent) {
        if event.event_type.is_error() {
            warn!(event = event.event_type.as_str(), "{}", event.summary());
        } else {
            info!(event = event.event_type.as_str(), "{}", event.summary());
        }

        if let Some(path) = &self.event_log {
            self.write_event_log(path, event).await;
        }
    }
}
