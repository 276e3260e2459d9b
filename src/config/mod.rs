//! Configuration types and loading.
//!
//! Provides all configuration structures for mission-control:
//! - `AppConfig`: Top-level configuration with validation and key lookup
//! - Section configs: mission folder, server, logging, execution, robot,
//!   storage, telemetry

mod settings;

pub use settings::{
    AppConfig, ExecutionConfig, LoggingConfig, MissionConfig, RobotConfig, RobotKind,
    ServerConfig, StorageConfig, TelemetryConfig,
};
