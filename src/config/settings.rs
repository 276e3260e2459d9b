use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{MissionControlError, Result};

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub mission: MissionConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub execution: ExecutionConfig,
    pub robot: RobotConfig,
    pub storage: StorageConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load from a TOML file, falling back to defaults when it does not exist.
    pub async fn load(path: &Path) -> Result<Self> {
        let config = if path.exists() {
            let content = fs::read_to_string(path).await?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| MissionControlError::Config(e.to_string()))
    }

    /// Section/key lookup, rendered as a string.
    pub fn lookup(&self, section: &str, key: &str) -> Option<String> {
        let value = toml::Value::try_from(self).ok()?;
        match value.get(section)?.get(key)? {
            toml::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Validate configuration values for consistency and safety.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.mission.folder.as_os_str().is_empty() {
            errors.push("mission.folder must not be empty".to_string());
        }

        if self.server.host.trim().is_empty() {
            errors.push("server.host must not be empty".to_string());
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            ));
        }
        for (target, level) in &self.logging.targets {
            if !LOG_LEVELS.contains(&level.as_str()) {
                errors.push(format!("logging.targets.{} has unknown level `{}`", target, level));
            }
        }

        let ex = &self.execution;
        if ex.queue_capacity == 0 {
            errors.push("execution.queue_capacity must be greater than 0".to_string());
        }
        if ex.request_timeout_ms == 0 {
            errors.push("execution.request_timeout_ms must be greater than 0".to_string());
        }
        if ex.poll_interval_ms == 0 {
            errors.push("execution.poll_interval_ms must be greater than 0".to_string());
        }
        if ex.poll_interval_ms >= ex.request_timeout_ms {
            errors.push("execution.poll_interval_ms must be less than request_timeout_ms".to_string());
        }

        if self.storage.results_dir.as_os_str().is_empty() {
            errors.push("storage.results_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(MissionControlError::Config(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MissionConfig {
    /// Folder holding one JSON file per predefined mission.
    pub folder: PathBuf,
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("missions"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for everything not listed in `targets`.
    pub level: String,
    /// Colored output.
    pub ansi: bool,
    /// Per-subsystem levels, keyed by module name (`registry`, `state_machine`, ...)
    /// or by a full tracing target.
    pub targets: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
            targets: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Bound of each request queue between the API and the execution engine.
    pub queue_capacity: usize,
    /// How long the API waits for the execution engine to answer.
    pub request_timeout_ms: u64,
    /// Interval at which the engine polls the robot for step progress.
    pub poll_interval_ms: u64,
    /// Restarts of a failed execution context before the process shuts down
    /// (0 = shut down on the first failure).
    pub max_restarts: u32,
    /// Base delay between restarts, doubled after each attempt.
    pub restart_backoff_ms: u64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            request_timeout_ms: 5000,
            poll_interval_ms: 200,
            max_restarts: 3,
            restart_backoff_ms: 500,
        }
    }
}

impl ExecutionConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Delay before restart number `attempt` (starting at 0).
    pub fn restart_backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt.min(16)).unwrap_or(u64::MAX);
        Duration::from_millis(self.restart_backoff_ms.saturating_mul(factor))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RobotKind {
    #[default]
    Simulated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub kind: RobotKind,
    /// Time the simulated robot needs per step.
    pub step_duration_ms: u64,
    /// Step kinds (`take_image`, ...) the simulated robot reports as failed.
    pub failing_steps: Vec<String>,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            kind: RobotKind::Simulated,
            step_duration_ms: 1000,
            failing_steps: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root folder for inspection results.
    pub results_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from("results"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Append every telemetry event as a JSON line to this file.
    pub event_log: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[tokio::test]
    async fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load(&temp.path().join("absent.toml")).await.unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.mission.folder, PathBuf::from("missions"));
    }

    #[tokio::test]
    async fn test_load_partial_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("mission-control.toml");
        fs::write(
            &path,
            "[mission]\nfolder = \"/srv/missions\"\n\n[logging.targets]\nregistry = \"debug\"\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.mission.folder, PathBuf::from("/srv/missions"));
        assert_eq!(config.logging.targets.get("registry").map(String::as_str), Some("debug"));
        assert_eq!(config.execution.queue_capacity, 16);
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = AppConfig::default();
        config.execution.queue_capacity = 0;
        config.logging.level = "loud".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("queue_capacity"));
        assert!(err.contains("logging.level"));
    }

    #[test]
    fn test_unknown_robot_kind_rejected() {
        assert!(AppConfig::from_toml("[robot]\nkind = \"quadruped\"\n").is_err());
    }

    #[test]
    fn test_lookup() {
        let config = AppConfig::default();

        assert_eq!(config.lookup("mission", "folder").as_deref(), Some("missions"));
        assert_eq!(config.lookup("server", "port").as_deref(), Some("3000"));
        assert!(config.lookup("server", "nope").is_none());
        assert!(config.lookup("nope", "port").is_none());
    }

    #[test]
    fn test_restart_backoff_doubles() {
        let ex = ExecutionConfig {
            restart_backoff_ms: 100,
            ..ExecutionConfig::default()
        };

        assert_eq!(ex.restart_backoff(0), Duration::from_millis(100));
        assert_eq!(ex.restart_backoff(1), Duration::from_millis(200));
        assert_eq!(ex.restart_backoff(3), Duration::from_millis(800));
    }
}
