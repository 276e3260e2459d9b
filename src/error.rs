use std::path::PathBuf;

use thiserror::Error;

/// Causes of an absent registry result.
///
/// These never cross the registry boundary as values: the registry logs them
/// with their `code()` and returns `None`. Operators tell the causes apart
/// from the logs alone.
#[derive(Error, Debug, Clone)]
pub enum RegistryFault {
    #[error("File {} could not be parsed to a mission: {reason}", .file.display())]
    ParseFailure { file: PathBuf, reason: String },

    #[error("Duplicate mission id {id}: {}{}", .file.display(), also(.conflicting))]
    DuplicateId {
        id: i64,
        file: PathBuf,
        conflicting: Option<PathBuf>,
    },

    #[error("Error reading mission folder {}: {reason}", .folder.display())]
    DirectoryFailure { folder: PathBuf, reason: String },

    #[error("Mission {key} does not exist")]
    LookupFailure { key: String },
}

impl RegistryFault {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParseFailure { .. } => "parse_failure",
            Self::DuplicateId { .. } => "duplicate_id",
            Self::DirectoryFailure { .. } => "directory_failure",
            Self::LookupFailure { .. } => "lookup_failure",
        }
    }
}

fn also(conflicting: &Option<PathBuf>) -> String {
    conflicting
        .as_ref()
        .map(|other| format!(" and {}", other.display()))
        .unwrap_or_default()
}

#[derive(Error, Debug)]
pub enum MissionControlError {
    #[error("Mission not found: {0}")]
    MissionNotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to construct {module}: {message}")]
    Composition {
        module: &'static str,
        message: String,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Robot error: {0}")]
    Robot(String),

    #[error("Queue {queue} is full")]
    QueueFull { queue: &'static str },

    #[error("Queue {queue} is disconnected")]
    QueueDisconnected { queue: &'static str },

    #[error("Operation timed out: {0}")]
    Timeout(String),

    #[error("Execution context failed: {0}")]
    Execution(String),

    #[error("Server error: {0}")]
    Server(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl MissionControlError {
    pub fn composition(module: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Composition {
            module,
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MissionControlError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_fault_codes_are_distinct() {
        let faults = [
            RegistryFault::ParseFailure {
                file: PathBuf::from("a.json"),
                reason: "bad".into(),
            },
            RegistryFault::DuplicateId {
                id: 1,
                file: PathBuf::from("b.json"),
                conflicting: None,
            },
            RegistryFault::DirectoryFailure {
                folder: PathBuf::from("missions"),
                reason: "missing".into(),
            },
            RegistryFault::LookupFailure { key: "7".into() },
        ];

        let codes: HashSet<_> = faults.iter().map(RegistryFault::code).collect();
        assert_eq!(codes.len(), faults.len());
    }

    #[test]
    fn test_duplicate_display_names_both_files() {
        let fault = RegistryFault::DuplicateId {
            id: 3,
            file: PathBuf::from("missions/b.json"),
            conflicting: Some(PathBuf::from("missions/a.json")),
        };
        let text = fault.to_string();
        assert!(text.contains("missions/a.json"));
        assert!(text.contains("missions/b.json"));
    }

    #[test]
    fn test_fault_messages() {
        let lone = RegistryFault::DuplicateId {
            id: 3,
            file: PathBuf::from("missions/c.json"),
            conflicting: None,
        };
        assert_eq!(lone.to_string(), "Duplicate mission id 3: missions/c.json");
        assert_eq!(
            RegistryFault::LookupFailure { key: "7".into() }.to_string(),
            "Mission 7 does not exist"
        );
    }
}
