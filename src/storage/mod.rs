//! Inspection result storage.
//!
//! - `InspectionRecord`: Outcome of one inspection step
//! - `Storage`: Capability the execution engine writes records through
//! - `LocalStorage`: One JSON file per record under a results folder

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{MissionControlError, Result};
use crate::mission::{MissionId, Step, TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionRecord {
    pub mission_id: MissionId,
    pub run_id: String,
    pub step_index: usize,
    pub step: Step,
    pub status: TaskStatus,
    pub recorded_at: DateTime<Utc>,
}

impl InspectionRecord {
    pub fn new(
        mission_id: MissionId,
        run_id: impl Into<String>,
        step_index: usize,
        step: Step,
        status: TaskStatus,
    ) -> Self {
        Self {
            mission_id,
            run_id: run_id.into(),
            step_index,
            step,
            status,
            recorded_at: Utc::now(),
        }
    }

    fn file_name(&self) -> String {
        format!("{:03}_{}.json", self.step_index, self.step.kind())
    }
}

#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist a record, returning where it went.
    async fn store(&self, record: &InspectionRecord) -> Result<PathBuf>;
}

pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Open the results folder, creating it if needed.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self { root: root.into() };
        fs::create_dir_all(&storage.root).await?;
        storage.recover_interrupted_writes().await;
        Ok(storage)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, record: &InspectionRecord) -> PathBuf {
        self.root
            .join(record.mission_id.to_string())
            .join(&record.run_id)
            .join(record.file_name())
    }

    async fn write_atomic(&self, path: &Path, content: &str) -> Result<()> {
        let tmp_path = path.with_extension("json.tmp");

        fs::write(&tmp_path, content).await?;

        let tmp_path_clone = tmp_path.clone();
        let sync_result = tokio::task::spawn_blocking(move || {
            std::fs::File::open(&tmp_path_clone).and_then(|file| file.sync_all())
        })
        .await;

        match sync_result {
            Err(e) => warn!(error = %e, "Failed to sync temp file to disk"),
            Ok(Err(e)) => warn!(error = %e, "Failed to sync temp file to disk"),
            Ok(Ok(())) => {}
        }

        fs::rename(&tmp_path, path).await?;

        debug!(path = %path.display(), "Atomic write completed");
        Ok(())
    }

    /// Records live two levels down, under `<mission>/<run>/`.
    async fn recover_interrupted_writes(&self) {
        let mut folders = vec![(self.root.clone(), 0)];
        while let Some((folder, depth)) = folders.pop() {
            let Ok(mut entries) = fs::read_dir(&folder).await else {
                continue;
            };
            while let Ok(Some(entry)) = entries.next_entry().await {
                let path = entry.path();
                if depth < 2 && entry.file_type().await.is_ok_and(|t| t.is_dir()) {
                    folders.push((path, depth + 1));
                } else if path.extension().is_some_and(|ext| ext == "tmp") {
                    debug!(path = %path.display(), "Removing interrupted write");
                    let _ = fs::remove_file(&path).await;
                }
            }
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(&self, record: &InspectionRecord) -> Result<PathBuf> {
        let path = self.record_path(record);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(record)
            .map_err(|e| MissionControlError::Storage(e.to_string()))?;
        self.write_atomic(&path, &content).await?;
        Ok(path)
    }
}
