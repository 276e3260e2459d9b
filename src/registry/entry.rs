use std::path::PathBuf;

use serde::Serialize;

use crate::error::RegistryFault;
use crate::mission::{Mission, MissionId, Step};

/// One valid mission of a scan.
///
/// `name` is the file stem, independent of the name declared inside the file.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub id: MissionId,
    pub name: String,
    pub file: PathBuf,
    pub mission: Mission,
}

impl RegistryEntry {
    pub fn from_file(file: PathBuf, mission: Mission) -> Self {
        let name = file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            id: mission.id,
            name,
            file,
            mission,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MissionSummary {
    pub id: MissionId,
    pub name: String,
    pub file: String,
    pub steps: Vec<Step>,
}

impl From<RegistryEntry> for MissionSummary {
    fn from(entry: RegistryEntry) -> Self {
        Self {
            id: entry.id,
            name: entry.name,
            file: entry.file.display().to_string(),
            steps: entry.mission.steps,
        }
    }
}

/// Outcome of validating every mission file in the folder.
#[derive(Debug, Clone)]
pub struct LibraryReport {
    pub files: usize,
    pub valid: Vec<MissionId>,
    pub rejected: Vec<RegistryFault>,
}

impl LibraryReport {
    pub fn new(files: usize, valid: Vec<MissionId>, rejected: Vec<RegistryFault>) -> Self {
        Self {
            files,
            valid,
            rejected,
        }
    }

    /// True when every mission file in the folder made it into the snapshot.
    pub fn is_clean(&self) -> bool {
        self.valid.len() == self.files
    }

    pub fn invalid_files(&self) -> Vec<PathBuf> {
        self.rejected
            .iter()
            .filter_map(|fault| match fault {
                RegistryFault::ParseFailure { file, .. } => Some(file.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn duplicate_ids(&self) -> Vec<MissionId> {
        let mut ids: Vec<MissionId> = self
            .rejected
            .iter()
            .filter_map(|fault| match fault {
                RegistryFault::DuplicateId { id, .. } => Some(MissionId(*id)),
                _ => None,
            })
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}
