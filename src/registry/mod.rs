//! Predefined mission registry.
//!
//! Indexes a folder of mission files by mission id:
//! - `MissionRegistry`: Scans the folder on every query, never caches
//! - `RegistryEntry`, `Snapshot`: Result of one scan
//! - `MissionSummary`: Listing row rendered by the API and CLI
//! - `LibraryReport`: Per-file validation outcome of one scan

mod entry;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tokio::fs;
use tracing::{debug, error, warn};

use crate::error::RegistryFault;
use crate::mission::{Mission, MissionId};
use crate::reader::{JsonReader, ParseError};

pub use entry::{LibraryReport, MissionSummary, RegistryEntry};

/// Valid entries of one scan, in filesystem enumeration order.
pub type Snapshot = IndexMap<MissionId, RegistryEntry>;

const MISSION_EXTENSION: &str = "json";

/// Everything one scan learned, including what it rejected.
struct ScanOutcome {
    snapshot: Snapshot,
    json_files: usize,
    rejected: Vec<RegistryFault>,
}

/// Registry over a folder of predefined mission files.
///
/// Expected directory structure:
/// ```text
/// missions/
/// ├── inspect_pump.json     # one mission per file, stem becomes the entry name
/// ├── patrol_deck_a.json
/// └── ...
/// ```
///
/// Holds no state besides its configuration: every query rescans the folder,
/// so concurrent callers need no locking and always see the files as they are
/// on disk at the time of the call.
pub struct MissionRegistry {
    folder: PathBuf,
    reader: JsonReader,
}

impl MissionRegistry {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self::with_reader(folder, JsonReader::missions())
    }

    pub fn with_reader(folder: impl Into<PathBuf>, reader: JsonReader) -> Self {
        Self {
            folder: folder.into(),
            reader,
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Parse a single mission file, outside of any folder scan.
    pub async fn get_mission(&self, path: &Path) -> Option<Mission> {
        match self.parse(path).await {
            Ok(mission) => Some(mission),
            Err(err) => {
                let fault = RegistryFault::ParseFailure {
                    file: path.to_path_buf(),
                    reason: err.to_string(),
                };
                error!(code = fault.code(), file = %path.display(), "{}", fault);
                None
            }
        }
    }

    /// Build a fresh snapshot of every valid mission in the folder.
    ///
    /// Unparseable files are skipped. Ids declared by more than one file are
    /// excluded entirely: the first holder is evicted when the second shows up,
    /// and any later holder is ignored as well.
    pub async fn load_library(&self) -> Option<Snapshot> {
        self.scan().await.map(|outcome| outcome.snapshot)
    }

    pub async fn list_missions(&self) -> Option<Vec<MissionSummary>> {
        let snapshot = self.load_library().await?;
        Some(snapshot.into_values().map(MissionSummary::from).collect())
    }

    pub async fn get_mission_by_id(&self, id: MissionId) -> Option<Mission> {
        let Some(mut snapshot) = self.load_library().await else {
            error!(mission_id = %id, "Found no missions");
            return None;
        };

        match snapshot.swap_remove(&id) {
            Some(entry) => Some(entry.mission),
            None => {
                let fault = RegistryFault::LookupFailure {
                    key: id.to_string(),
                };
                error!(code = fault.code(), mission_id = %id, "{}", fault);
                None
            }
        }
    }

    /// Resolve an untyped key, as received from a URL or the command line.
    pub async fn get_mission_by_key(&self, key: &str) -> Option<Mission> {
        match key.parse::<MissionId>() {
            Ok(id) => self.get_mission_by_id(id).await,
            Err(err) => {
                let fault = RegistryFault::LookupFailure {
                    key: key.to_string(),
                };
                error!(code = fault.code(), key, error = %err, "Not a mission identifier");
                None
            }
        }
    }

    pub async fn is_valid_id(&self, id: MissionId) -> bool {
        self.get_mission_by_id(id).await.is_some()
    }

    /// Scan the folder and report which files made it into the snapshot.
    pub async fn validate_library(&self) -> Option<LibraryReport> {
        let outcome = self.scan().await?;
        Some(LibraryReport::new(
            outcome.json_files,
            outcome.snapshot.keys().copied().collect(),
            outcome.rejected,
        ))
    }

    async fn parse(&self, path: &Path) -> Result<Mission, ParseError> {
        self.reader.read::<Mission>(path).await
    }

    async fn scan(&self) -> Option<ScanOutcome> {
        match self.try_scan().await {
            Ok(outcome) => {
                debug!(
                    folder = %self.folder.display(),
                    files = outcome.json_files,
                    valid = outcome.snapshot.len(),
                    rejected = outcome.rejected.len(),
                    "Scanned mission folder"
                );
                Some(outcome)
            }
            Err(err) => {
                let fault = RegistryFault::DirectoryFailure {
                    folder: self.folder.clone(),
                    reason: err.to_string(),
                };
                error!(code = fault.code(), folder = %self.folder.display(), "{}", fault);
                None
            }
        }
    }

    async fn try_scan(&self) -> std::io::Result<ScanOutcome> {
        let mut snapshot = Snapshot::new();
        let mut invalid_ids: HashSet<MissionId> = HashSet::new();
        let mut rejected = Vec::new();
        let mut json_files = 0;

        let mut entries = fs::read_dir(&self.folder).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|ext| ext == MISSION_EXTENSION)
                || !fs::metadata(&path).await.is_ok_and(|meta| meta.is_file())
            {
                continue;
            }
            json_files += 1;

            let mission = match self.parse(&path).await {
                Ok(mission) => mission,
                Err(err) => {
                    let fault = RegistryFault::ParseFailure {
                        file: path.clone(),
                        reason: err.to_string(),
                    };
                    warn!(code = fault.code(), file = %path.display(), "{}", fault);
                    rejected.push(fault);
                    continue;
                }
            };
            let id = mission.id;

            if invalid_ids.contains(&id) {
                let fault = RegistryFault::DuplicateId {
                    id: id.value(),
                    file: path,
                    conflicting: None,
                };
                warn!(code = fault.code(), mission_id = %id, "{}", fault);
                rejected.push(fault);
            } else if let Some(existing) = snapshot.shift_remove(&id) {
                let fault = RegistryFault::DuplicateId {
                    id: id.value(),
                    file: path,
                    conflicting: Some(existing.file),
                };
                warn!(code = fault.code(), mission_id = %id, "{}", fault);
                invalid_ids.insert(id);
                rejected.push(fault);
            } else {
                snapshot.insert(id, RegistryEntry::from_file(path, mission));
            }
        }

        Ok(ScanOutcome {
            snapshot,
            json_files,
            rejected,
        })
    }
}
