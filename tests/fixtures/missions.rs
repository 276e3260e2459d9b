//! Temporary mission folders.

use std::fs;
use std::path::{Path, PathBuf};

use mission_control::config::AppConfig;
use serde_json::{Value, json};
use tempfile::TempDir;

pub fn image_step(frame: &str) -> Value {
    json!({
        "type": "take_image",
        "target": {"x": 1.0, "y": 2.0, "z": 0.5, "frame": frame}
    })
}

pub fn video_step(frame: &str, duration: f64) -> Value {
    json!({
        "type": "take_video",
        "target": {"x": 0.0, "y": 0.0, "z": 1.0, "frame": frame},
        "duration": duration
    })
}

pub fn drive_step(frame: &str) -> Value {
    json!({
        "type": "drive_to",
        "pose": {
            "position": {"x": 3.0, "y": 4.0, "z": 0.0, "frame": frame},
            "orientation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0, "frame": frame},
            "frame": frame
        }
    })
}

pub fn mission_json(id: i64, steps: Vec<Value>) -> Value {
    json!({ "id": id, "name": format!("mission {}", id), "steps": steps })
}

/// A temporary mission folder plus results folder.
pub struct MissionLibrary {
    temp: TempDir,
}

impl MissionLibrary {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("temp dir");
        fs::create_dir_all(temp.path().join("missions")).expect("missions dir");
        Self { temp }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn folder(&self) -> PathBuf {
        self.temp.path().join("missions")
    }

    pub fn results(&self) -> PathBuf {
        self.temp.path().join("results")
    }

    pub fn with_mission(self, file: &str, mission: Value) -> Self {
        self.write(file, &mission.to_string());
        self
    }

    pub fn with_raw(self, file: &str, content: &str) -> Self {
        self.write(file, content);
        self
    }

    pub fn write(&self, file: &str, content: &str) {
        fs::write(self.folder().join(file), content).expect("write mission file");
    }

    pub fn remove(&self, file: &str) {
        fs::remove_file(self.folder().join(file)).expect("remove mission file");
    }

    /// Configuration pointing at this library, with fast robot and polling.
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::default();
        config.mission.folder = self.folder();
        config.storage.results_dir = self.results();
        config.robot.step_duration_ms = 10;
        config.execution.poll_interval_ms = 5;
        config.execution.request_timeout_ms = 2000;
        config
    }
}
