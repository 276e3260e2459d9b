//! JSON document hydration.
//!
//! Turns a JSON file into a typed value in two passes:
//! - `Coercion`: Rewrites every value stored under a given key, at any depth
//! - `JsonReader`: Applies its coercions, then deserializes with serde
//!
//! Either pass failing fails the whole document; no partially populated value
//! is ever returned.

mod coercion;

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tokio::fs;

pub use coercion::{Coercion, FrameCoercion};

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON: {0}")]
    Syntax(#[source] serde_json::Error),

    #[error("cannot coerce `{field}` at {pointer}: {message}")]
    Coercion {
        field: String,
        pointer: String,
        message: String,
    },

    #[error("document does not match schema: {0}")]
    Schema(#[source] serde_json::Error),
}

impl ParseError {
    pub fn is_missing_file(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == std::io::ErrorKind::NotFound)
    }
}

/// Generic file-to-object hydrator with an explicit coercion list.
#[derive(Default)]
pub struct JsonReader {
    coercions: Vec<Box<dyn Coercion>>,
}

impl JsonReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reader for mission files: coordinate frames need coercion.
    pub fn missions() -> Self {
        Self::new().with_coercion(FrameCoercion)
    }

    pub fn with_coercion(mut self, coercion: impl Coercion + 'static) -> Self {
        self.coercions.push(Box::new(coercion));
        self
    }

    pub fn coerced_fields(&self) -> impl Iterator<Item = &str> {
        self.coercions.iter().map(|c| c.field())
    }

    pub async fn read_json(&self, path: &Path) -> Result<Value, ParseError> {
        let content = fs::read_to_string(path).await.map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(ParseError::Syntax)
    }

    pub async fn read<T: DeserializeOwned>(&self, path: &Path) -> Result<T, ParseError> {
        let value = self.read_json(path).await?;
        self.hydrate(value)
    }

    pub fn hydrate<T: DeserializeOwned>(&self, mut value: Value) -> Result<T, ParseError> {
        let mut pointer = String::new();
        self.apply_coercions(&mut value, &mut pointer)?;
        serde_json::from_value(value).map_err(ParseError::Schema)
    }

    fn apply_coercions(&self, value: &mut Value, pointer: &mut String) -> Result<(), ParseError> {
        match value {
            Value::Object(map) => {
                for (key, child) in map.iter_mut() {
                    let len = pointer.len();
                    pointer.push('/');
                    pointer.push_str(key);

                    match self.coercions.iter().find(|c| c.field() == key.as_str()) {
                        Some(coercion) => {
                            *child = coercion.coerce(child).map_err(|message| {
                                ParseError::Coercion {
                                    field: key.clone(),
                                    pointer: pointer.clone(),
                                    message,
                                }
                            })?;
                        }
                        None => self.apply_coercions(child, pointer)?,
                    }

                    pointer.truncate(len);
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter_mut().enumerate() {
                    let len = pointer.len();
                    pointer.push('/');
                    pointer.push_str(&index.to_string());
                    self.apply_coercions(item, pointer)?;
                    pointer.truncate(len);
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{Frame, Mission, MissionId, Step};
    use serde_json::json;
    use tempfile::TempDir;

    fn target(frame: Value) -> Value {
        json!({"x": 1.0, "y": 2.0, "z": 0.0, "frame": frame})
    }

    #[test]
    fn test_frame_spellings_coerced() {
        let reader = JsonReader::missions();
        let doc = json!({
            "id": 1,
            "steps": [
                {"type": "take_image", "target": target(json!("Robot"))},
                {"type": "take_image", "target": target(json!({"name": "ASSET"}))},
            ]
        });

        let mission: Mission = reader.hydrate(doc).unwrap();

        assert_eq!(mission.id, MissionId(1));
        assert_eq!(mission.steps[0].target().unwrap().frame, Frame::Robot);
        assert_eq!(mission.steps[1].target().unwrap().frame, Frame::Asset);
    }

    #[test]
    fn test_one_bad_frame_fails_document() {
        let reader = JsonReader::missions();
        let doc = json!({
            "id": 1,
            "steps": [
                {"type": "take_image", "target": target(json!("robot"))},
                {"type": "take_image", "target": target(json!("world"))},
            ]
        });

        let err = reader.hydrate::<Mission>(doc).unwrap_err();
        match err {
            ParseError::Coercion { field, pointer, .. } => {
                assert_eq!(field, "frame");
                assert_eq!(pointer, "/steps/1/target/frame");
            }
            other => panic!("expected coercion error, got {other:?}"),
        }
    }

    #[test]
    fn test_without_coercion_non_canonical_frame_fails() {
        let reader = JsonReader::new();
        let doc = json!({
            "id": 1,
            "steps": [{"type": "take_image", "target": target(json!("Robot"))}]
        });

        assert!(matches!(
            reader.hydrate::<Mission>(doc),
            Err(ParseError::Schema(_))
        ));
    }

    #[test]
    fn test_nested_pose_frames_coerced() {
        let reader = JsonReader::missions();
        let doc = json!({
            "id": 5,
            "steps": [{
                "type": "drive_to",
                "pose": {
                    "position": {"x": 0.0, "y": 0.0, "z": 0.0, "frame": "ASSET"},
                    "orientation": {"x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0, "frame": "Asset"},
                    "frame": {"name": "asset"}
                }
            }]
        });

        let mission: Mission = reader.hydrate(doc).unwrap();
        match &mission.steps[0] {
            Step::DriveTo { pose } => {
                assert_eq!(pose.frame, Frame::Asset);
                assert_eq!(pose.position.frame, Frame::Asset);
                assert_eq!(pose.orientation.frame, Frame::Asset);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_read_reports_missing_file() {
        let temp = TempDir::new().unwrap();
        let reader = JsonReader::missions();

        let err = reader
            .read::<Mission>(&temp.path().join("absent.json"))
            .await
            .unwrap_err();
        assert!(err.is_missing_file());
    }

    #[tokio::test]
    async fn test_read_reports_syntax_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("broken.json");
        fs::write(&path, "{\"id\": 1, ").await.unwrap();

        let err = JsonReader::missions().read::<Mission>(&path).await.unwrap_err();
        assert!(matches!(err, ParseError::Syntax(_)));
    }

    #[test]
    fn test_coerced_fields_listed() {
        let reader = JsonReader::missions();
        assert_eq!(reader.coerced_fields().collect::<Vec<_>>(), vec!["frame"]);
    }
}
