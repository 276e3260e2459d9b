use serde::{Deserialize, Serialize};

/// Coordinate frame a geometry value is expressed in.
///
/// Only the canonical lowercase name deserializes directly. Source documents
/// with other spellings go through `reader::FrameCoercion` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frame {
    Robot,
    Asset,
}

impl Frame {
    pub fn all() -> &'static [Frame] {
        &[Frame::Robot, Frame::Asset]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Robot => "robot",
            Self::Asset => "asset",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|frame| frame.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub frame: Frame,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64, frame: Frame) -> Self {
        Self { x, y, z, frame }
    }
}

/// Quaternion orientation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Orientation {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
    pub frame: Frame,
}

impl Orientation {
    pub fn identity(frame: Frame) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
            frame,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Pose {
    pub position: Position,
    pub orientation: Orientation,
    pub frame: Frame,
}
