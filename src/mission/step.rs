use serde::{Deserialize, Serialize};

use super::geometry::{Pose, Position};

/// One action unit of a mission, tagged by `"type"` in mission files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    DriveTo { pose: Pose },
    TakeImage { target: Position },
    TakeThermalImage { target: Position },
    TakeVideo { target: Position, duration: f64 },
    TakeThermalVideo { target: Position, duration: f64 },
    RecordAudio { target: Position, duration: f64 },
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DriveTo { .. } => "drive_to",
            Self::TakeImage { .. } => "take_image",
            Self::TakeThermalImage { .. } => "take_thermal_image",
            Self::TakeVideo { .. } => "take_video",
            Self::TakeThermalVideo { .. } => "take_thermal_video",
            Self::RecordAudio { .. } => "record_audio",
        }
    }

    /// Steps that produce an inspection result worth storing.
    pub fn is_inspection(&self) -> bool {
        !matches!(self, Self::DriveTo { .. })
    }

    pub fn target(&self) -> Option<&Position> {
        match self {
            Self::DriveTo { .. } => None,
            Self::TakeImage { target }
            | Self::TakeThermalImage { target }
            | Self::TakeVideo { target, .. }
            | Self::TakeThermalVideo { target, .. }
            | Self::RecordAudio { target, .. } => Some(target),
        }
    }
}
