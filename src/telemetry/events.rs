use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mission::{MissionId, TaskStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    MissionStarted,
    MissionCompleted,
    MissionFailed,
    MissionCancelled,
    StepStarted,
    StepCompleted,
    StepFailed,
    ResultStored,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissionStarted => "mission.started",
            Self::MissionCompleted => "mission.completed",
            Self::MissionFailed => "mission.failed",
            Self::MissionCancelled => "mission.cancelled",
            Self::StepStarted => "step.started",
            Self::StepCompleted => "step.completed",
            Self::StepFailed => "step.failed",
            Self::ResultStored => "result.stored",
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::MissionFailed | Self::StepFailed)
    }

    pub fn is_mission_level(&self) -> bool {
        matches!(
            self,
            Self::MissionStarted
                | Self::MissionCompleted
                | Self::MissionFailed
                | Self::MissionCancelled
        )
    }

    /// Mission status implied by a mission-level event.
    pub fn mission_status(&self) -> Option<TaskStatus> {
        match self {
            Self::MissionStarted => Some(TaskStatus::InProgress),
            Self::MissionCompleted => Some(TaskStatus::Completed),
            Self::MissionFailed | Self::MissionCancelled => Some(TaskStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    pub event_type: EventType,
    pub mission_id: MissionId,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_index: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<(usize, usize)>,
}

impl TelemetryEvent {
    pub fn new(event_type: EventType, mission_id: MissionId) -> Self {
        Self {
            event_type,
            mission_id,
            created_at: Utc::now(),
            step_index: None,
            message: None,
            progress: None,
        }
    }

    pub fn with_step(mut self, step_index: usize) -> Self {
        self.step_index = Some(step_index);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_progress(mut self, completed: usize, total: usize) -> Self {
        self.progress = Some((completed, total));
        self
    }

    pub fn summary(&self) -> String {
        let mut parts = vec![format!("mission {}", self.mission_id)];

        if let Some(step) = self.step_index {
            parts.push(format!("step {}", step));
        }

        if let Some((completed, total)) = self.progress {
            parts.push(format!("{}/{}", completed, total));
        }

        if let Some(msg) = &self.message {
            parts.push(msg.clone());
        }

        parts.join(" · ")
    }
}
