use serde::{Deserialize, Serialize};

use crate::mission::{MissionId, TaskStatus};

/// Ask the execution engine to run a mission. The engine resolves the id
/// through the registry itself, right before execution.
#[derive(Debug, Clone, Copy)]
pub struct StartMission {
    pub mission_id: MissionId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StartOutcome {
    Started { mission_id: MissionId },
    Busy { current: MissionId },
    NotFound { mission_id: MissionId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StopOutcome {
    Stopped { mission_id: MissionId },
    NothingToStop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    Idle,
    Running,
}

/// Snapshot of what the execution engine is doing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub state: EngineState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<MissionId>,
    /// Names the folder this run's inspection results are stored under.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub mission_status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_step: Option<usize>,
    pub total_steps: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_status: Option<TaskStatus>,
}

impl StatusReport {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Report of a finished mission, kept until the next one starts.
    pub fn finished(
        mission_id: MissionId,
        run_id: &str,
        status: TaskStatus,
        total_steps: usize,
    ) -> Self {
        Self {
            state: EngineState::Idle,
            mission_id: Some(mission_id),
            run_id: Some(run_id.to_string()),
            mission_status: status,
            current_step: None,
            total_steps,
            step_status: None,
        }
    }
}
