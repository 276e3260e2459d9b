use chrono::Utc;
use uuid::Uuid;

use crate::mission::{Mission, MissionId, Step, TaskStatus};
use crate::queues::{EngineState, StatusReport};
use crate::robot::StepHandle;

/// Bookkeeping for the mission the engine is currently running.
pub(super) struct ActiveMission {
    mission: Mission,
    run_id: String,
    step_index: usize,
    handle: Option<StepHandle>,
    step_status: TaskStatus,
}

impl ActiveMission {
    pub(super) fn new(mission: Mission) -> Self {
        Self {
            mission,
            run_id: new_run_id(),
            step_index: 0,
            handle: None,
            step_status: TaskStatus::NotStarted,
        }
    }

    pub(super) fn id(&self) -> MissionId {
        self.mission.id
    }

    pub(super) fn run_id(&self) -> &str {
        &self.run_id
    }

    pub(super) fn total_steps(&self) -> usize {
        self.mission.steps.len()
    }

    pub(super) fn step_index(&self) -> usize {
        self.step_index
    }

    pub(super) fn current_step(&self) -> Option<&Step> {
        self.mission.steps.get(self.step_index)
    }

    pub(super) fn handle(&self) -> Option<StepHandle> {
        self.handle
    }

    pub(super) fn start_step(&mut self, handle: StepHandle) {
        self.handle = Some(handle);
        self.step_status = TaskStatus::InProgress;
    }

    pub(super) fn set_step_status(&mut self, status: TaskStatus) {
        self.step_status = status;
    }

    /// Move past the current step.
    pub(super) fn next_step(&mut self) {
        self.step_index += 1;
        self.handle = None;
        self.step_status = TaskStatus::NotStarted;
    }

    pub(super) fn is_done(&self) -> bool {
        self.step_index >= self.total_steps()
    }

    pub(super) fn report(&self) -> StatusReport {
        let on_step = !self.is_done();
        StatusReport {
            state: EngineState::Running,
            mission_id: Some(self.id()),
            run_id: Some(self.run_id.clone()),
            mission_status: TaskStatus::InProgress,
            current_step: on_step.then_some(self.step_index),
            total_steps: self.total_steps(),
            step_status: on_step.then_some(self.step_status),
        }
    }

    pub(super) fn finish(&self, status: TaskStatus) -> StatusReport {
        StatusReport::finished(self.id(), &self.run_id, status, self.total_steps())
    }
}

/// Start time first so runs sort chronologically, then a random suffix.
fn new_run_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", Utc::now().format("%Y%m%dT%H%M%S%3fZ"), &suffix[..8])
}
