//! Robot capability interface.
//!
//! - `RobotInterface`: What the execution engine needs from a robot
//! - `SimulatedRobot`: In-process robot that finishes steps after a fixed time

mod simulated;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::mission::{Step, TaskStatus};

pub use simulated::SimulatedRobot;

/// Identifies a step scheduled on the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepHandle(Uuid);

impl StepHandle {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for StepHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for StepHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[async_trait]
pub trait RobotInterface: Send + Sync {
    fn name(&self) -> &str;

    async fn schedule_step(&self, step: &Step) -> Result<StepHandle>;

    async fn step_status(&self, handle: StepHandle) -> Result<TaskStatus>;

    /// Abort whatever the robot is doing.
    async fn stop(&self) -> Result<()>;
}
