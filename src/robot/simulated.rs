use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::debug;

use super::{RobotInterface, StepHandle};
use crate::config::RobotConfig;
use crate::error::{MissionControlError, Result};
use crate::mission::{Step, TaskStatus};

struct ScheduledStep {
    kind: &'static str,
    started: Instant,
    fails: bool,
}

/// Robot stand-in: every step takes `step_duration`, and steps whose kind is
/// listed in `failing_steps` end as `Failed`.
pub struct SimulatedRobot {
    step_duration: Duration,
    failing_steps: HashSet<String>,
    scheduled: Mutex<HashMap<StepHandle, ScheduledStep>>,
}

impl SimulatedRobot {
    pub fn new(step_duration: Duration) -> Self {
        Self {
            step_duration,
            failing_steps: HashSet::new(),
            scheduled: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RobotConfig) -> Self {
        Self::new(Duration::from_millis(config.step_duration_ms))
            .with_failing_steps(config.failing_steps.iter().cloned())
    }

    pub fn with_failing_steps(mut self, kinds: impl IntoIterator<Item = String>) -> Self {
        self.failing_steps.extend(kinds);
        self
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.lock().len()
    }
}

#[async_trait]
impl RobotInterface for SimulatedRobot {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn schedule_step(&self, step: &Step) -> Result<StepHandle> {
        let handle = StepHandle::new();
        let scheduled = ScheduledStep {
            kind: step.kind(),
            started: Instant::now(),
            fails: self.failing_steps.contains(step.kind()),
        };
        debug!(%handle, kind = scheduled.kind, "Step scheduled");
        self.scheduled.lock().insert(handle, scheduled);
        Ok(handle)
    }

    async fn step_status(&self, handle: StepHandle) -> Result<TaskStatus> {
        let mut scheduled = self.scheduled.lock();
        let Some(step) = scheduled.get(&handle) else {
            return Err(MissionControlError::Robot(format!("unknown step {}", handle)));
        };

        if step.started.elapsed() < self.step_duration {
            return Ok(TaskStatus::InProgress);
        }

        let status = if step.fails {
            TaskStatus::Failed
        } else {
            TaskStatus::Completed
        };
        debug!(%handle, kind = step.kind, %status, "Step finished");
        scheduled.remove(&handle);
        Ok(status)
    }

    async fn stop(&self) -> Result<()> {
        let mut scheduled = self.scheduled.lock();
        debug!(aborted = scheduled.len(), "Robot stopped");
        scheduled.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::{Frame, Position};

    fn image_step() -> Step {
        Step::TakeImage {
            target: Position::new(1.0, 2.0, 0.0, Frame::Robot),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_step_completes_after_duration() {
        let robot = SimulatedRobot::new(Duration::from_millis(100));
        let handle = robot.schedule_step(&image_step()).await.unwrap();

        assert_eq!(robot.step_status(handle).await.unwrap(), TaskStatus::InProgress);

        tokio::time::advance(Duration::from_millis(150)).await;
        assert_eq!(robot.step_status(handle).await.unwrap(), TaskStatus::Completed);
        assert_eq!(robot.scheduled_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_step_kind() {
        let robot = SimulatedRobot::new(Duration::ZERO)
            .with_failing_steps(["take_image".to_string()]);
        let handle = robot.schedule_step(&image_step()).await.unwrap();

        assert_eq!(robot.step_status(handle).await.unwrap(), TaskStatus::Failed);
    }

    #[tokio::test]
    async fn test_unknown_handle_is_error() {
        let robot = SimulatedRobot::new(Duration::ZERO);
        assert!(robot.step_status(StepHandle::new()).await.is_err());
    }

    #[tokio::test]
    async fn test_stop_clears_steps() {
        let robot = SimulatedRobot::new(Duration::from_secs(60));
        robot.schedule_step(&image_step()).await.unwrap();
        robot.stop().await.unwrap();

        assert_eq!(robot.scheduled_count(), 0);
    }
}
