//! Mission execution engine.
//!
//! Runs in its own execution context and talks to the request side only
//! through the shared queues:
//! - `StateMachine`: Idle/running loop over the start, stop and status queues

mod active;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::error::{MissionControlError, Result};
use crate::mission::{Step, TaskStatus};
use crate::queues::{Pending, Queues, StartMission, StartOutcome, StatusReport, StopOutcome};
use crate::registry::MissionRegistry;
use crate::robot::RobotInterface;
use crate::storage::{InspectionRecord, Storage};
use crate::telemetry::{EventType, Telemetry, TelemetryEvent};

use active::ActiveMission;

pub struct StateMachine {
    registry: Arc<MissionRegistry>,
    robot: Arc<dyn RobotInterface>,
    storage: Arc<dyn Storage>,
    telemetry: Arc<dyn Telemetry>,
    queues: Arc<Queues>,
    poll_interval: Duration,
}

impl StateMachine {
    pub fn new(
        registry: Arc<MissionRegistry>,
        robot: Arc<dyn RobotInterface>,
        storage: Arc<dyn Storage>,
        telemetry: Arc<dyn Telemetry>,
        queues: Arc<Queues>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            registry,
            robot,
            storage,
            telemetry,
            queues,
            poll_interval,
        }
    }

    pub fn registry(&self) -> &Arc<MissionRegistry> {
        &self.registry
    }

    pub fn robot(&self) -> &Arc<dyn RobotInterface> {
        &self.robot
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    pub fn telemetry(&self) -> &Arc<dyn Telemetry> {
        &self.telemetry
    }

    pub fn queues(&self) -> &Arc<Queues> {
        &self.queues
    }

    /// Serve the queues until they close. Fails immediately when another
    /// engine already consumes them.
    pub async fn run(&self) -> Result<()> {
        let mut start = self.queues.start_mission.consumer()?;
        let mut stop = self.queues.stop_mission.consumer()?;
        let mut status = self.queues.mission_status.consumer()?;

        let mut last_report = StatusReport::idle();
        let mut active: Option<ActiveMission> = None;

        // One ticker for the whole loop so queue traffic cannot postpone a poll.
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(robot = self.robot.name(), "Execution engine running");

        loop {
            match active.take() {
                None => tokio::select! {
                    Some(pending) = start.next() => {
                        active = self.begin(pending).await;
                        ticker.reset();
                    }
                    Some(pending) = stop.next() => {
                        pending.respond(StopOutcome::NothingToStop);
                    }
                    Some(pending) = status.next() => {
                        pending.respond(last_report.clone());
                    }
                    else => break,
                },
                Some(mut mission) => tokio::select! {
                    Some(pending) = start.next() => {
                        debug!(current = %mission.id(), "Rejecting start while busy");
                        pending.respond(StartOutcome::Busy { current: mission.id() });
                        active = Some(mission);
                    }
                    Some(pending) = stop.next() => {
                        self.cancel(&mission).await;
                        last_report = mission.finish(TaskStatus::Failed);
                        pending.respond(StopOutcome::Stopped { mission_id: mission.id() });
                    }
                    Some(pending) = status.next() => {
                        pending.respond(mission.report());
                        active = Some(mission);
                    }
                    _ = ticker.tick() => {
                        match self.advance(&mut mission).await {
                            Some(outcome) => last_report = mission.finish(outcome),
                            None => active = Some(mission),
                        }
                    }
                },
            }
        }

        Err(MissionControlError::QueueDisconnected {
            queue: self.queues.start_mission.name(),
        })
    }

    /// Resolve the mission right before running it.
    async fn begin(&self, pending: Pending<StartMission, StartOutcome>) -> Option<ActiveMission> {
        let mission_id = pending.request.mission_id;
        let Some(mission) = self.registry.get_mission_by_id(mission_id).await else {
            warn!(%mission_id, "Mission vanished before execution");
            pending.respond(StartOutcome::NotFound { mission_id });
            return None;
        };

        let active = ActiveMission::new(mission);
        pending.respond(StartOutcome::Started { mission_id });
        self.publish(
            TelemetryEvent::new(EventType::MissionStarted, mission_id)
                .with_progress(0, active.total_steps()),
        )
        .await;
        Some(active)
    }

    async fn cancel(&self, mission: &ActiveMission) {
        if let Err(e) = self.robot.stop().await {
            warn!(mission_id = %mission.id(), error = %e, "Robot refused to stop");
        }
        self.publish(
            TelemetryEvent::new(EventType::MissionCancelled, mission.id())
                .with_progress(mission.step_index(), mission.total_steps()),
        )
        .await;
    }

    /// Drive the current step forward. Returns the mission outcome once it
    /// has finished.
    async fn advance(&self, mission: &mut ActiveMission) -> Option<TaskStatus> {
        let Some(step) = mission.current_step().cloned() else {
            return Some(self.complete(mission).await);
        };
        let index = mission.step_index();

        let Some(handle) = mission.handle() else {
            match self.robot.schedule_step(&step).await {
                Ok(handle) => {
                    mission.start_step(handle);
                    self.publish(
                        TelemetryEvent::new(EventType::StepStarted, mission.id())
                            .with_step(index)
                            .with_message(step.kind()),
                    )
                    .await;
                    return None;
                }
                Err(e) => {
                    let outcome = self.fail(mission, TaskStatus::Unexpected, e.to_string());
                    return Some(outcome.await);
                }
            }
        };

        let status = match self.robot.step_status(handle).await {
            Ok(status) => status,
            Err(e) => {
                let outcome = self.fail(mission, TaskStatus::Unexpected, e.to_string());
                return Some(outcome.await);
            }
        };
        mission.set_step_status(status);

        match status {
            TaskStatus::Completed => {
                if step.is_inspection() {
                    self.store_result(mission, index, step).await;
                }
                self.publish(
                    TelemetryEvent::new(EventType::StepCompleted, mission.id())
                        .with_step(index)
                        .with_progress(index + 1, mission.total_steps()),
                )
                .await;

                mission.next_step();
                if mission.is_done() {
                    Some(self.complete(mission).await)
                } else {
                    None
                }
            }
            TaskStatus::Failed | TaskStatus::Unexpected => Some(
                self.fail(mission, status, format!("{} ended as {}", step.kind(), status))
                    .await,
            ),
            TaskStatus::NotStarted | TaskStatus::InProgress => None,
        }
    }

    async fn store_result(&self, mission: &ActiveMission, index: usize, step: Step) {
        let record = InspectionRecord::new(
            mission.id(),
            mission.run_id(),
            index,
            step,
            TaskStatus::Completed,
        );
        match self.storage.store(&record).await {
            Ok(path) => {
                self.publish(
                    TelemetryEvent::new(EventType::ResultStored, mission.id())
                        .with_step(index)
                        .with_message(path.display().to_string()),
                )
                .await;
            }
            Err(e) => {
                warn!(mission_id = %mission.id(), step = index, error = %e, "Failed to store inspection result");
            }
        }
    }

    async fn complete(&self, mission: &ActiveMission) -> TaskStatus {
        self.publish(
            TelemetryEvent::new(EventType::MissionCompleted, mission.id())
                .with_progress(mission.total_steps(), mission.total_steps()),
        )
        .await;
        TaskStatus::Completed
    }

    /// A failed step fails the whole mission.
    async fn fail(&self, mission: &ActiveMission, status: TaskStatus, reason: String) -> TaskStatus {
        self.publish(
            TelemetryEvent::new(EventType::StepFailed, mission.id())
                .with_step(mission.step_index())
                .with_message(reason),
        )
        .await;
        self.publish(
            TelemetryEvent::new(EventType::MissionFailed, mission.id())
                .with_progress(mission.step_index(), mission.total_steps()),
        )
        .await;
        status
    }

    async fn publish(&self, event: TelemetryEvent) {
        self.telemetry.publish(&event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::MissionId;
    use crate::queues::EngineState;
    use crate::robot::SimulatedRobot;
    use crate::storage::LocalStorage;
    use crate::telemetry::LogTelemetry;
    use serde_json::json;
    use tempfile::TempDir;
    use tokio::fs;

    const TIMEOUT: Duration = Duration::from_secs(2);

    struct Harness {
        _temp: TempDir,
        results: std::path::PathBuf,
        queues: Arc<Queues>,
        engine: tokio::task::JoinHandle<Result<()>>,
    }

    async fn harness(robot: SimulatedRobot) -> Harness {
        let temp = TempDir::new().unwrap();
        let missions = temp.path().join("missions");
        fs::create_dir_all(&missions).await.unwrap();

        let target = json!({"x": 1.0, "y": 2.0, "z": 0.5, "frame": "asset"});
        fs::write(
            missions.join("inspect.json"),
            json!({
                "id": 1,
                "steps": [
                    {"type": "take_image", "target": target},
                    {"type": "take_thermal_image", "target": target}
                ]
            })
            .to_string(),
        )
        .await
        .unwrap();

        let results = temp.path().join("results");
        let queues = Arc::new(Queues::new(4));
        let machine = StateMachine::new(
            Arc::new(MissionRegistry::new(&missions)),
            Arc::new(robot),
            Arc::new(LocalStorage::open(&results).await.unwrap()),
            Arc::new(LogTelemetry::new()),
            queues.clone(),
            Duration::from_millis(5),
        );
        let engine = tokio::spawn(async move { machine.run().await });

        Harness {
            _temp: temp,
            results,
            queues,
            engine,
        }
    }

    async fn start(queues: &Queues, id: i64) -> StartOutcome {
        queues
            .start_mission
            .request(
                StartMission {
                    mission_id: MissionId(id),
                },
                TIMEOUT,
            )
            .await
            .unwrap()
    }

    async fn status(queues: &Queues) -> StatusReport {
        queues.mission_status.request((), TIMEOUT).await.unwrap()
    }

    async fn wait_until_idle(queues: &Queues) -> StatusReport {
        for _ in 0..200 {
            let report = status(queues).await;
            if report.state == EngineState::Idle {
                return report;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("mission did not finish");
    }

    #[tokio::test]
    async fn test_mission_runs_to_completion() {
        let h = harness(SimulatedRobot::new(Duration::from_millis(10))).await;

        assert_eq!(
            start(&h.queues, 1).await,
            StartOutcome::Started {
                mission_id: MissionId(1)
            }
        );

        let report = wait_until_idle(&h.queues).await;
        assert_eq!(report.mission_id, Some(MissionId(1)));
        assert_eq!(report.mission_status, TaskStatus::Completed);
        assert_eq!(report.total_steps, 2);

        let run = h.results.join("1").join(report.run_id.unwrap());
        assert!(run.join("000_take_image.json").exists());
        assert!(run.join("001_take_thermal_image.json").exists());
        h.engine.abort();
    }

    #[tokio::test]
    async fn test_start_while_running_is_busy() {
        let h = harness(SimulatedRobot::new(Duration::from_secs(30))).await;

        start(&h.queues, 1).await;
        assert_eq!(
            start(&h.queues, 1).await,
            StartOutcome::Busy {
                current: MissionId(1)
            }
        );

        let report = status(&h.queues).await;
        assert_eq!(report.state, EngineState::Running);
        assert_eq!(report.current_step, Some(0));
        h.engine.abort();
    }

    #[tokio::test]
    async fn test_stop_cancels_running_mission() {
        let h = harness(SimulatedRobot::new(Duration::from_secs(30))).await;

        let idle_stop = h.queues.stop_mission.request((), TIMEOUT).await.unwrap();
        assert_eq!(idle_stop, StopOutcome::NothingToStop);

        start(&h.queues, 1).await;
        let stopped = h.queues.stop_mission.request((), TIMEOUT).await.unwrap();
        assert_eq!(
            stopped,
            StopOutcome::Stopped {
                mission_id: MissionId(1)
            }
        );

        let report = status(&h.queues).await;
        assert_eq!(report.state, EngineState::Idle);
        assert_eq!(report.mission_status, TaskStatus::Failed);
        h.engine.abort();
    }

    #[tokio::test]
    async fn test_failed_step_fails_mission() {
        let robot = SimulatedRobot::new(Duration::from_millis(5))
            .with_failing_steps(["take_thermal_image".to_string()]);
        let h = harness(robot).await;

        start(&h.queues, 1).await;
        let report = wait_until_idle(&h.queues).await;

        assert_eq!(report.mission_status, TaskStatus::Failed);
        let run = h.results.join("1").join(report.run_id.unwrap());
        assert!(run.join("000_take_image.json").exists());
        assert!(!run.join("001_take_thermal_image.json").exists());
        h.engine.abort();
    }

    #[tokio::test]
    async fn test_frequent_status_requests_do_not_stall_mission() {
        let h = harness(SimulatedRobot::new(Duration::from_millis(1))).await;
        start(&h.queues, 1).await;

        // Status arrives faster than the 5ms poll interval throughout.
        let mut report = status(&h.queues).await;
        for _ in 0..500 {
            if report.state == EngineState::Idle {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
            report = status(&h.queues).await;
        }

        assert_eq!(report.state, EngineState::Idle);
        assert_eq!(report.mission_status, TaskStatus::Completed);
        h.engine.abort();
    }

    #[tokio::test]
    async fn test_repeated_runs_keep_earlier_results() {
        let h = harness(SimulatedRobot::new(Duration::from_millis(1))).await;

        start(&h.queues, 1).await;
        let first = wait_until_idle(&h.queues).await.run_id.unwrap();
        start(&h.queues, 1).await;
        let second = wait_until_idle(&h.queues).await.run_id.unwrap();

        assert_ne!(first, second);
        for run in [first, second] {
            assert!(h.results.join("1").join(run).join("000_take_image.json").exists());
        }
        h.engine.abort();
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let h = harness(SimulatedRobot::new(Duration::from_millis(5))).await;

        assert_eq!(
            start(&h.queues, 9).await,
            StartOutcome::NotFound {
                mission_id: MissionId(9)
            }
        );
        assert_eq!(status(&h.queues).await, StatusReport::idle());
        h.engine.abort();
    }

    #[tokio::test]
    async fn test_second_engine_cannot_consume() {
        let h = harness(SimulatedRobot::new(Duration::from_millis(5))).await;
        // Let the first engine take its consumers.
        status(&h.queues).await;

        let temp = TempDir::new().unwrap();
        let rival = StateMachine::new(
            Arc::new(MissionRegistry::new(temp.path())),
            Arc::new(SimulatedRobot::new(Duration::from_millis(5))),
            Arc::new(LocalStorage::open(temp.path()).await.unwrap()),
            Arc::new(LogTelemetry::new()),
            h.queues.clone(),
            Duration::from_millis(5),
        );

        assert!(matches!(
            rival.run().await,
            Err(MissionControlError::Execution(_))
        ));
        h.engine.abort();
    }
}
