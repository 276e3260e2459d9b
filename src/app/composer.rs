use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{AppConfig, RobotKind};
use crate::error::{MissionControlError, Result};
use crate::queues::Queues;
use crate::registry::MissionRegistry;
use crate::robot::{RobotInterface, SimulatedRobot};
use crate::scheduler::Scheduler;
use crate::state_machine::StateMachine;
use crate::storage::{LocalStorage, Storage};
use crate::telemetry::{LogTelemetry, Telemetry};

/// Every subsystem, built once and shared.
pub struct Services {
    pub config: AppConfig,
    pub registry: Arc<MissionRegistry>,
    pub robot: Arc<dyn RobotInterface>,
    pub storage: Arc<dyn Storage>,
    pub telemetry: Arc<dyn Telemetry>,
    pub queues: Arc<Queues>,
    pub scheduler: Arc<Scheduler>,
    pub state_machine: Arc<StateMachine>,
}

/// Build all subsystems from `config`. The first failure aborts composition.
pub async fn compose(config: &AppConfig) -> Result<Arc<Services>> {
    config.validate()?;

    let registry = Arc::new(MissionRegistry::new(&config.mission.folder));
    debug!(folder = %registry.folder().display(), "Registry ready");

    let robot: Arc<dyn RobotInterface> = match config.robot.kind {
        RobotKind::Simulated => Arc::new(SimulatedRobot::from_config(&config.robot)),
    };
    debug!(robot = robot.name(), "Robot ready");

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::open(&config.storage.results_dir)
            .await
            .map_err(|e| MissionControlError::composition("storage", e))?,
    );

    let telemetry: Arc<dyn Telemetry> = match &config.telemetry.event_log {
        Some(path) => Arc::new(
            LogTelemetry::with_event_log(path)
                .await
                .map_err(|e| MissionControlError::composition("telemetry", e))?,
        ),
        None => Arc::new(LogTelemetry::new()),
    };

    let queues = Arc::new(Queues::new(config.execution.queue_capacity));

    let scheduler = Arc::new(Scheduler::new(
        registry.clone(),
        queues.clone(),
        config.execution.request_timeout(),
    ));

    let state_machine = Arc::new(StateMachine::new(
        registry.clone(),
        robot.clone(),
        storage.clone(),
        telemetry.clone(),
        queues.clone(),
        config.execution.poll_interval(),
    ));

    info!(
        missions = %config.mission.folder.display(),
        results = %config.storage.results_dir.display(),
        "Services composed"
    );

    Ok(Arc::new(Services {
        config: config.clone(),
        registry,
        robot,
        storage,
        telemetry,
        queues,
        scheduler,
        state_machine,
    }))
}
