//! Request-side mission scheduling.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::error::{MissionControlError, Result};
use crate::queues::{Queues, StartMission, StartOutcome, StatusReport, StopOutcome};
use crate::registry::MissionRegistry;

/// Resolves missions through the registry and hands them to the execution
/// engine over the shared queues.
pub struct Scheduler {
    registry: Arc<MissionRegistry>,
    queues: Arc<Queues>,
    timeout: Duration,
}

impl Scheduler {
    pub fn new(registry: Arc<MissionRegistry>, queues: Arc<Queues>, timeout: Duration) -> Self {
        Self {
            registry,
            queues,
            timeout,
        }
    }

    pub fn queues(&self) -> &Arc<Queues> {
        &self.queues
    }

    pub fn registry(&self) -> &Arc<MissionRegistry> {
        &self.registry
    }

    pub async fn start_mission(&self, key: &str) -> Result<StartOutcome> {
        let mission = self
            .registry
            .get_mission_by_key(key)
            .await
            .ok_or_else(|| MissionControlError::MissionNotFound(key.to_string()))?;
        let mission_id = mission.id;

        let outcome = self
            .queues
            .start_mission
            .request(StartMission { mission_id }, self.timeout)
            .await?;
        info!(%mission_id, ?outcome, "Start request answered");
        Ok(outcome)
    }

    pub async fn stop_mission(&self) -> Result<StopOutcome> {
        let outcome = self.queues.stop_mission.request((), self.timeout).await?;
        info!(?outcome, "Stop request answered");
        Ok(outcome)
    }

    pub async fn mission_status(&self) -> Result<StatusReport> {
        self.queues.mission_status.request((), self.timeout).await
    }
}
