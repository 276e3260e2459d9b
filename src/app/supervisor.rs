use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tracing::{error, info, warn};

use super::composer::Services;
use crate::config::ExecutionConfig;
use crate::error::Result;

/// Why the execution context stopped for good.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionExit {
    /// The engine returned normally.
    Finished,
    /// The engine kept failing and ran out of restarts.
    Exhausted { restarts: u32 },
}

/// Handle of the supervised background execution context.
pub struct ExecutionHandle {
    services: Arc<Services>,
    task: JoinHandle<()>,
    exit: watch::Receiver<Option<ExecutionExit>>,
}

impl ExecutionHandle {
    /// Run the composed state machine under supervision.
    pub fn spawn(services: Arc<Services>) -> Self {
        let machine = services.state_machine.clone();
        let (task, exit) = supervise(services.config.execution.clone(), move || {
            let machine = machine.clone();
            async move { machine.run().await }
        });

        Self {
            services,
            task,
            exit,
        }
    }

    /// The services instance the execution context was handed.
    pub fn services(&self) -> &Arc<Services> {
        &self.services
    }

    pub fn exit(&self) -> Option<ExecutionExit> {
        *self.exit.borrow()
    }

    /// Resolves once the execution context has stopped for good.
    pub async fn stopped(&self) -> ExecutionExit {
        wait_for_exit(self.subscribe()).await
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<ExecutionExit>> {
        self.exit.clone()
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for ExecutionHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Run `run` until it returns `Ok`, restarting failed or panicked runs with
/// exponential backoff up to `policy.max_restarts` times.
pub fn supervise<F, Fut>(
    policy: ExecutionConfig,
    mut run: F,
) -> (JoinHandle<()>, watch::Receiver<Option<ExecutionExit>>)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let (exit_tx, exit_rx) = watch::channel(None);

    let task = tokio::spawn(async move {
        // Aborts the current run when the supervisor itself is aborted.
        let mut runs = JoinSet::new();
        let mut restarts: u32 = 0;
        loop {
            runs.spawn(run());
            let reason = match runs.join_next().await {
                Some(Ok(Ok(()))) | None => {
                    info!("Execution context finished");
                    let _ = exit_tx.send(Some(ExecutionExit::Finished));
                    return;
                }
                Some(Ok(Err(e))) => e.to_string(),
                Some(Err(e)) if e.is_panic() => "execution context panicked".to_string(),
                Some(Err(e)) => e.to_string(),
            };

            if restarts >= policy.max_restarts {
                error!(restarts, reason = %reason, "Execution context failed, no restarts left");
                let _ = exit_tx.send(Some(ExecutionExit::Exhausted { restarts }));
                return;
            }

            let delay = policy.restart_backoff(restarts);
            restarts += 1;
            warn!(
                restart = restarts,
                max_restarts = policy.max_restarts,
                delay_ms = delay.as_millis() as u64,
                reason = %reason,
                "Restarting execution context"
            );
            tokio::time::sleep(delay).await;
        }
    });

    (task, exit_rx)
}

/// A dropped supervisor counts as finished.
pub(crate) async fn wait_for_exit(mut exit: watch::Receiver<Option<ExecutionExit>>) -> ExecutionExit {
    match exit.wait_for(Option::is_some).await {
        Ok(value) => (*value).unwrap_or(ExecutionExit::Finished),
        Err(_) => ExecutionExit::Finished,
    }
}
