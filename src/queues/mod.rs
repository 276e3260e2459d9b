//! Request queues between the API and the execution engine.
//!
//! The only channel between the two execution contexts:
//! - `RequestQueue`: Bounded request queue with a oneshot reply per request
//! - `Queues`: The set of queues the composer creates once and shares
//! - `StartMission`, `StartOutcome`, `StopOutcome`, `StatusReport`: Messages

mod messages;

use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, MutexGuard, mpsc, oneshot};
use tracing::debug;

use crate::error::{MissionControlError, Result};

pub use messages::{EngineState, StartMission, StartOutcome, StatusReport, StopOutcome};

/// A request waiting for the execution engine's answer.
pub struct Pending<Req, Resp> {
    pub request: Req,
    reply: oneshot::Sender<Resp>,
}

impl<Req, Resp> Pending<Req, Resp> {
    /// Send the answer back. Returns `false` when the requester gave up waiting.
    pub fn respond(self, response: Resp) -> bool {
        self.reply.send(response).is_ok()
    }
}

pub struct RequestQueue<Req, Resp> {
    name: &'static str,
    sender: mpsc::Sender<Pending<Req, Resp>>,
    receiver: Mutex<mpsc::Receiver<Pending<Req, Resp>>>,
}

impl<Req, Resp> RequestQueue<Req, Resp> {
    pub fn new(name: &'static str, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            name,
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Enqueue a request and wait for the engine's reply.
    pub async fn request(&self, request: Req, timeout: Duration) -> Result<Resp> {
        let (reply, answer) = oneshot::channel();
        self.sender
            .try_send(Pending { request, reply })
            .map_err(|e| match e {
                TrySendError::Full(_) => MissionControlError::QueueFull { queue: self.name },
                TrySendError::Closed(_) => {
                    MissionControlError::QueueDisconnected { queue: self.name }
                }
            })?;

        match tokio::time::timeout(timeout, answer).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(MissionControlError::QueueDisconnected { queue: self.name }),
            Err(_) => {
                debug!(queue = self.name, "No reply before timeout");
                Err(MissionControlError::Timeout(format!(
                    "no reply on {} within {}ms",
                    self.name,
                    timeout.as_millis()
                )))
            }
        }
    }

    /// Take the consuming end. Only one consumer can hold it at a time.
    pub fn consumer(&self) -> Result<Consumer<'_, Req, Resp>> {
        self.receiver
            .try_lock()
            .map(|receiver| Consumer { receiver })
            .map_err(|_| {
                MissionControlError::Execution(format!("queue {} already has a consumer", self.name))
            })
    }
}

pub struct Consumer<'a, Req, Resp> {
    receiver: MutexGuard<'a, mpsc::Receiver<Pending<Req, Resp>>>,
}

impl<Req, Resp> Consumer<'_, Req, Resp> {
    pub async fn next(&mut self) -> Option<Pending<Req, Resp>> {
        self.receiver.recv().await
    }

    pub fn try_next(&mut self) -> Option<Pending<Req, Resp>> {
        self.receiver.try_recv().ok()
    }
}

/// Queues shared by the request-serving context and the execution context.
pub struct Queues {
    pub start_mission: RequestQueue<StartMission, StartOutcome>,
    pub stop_mission: RequestQueue<(), StopOutcome>,
    pub mission_status: RequestQueue<(), StatusReport>,
}

impl Queues {
    pub fn new(capacity: usize) -> Self {
        Self {
            start_mission: RequestQueue::new("start_mission", capacity),
            stop_mission: RequestQueue::new("stop_mission", capacity),
            mission_status: RequestQueue::new("mission_status", capacity),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_request_gets_reply() {
        let queue = Arc::new(RequestQueue::<u32, u32>::new("double", 4));

        let engine = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let mut consumer = queue.consumer().unwrap();
                let pending = consumer.next().await.unwrap();
                let value = pending.request;
                pending.respond(value * 2);
            })
        };

        let answer = queue.request(21, Duration::from_secs(1)).await.unwrap();
        assert_eq!(answer, 42);
        engine.await.unwrap();
    }

    #[tokio::test]
    async fn test_request_times_out_without_consumer() {
        let queue = RequestQueue::<(), ()>::new("idle", 4);
        let err = queue.request((), Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, MissionControlError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_full_queue_rejects() {
        let queue = RequestQueue::<u8, ()>::new("tiny", 1);
        let _ = queue.request(1, Duration::from_millis(5)).await;

        let err = queue.request(2, Duration::from_millis(5)).await.unwrap_err();
        assert!(matches!(err, MissionControlError::QueueFull { queue: "tiny" }));
    }

    #[tokio::test]
    async fn test_dropped_reply_is_disconnect() {
        let queue = Arc::new(RequestQueue::<(), ()>::new("drop", 4));
        let engine = {
            let queue = queue.clone();
            tokio::spawn(async move {
                let mut consumer = queue.consumer().unwrap();
                drop(consumer.next().await);
            })
        };

        let err = queue.request((), Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, MissionControlError::QueueDisconnected { .. }));
        engine.await.unwrap();
    }

    #[test]
    fn test_single_consumer() {
        let queue = RequestQueue::<(), ()>::new("solo", 1);
        let first = queue.consumer().unwrap();
        assert!(queue.consumer().is_err());
        drop(first);
        assert!(queue.consumer().is_ok());
    }
}
