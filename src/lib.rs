pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod mission;
pub mod queues;
pub mod reader;
pub mod registry;
pub mod robot;
pub mod scheduler;
pub mod state_machine;
pub mod storage;
pub mod telemetry;

pub use app::{App, AppOptions, Services, compose, create_app};
pub use config::AppConfig;
pub use error::{MissionControlError, RegistryFault, Result};
pub use mission::{Frame, Mission, MissionId, Step, TaskStatus};
pub use reader::{Coercion, FrameCoercion, JsonReader, ParseError};
pub use registry::{MissionRegistry, MissionSummary, RegistryEntry, Snapshot};
pub use robot::{RobotInterface, SimulatedRobot};
pub use scheduler::Scheduler;
pub use state_machine::StateMachine;
