//! Mission type definitions.
//!
//! Pure data describing predefined missions:
//! - `Mission`, `MissionId`: A mission and its integer identifier
//! - `Step`: Polymorphic action unit (movement or inspection)
//! - `Frame`, `Position`, `Orientation`, `Pose`: Geometry carried by steps
//! - `TaskStatus`: Progress reported by the execution engine

mod geometry;
mod status;
mod step;
mod types;

pub use geometry::{Frame, Orientation, Pose, Position};
pub use status::TaskStatus;
pub use step::Step;
pub use types::{Mission, MissionId};
