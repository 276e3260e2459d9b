use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::Step;

/// Integer mission identifier embedded in every mission file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MissionId(pub i64);

impl MissionId {
    pub fn value(&self) -> i64 {
        self.0
    }
}

impl From<i64> for MissionId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl FromStr for MissionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

impl std::fmt::Display for MissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A predefined mission: an ordered list of steps for the robot.
///
/// Built only from a completely parsed document; there is no partially
/// populated form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Mission {
    #[serde(alias = "mission_id")]
    pub id: MissionId,

    #[serde(default)]
    pub name: String,

    #[serde(alias = "mission_steps")]
    pub steps: Vec<Step>,
}

impl Mission {
    pub fn new(id: impl Into<MissionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    pub fn inspection_count(&self) -> usize {
        self.steps.iter().filter(|s| s.is_inspection()).count()
    }
}
