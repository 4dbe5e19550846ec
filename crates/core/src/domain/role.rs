use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed set of decision-maker categories. A role names a seat at the
/// approval table, not a specific person; the person is resolved when the
/// request is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApproverRole {
    Manager,
    Hr,
    Ceo,
}

/// What an actor must hold to decide for a given role seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    DirectReportSignoff,
    PeopleOpsSignoff,
    ExecutiveSignoff,
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown approver role `{0}`")]
pub struct UnknownRole(pub String);

impl ApproverRole {
    pub const ALL: [ApproverRole; 3] = [ApproverRole::Manager, ApproverRole::Hr, ApproverRole::Ceo];

    pub fn as_str(&self) -> &'static str {
        match self {
            ApproverRole::Manager => "manager",
            ApproverRole::Hr => "hr",
            ApproverRole::Ceo => "ceo",
        }
    }

    /// Table-driven role -> capability lookup. Authorization code consults
    /// this instead of branching per role at every call site.
    pub fn required_capability(&self) -> Capability {
        match self {
            ApproverRole::Manager => Capability::DirectReportSignoff,
            ApproverRole::Hr => Capability::PeopleOpsSignoff,
            ApproverRole::Ceo => Capability::ExecutiveSignoff,
        }
    }
}

impl std::str::FromStr for ApproverRole {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "manager" => Ok(ApproverRole::Manager),
            "hr" => Ok(ApproverRole::Hr),
            "ceo" => Ok(ApproverRole::Ceo),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl std::fmt::Display for ApproverRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
