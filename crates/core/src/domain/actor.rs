use serde::{Deserialize, Serialize};

use crate::domain::role::{Capability, UnknownRole};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

/// Organization-level role of the caller, resolved by the upstream
/// authentication layer. `Admin` is the break-glass actor that may decide
/// for any seat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Employee,
    Manager,
    Hr,
    Ceo,
    Admin,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub role: ActorRole,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Employee => "employee",
            ActorRole::Manager => "manager",
            ActorRole::Hr => "hr",
            ActorRole::Ceo => "ceo",
            ActorRole::Admin => "admin",
        }
    }

    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            ActorRole::Employee => &[],
            ActorRole::Manager => &[Capability::DirectReportSignoff],
            ActorRole::Hr => &[Capability::PeopleOpsSignoff],
            ActorRole::Ceo => &[Capability::DirectReportSignoff, Capability::ExecutiveSignoff],
            ActorRole::Admin => &[
                Capability::DirectReportSignoff,
                Capability::PeopleOpsSignoff,
                Capability::ExecutiveSignoff,
            ],
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, ActorRole::Admin)
    }
}

impl std::str::FromStr for ActorRole {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "employee" => Ok(ActorRole::Employee),
            "manager" => Ok(ActorRole::Manager),
            "hr" => Ok(ActorRole::Hr),
            "ceo" => Ok(ActorRole::Ceo),
            "admin" => Ok(ActorRole::Admin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

impl Actor {
    pub fn new(id: impl Into<String>, role: ActorRole) -> Self {
        Self { id: ActorId(id.into()), role }
    }
}

#[cfg(test)]
mod tests {
    use super::ActorRole;
    use crate::domain::role::Capability;

    #[test]
    fn admin_holds_every_capability() {
        for capability in [
            Capability::DirectReportSignoff,
            Capability::PeopleOpsSignoff,
            Capability::ExecutiveSignoff,
        ] {
            assert!(ActorRole::Admin.capabilities().contains(&capability));
        }
    }

    #[test]
    fn plain_employees_hold_none() {
        assert!(ActorRole::Employee.capabilities().is_empty());
    }
}
