use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::tenant::TenantId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmployeeId(pub String);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeLifecycle {
    Active,
    Offboarding,
    Offboarded,
}

impl EmployeeLifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeLifecycle::Active => "active",
            EmployeeLifecycle::Offboarding => "offboarding",
            EmployeeLifecycle::Offboarded => "offboarded",
        }
    }
}

/// Only the slice of the employee record the approval flows touch: the
/// subject reference, the manager link used for role resolution, and the
/// contact fields that get masked when an offboarding request finalizes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub tenant_id: TenantId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub manager_id: Option<EmployeeId>,
    pub lifecycle: EmployeeLifecycle,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
