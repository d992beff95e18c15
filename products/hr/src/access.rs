use entity::users::Role;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Employer capabilities an employer can delegate to individual employees.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Announcements,
    Leave,
    Recruitment,
    Teams,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Announcements => "announcements",
            Permission::Leave => "leave",
            Permission::Recruitment => "recruitment",
            Permission::Teams => "teams",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "announcements" => Some(Permission::Announcements),
            "leave" => Some(Permission::Leave),
            "recruitment" => Some(Permission::Recruitment),
            "teams" => Some(Permission::Teams),
            _ => None,
        }
    }
}

/// Reads the stored JSON list, skipping names this build does not know.
pub fn permissions_from_json(value: &Value) -> Vec<Permission> {
    let mut permissions: Vec<Permission> = value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .filter_map(Permission::parse)
                .collect()
        })
        .unwrap_or_default();
    permissions.sort();
    permissions.dedup();
    permissions
}

pub fn permissions_to_json(permissions: &[Permission]) -> Value {
    let mut sorted = permissions.to_vec();
    sorted.sort();
    sorted.dedup();
    Value::Array(
        sorted
            .into_iter()
            .map(|p| Value::String(p.as_str().to_string()))
            .collect(),
    )
}

/// What the signed-in user may do inside their company.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grants {
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl Grants {
    pub fn employer() -> Self {
        Self {
            role: Role::Employer,
            permissions: Vec::new(),
        }
    }

    pub fn employee(permissions: Vec<Permission>) -> Self {
        Self {
            role: Role::Employee,
            permissions,
        }
    }

    pub fn is_employer(&self) -> bool {
        self.role == Role::Employer
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.is_employer() || self.permissions.contains(&permission)
    }
}
