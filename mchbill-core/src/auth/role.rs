//! Account roles

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role attached to every account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    BillingClerk,
    Viewer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::BillingClerk => "billing_clerk",
            Role::Viewer => "viewer",
        }
    }

    /// Whether this role may change the catalog
    pub fn can_edit(&self) -> bool {
        matches!(self, Role::Admin | Role::BillingClerk)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "billing_clerk" | "billing-clerk" => Ok(Role::BillingClerk),
            "viewer" => Ok(Role::Viewer),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}
