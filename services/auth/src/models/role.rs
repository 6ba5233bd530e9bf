//! Role model and related functionality

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role held by a user of the onboarding system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Commercial agent submitting new-customer requests
    Comercial,
    /// Sales director, first approval gate
    Director,
    /// Order management, second approval gate
    Pedidos,
    /// Administration, last approval gate and user management
    Admin,
}

impl Role {
    /// Every role, in approval-chain order after the submitting agent
    pub const ALL: [Role; 4] = [Role::Comercial, Role::Director, Role::Pedidos, Role::Admin];

    /// Wire and storage name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Comercial => "comercial",
            Role::Director => "director",
            Role::Pedidos => "pedidos",
            Role::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string does not name a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
