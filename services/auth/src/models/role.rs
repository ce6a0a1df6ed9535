//! Role model and related functionality

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Role of a user, fixed at registration.
///
/// The role picks the authorization path the access guard follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The monitored person (patient)
    Senior,
    /// Family member or carer who needs an approved relationship
    Caregiver,
    /// Clinical provider
    Provider,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Senior => "senior",
            Role::Caregiver => "caregiver",
            Role::Provider => "provider",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "senior" => Ok(Role::Senior),
            "caregiver" => Ok(Role::Caregiver),
            "provider" => Ok(Role::Provider),
            _ => Err(AuthError::InvalidRole(s.to_string())),
        }
    }
}

/// What the caller intends to do with a patient-scoped resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Capability {
    Read,
    Write,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Read => f.write_str("read"),
            Capability::Write => f.write_str("write"),
        }
    }
}
