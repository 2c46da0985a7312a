//! Closed sets of account roles and lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    TournamentOwner,
    Player,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::TournamentOwner => "tournament_owner",
            Role::Player => "player",
        }
    }

    /// Owners and admins land on the dashboard; everyone else on the tournament list.
    pub fn landing_path(&self) -> &'static str {
        match self {
            Role::Admin | Role::TournamentOwner => "/dashboard",
            Role::Player => "/tournaments",
        }
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
        match s {
            "admin" => Ok(Role::Admin),
            "tournament_owner" => Ok(Role::TournamentOwner),
            "player" => Ok(Role::Player),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Pending,
    Verified,
    Invited,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Pending => "pending",
            AccountStatus::Verified => "verified",
            AccountStatus::Invited => "invited",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AccountStatus::Pending),
            "verified" => Ok(AccountStatus::Verified),
            "invited" => Ok(AccountStatus::Invited),
            _ => Err(format!("Unknown account status: {}", s)),
        }
    }
}
