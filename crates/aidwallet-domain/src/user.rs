//! Provisioning status types for a wallet user.
//!
//! Both statuses only move forward. Stores persist them as their lowercase
//! wire names (`"none"`, `"deployed"`, `"created"`, `"funded"`).

use serde::{Deserialize, Serialize};

/// Error returned when a stored status string is not a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown status: {0}")]
pub struct UnknownStatus(pub String);

/// Whether the user's wallet contract has been deployed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployStatus {
    None,
    Deployed,
}

impl DeployStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Deployed => "deployed",
        }
    }

    /// Move to `next` unless that would go backwards.
    pub fn advance(self, next: Self) -> Self {
        self.max(next)
    }
}

impl std::str::FromStr for DeployStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "deployed" => Ok(Self::Deployed),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}

/// On-chain account lifecycle: key issued (`Created`), then funded for fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    None,
    Created,
    Funded,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Created => "created",
            Self::Funded => "funded",
        }
    }

    /// Move to `next` unless that would go backwards.
    pub fn advance(self, next: Self) -> Self {
        self.max(next)
    }

    /// Statuses a record may hold for an advance to `self` to take effect.
    pub fn predecessors(self) -> &'static [AccountStatus] {
        match self {
            Self::None => &[],
            Self::Created => &[Self::None],
            Self::Funded => &[Self::None, Self::Created],
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "created" => Ok(Self::Created),
            "funded" => Ok(Self::Funded),
            other => Err(UnknownStatus(other.to_owned())),
        }
    }
}
