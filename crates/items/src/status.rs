use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a found item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FoundItemStatus {
    /// Open for claims.
    #[default]
    Available,
    /// A claim was approved; waiting for hand-over.
    Claimed,
    /// Handed back to the claimant.
    Returned,
}

/// Lifecycle of a lost item report.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LostItemStatus {
    #[default]
    Active,
    Found,
    Closed,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown status '{0}'")]
pub struct UnknownStatus(pub String);

impl FoundItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoundItemStatus::Available => "available",
            FoundItemStatus::Claimed => "claimed",
            FoundItemStatus::Returned => "returned",
        }
    }
}

impl LostItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LostItemStatus::Active => "active",
            LostItemStatus::Found => "found",
            LostItemStatus::Closed => "closed",
        }
    }

    /// Allowed report transitions: active → found | closed, found → closed.
    pub fn can_transition_to(&self, next: LostItemStatus) -> bool {
        matches!(
            (self, next),
            (LostItemStatus::Active, LostItemStatus::Found)
                | (LostItemStatus::Active, LostItemStatus::Closed)
                | (LostItemStatus::Found, LostItemStatus::Closed)
        )
    }
}

impl FromStr for FoundItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(FoundItemStatus::Available),
            "claimed" => Ok(FoundItemStatus::Claimed),
            "returned" => Ok(FoundItemStatus::Returned),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for LostItemStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(LostItemStatus::Active),
            "found" => Ok(LostItemStatus::Found),
            "closed" => Ok(LostItemStatus::Closed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl core::fmt::Display for FoundItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::fmt::Display for LostItemStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
