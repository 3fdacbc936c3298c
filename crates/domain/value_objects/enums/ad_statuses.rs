use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Moderation states of an ad. Only `PendingValidation` and `Published` count
/// against a seller's monthly listing quota.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdStatus {
    Draft,
    PendingValidation,
    Published,
    Rejected,
    Archived,
}

impl AdStatus {
    pub const QUOTA_COUNTED: [AdStatus; 2] = [AdStatus::PendingValidation, AdStatus::Published];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdStatus::Draft => "draft",
            AdStatus::PendingValidation => "pending_validation",
            AdStatus::Published => "published",
            AdStatus::Rejected => "rejected",
            AdStatus::Archived => "archived",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "draft" => Some(AdStatus::Draft),
            "pending_validation" => Some(AdStatus::PendingValidation),
            "published" => Some(AdStatus::Published),
            "rejected" => Some(AdStatus::Rejected),
            "archived" => Some(AdStatus::Archived),
            _ => None,
        }
    }

    pub fn counts_against_quota(&self) -> bool {
        Self::QUOTA_COUNTED.contains(self)
    }
}

impl Display for AdStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
