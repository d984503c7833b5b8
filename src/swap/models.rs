//! Swap data model
//!
//! A swap is an exchange agreement between two users: the requester asks the
//! recipient for one skill and offers another in return. The record is created
//! in `Pending` state and moves forward only along the edges enforced by the
//! lifecycle engine; participants and the skill pair are immutable after
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::swap::error::SwapError;

/// Identifier of a swap record.
pub type SwapId = Uuid;

/// Identifier of a user directory entry.
pub type UserId = Uuid;

/// Lifecycle state of a swap.
///
/// `Pending` is the only non-terminal state besides `Accepted`; the
/// remaining three accept no further transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwapStatus {
    Pending,
    Accepted,
    Rejected,
    Cancelled,
    Completed,
}

impl SwapStatus {
    /// States with no outgoing transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SwapStatus::Rejected | SwapStatus::Cancelled | SwapStatus::Completed
        )
    }

    /// Stable textual form, used for persistence and wire payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapStatus::Pending => "pending",
            SwapStatus::Accepted => "accepted",
            SwapStatus::Rejected => "rejected",
            SwapStatus::Cancelled => "cancelled",
            SwapStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SwapStatus::Pending),
            "accepted" => Some(SwapStatus::Accepted),
            "rejected" => Some(SwapStatus::Rejected),
            "cancelled" => Some(SwapStatus::Cancelled),
            "completed" => Some(SwapStatus::Completed),
            _ => None,
        }
    }
}

impl std::fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form descriptor of a skill involved in a swap.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<SkillLevel>,
}

impl SkillDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            level: None,
        }
    }

    fn validate(&self, field: &str) -> Result<(), SwapError> {
        if self.name.trim().is_empty() {
            return Err(SwapError::Validation(format!("{} name is required", field)));
        }
        Ok(())
    }
}

/// Self-reported proficiency attached to a skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

impl Default for SkillLevel {
    fn default() -> Self {
        SkillLevel::Intermediate
    }
}

/// Which rating slot of a swap a party writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingSlot {
    /// Authored by the requester.
    Requester,
    /// Authored by the recipient.
    Recipient,
}

/// One party's rating of a completed swap. Write-once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRating {
    /// Score in `1..=5`.
    pub value: u8,
    pub comment: String,
    pub rated_at: DateTime<Utc>,
}

/// Input for swap creation. Participants and the skill pair become immutable
/// once the record exists.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSwap {
    pub requester: UserId,
    pub recipient: UserId,
    pub requested_skill: SkillDescriptor,
    pub offered_skill: SkillDescriptor,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub scheduled_date: Option<DateTime<Utc>>,
}

impl NewSwap {
    pub fn validate(&self) -> Result<(), SwapError> {
        self.requested_skill.validate("requested skill")?;
        self.offered_skill.validate("offered skill")?;
        Ok(())
    }
}

/// The central swap entity. Owned by the swap record store; the engines
/// operate on snapshots and never cache them across calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swap {
    pub id: SwapId,
    pub requester: UserId,
    pub recipient: UserId,
    pub requested_skill: SkillDescriptor,
    pub offered_skill: SkillDescriptor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_date: Option<DateTime<Utc>>,
    pub status: SwapStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requester_rating: Option<SwapRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient_rating: Option<SwapRating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Swap {
    /// Build a fresh `Pending` record from validated creation input.
    pub fn from_request(request: NewSwap) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            requester: request.requester,
            recipient: request.recipient,
            requested_skill: request.requested_skill,
            offered_skill: request.offered_skill,
            message: request.message,
            scheduled_date: request.scheduled_date,
            status: SwapStatus::Pending,
            completed_date: None,
            requester_rating: None,
            recipient_rating: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.requester == user || self.recipient == user
    }

    /// The rating slot this user is allowed to author, if any.
    pub fn slot_for(&self, user: UserId) -> Option<RatingSlot> {
        if self.requester == user {
            Some(RatingSlot::Requester)
        } else if self.recipient == user {
            Some(RatingSlot::Recipient)
        } else {
            None
        }
    }

    pub fn rating_in(&self, slot: RatingSlot) -> Option<&SwapRating> {
        match slot {
            RatingSlot::Requester => self.requester_rating.as_ref(),
            RatingSlot::Recipient => self.recipient_rating.as_ref(),
        }
    }

    /// True once both parties have rated; this is the aggregation trigger.
    pub fn fully_rated(&self) -> bool {
        self.requester_rating.is_some() && self.recipient_rating.is_some()
    }
}
