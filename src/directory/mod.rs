//! User directory collaborator
//!
//! Owns user identity, skill lists, the visibility and ban flags, and the
//! derived reputation summary. The swap core only reads profiles (participant
//! validation) and writes the `rating` sub-field; everything else here is
//! plain profile plumbing exposed to the HTTP layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::StoreError;
use crate::swap::models::{SkillLevel, UserId};

/// A skill a user offers or wants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub level: SkillLevel,
}

/// Coarse availability windows, matching the reference profile schema.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Availability {
    #[serde(default)]
    pub weekdays: bool,
    #[serde(default)]
    pub weekends: bool,
    #[serde(default)]
    pub evenings: bool,
    #[serde(default)]
    pub mornings: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

/// Derived reputation: mean of ratings received across completed, rated
/// swaps, plus the count of contributing values. Written only by the rating
/// aggregation engine.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatingSummary {
    pub average: f64,
    pub count: u32,
}

impl Default for RatingSummary {
    fn default() -> Self {
        Self {
            average: 0.0,
            count: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub skills_offered: Vec<Skill>,
    #[serde(default)]
    pub skills_wanted: Vec<Skill>,
    #[serde(default)]
    pub availability: Availability,
    pub is_public: bool,
    pub role: UserRole,
    #[serde(default)]
    pub rating: RatingSummary,
    pub is_banned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Minimal public profile; the common case for new signups.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            location: None,
            profile_photo: None,
            skills_offered: Vec::new(),
            skills_wanted: Vec::new(),
            availability: Availability::default(),
            is_public: true,
            role: UserRole::User,
            rating: RatingSummary::default(),
            is_banned: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial profile update. `None` means "leave the field unchanged"; an
/// explicit value (including an empty string) is applied. This mirrors the
/// reference behavior where an absent field skips the update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_photo: Option<String>,
    #[serde(default)]
    pub skills_offered: Option<Vec<Skill>>,
    #[serde(default)]
    pub skills_wanted: Option<Vec<Skill>>,
    #[serde(default)]
    pub availability: Option<Availability>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

impl ProfileUpdate {
    /// Apply the present fields onto an existing profile.
    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name = name.clone();
        }
        if let Some(location) = &self.location {
            profile.location = Some(location.clone());
        }
        if let Some(photo) = &self.profile_photo {
            profile.profile_photo = Some(photo.clone());
        }
        if let Some(offered) = &self.skills_offered {
            profile.skills_offered = offered.clone();
        }
        if let Some(wanted) = &self.skills_wanted {
            profile.skills_wanted = wanted.clone();
        }
        if let Some(availability) = self.availability {
            profile.availability = availability;
        }
        if let Some(is_public) = self.is_public {
            profile.is_public = is_public;
        }
        profile.updated_at = Utc::now();
    }
}

/// Search filter for the public user listing. Only public, unbanned profiles
/// are returned; both filters are case-insensitive substring matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Maximum rows returned by a directory search.
pub const SEARCH_LIMIT: usize = 20;

/// Lookup and maintenance contract for user records. `find_by_id` returning
/// `Ok(None)` means the user does not exist, distinct from a transient
/// failure (`Err`).
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, id: UserId) -> Result<Option<UserProfile>, StoreError>;

    async fn insert(&self, profile: UserProfile) -> Result<(), StoreError>;

    /// Public search by skill name and/or location.
    async fn search(&self, filter: &SearchFilter) -> Result<Vec<UserProfile>, StoreError>;

    /// Apply a partial profile update. `None` when the user is unknown.
    async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, StoreError>;

    /// Overwrite the derived reputation summary. Engine-only write.
    async fn update_rating(&self, id: UserId, summary: RatingSummary) -> Result<(), StoreError>;

    /// Set or clear the ban flag. `false` when the user is unknown.
    async fn set_banned(&self, id: UserId, banned: bool) -> Result<bool, StoreError>;

    /// Every profile. Admin listing.
    async fn list_all(&self) -> Result<Vec<UserProfile>, StoreError>;
}

/// True when the profile matches the search filter.
pub(crate) fn matches_filter(profile: &UserProfile, filter: &SearchFilter) -> bool {
    if !profile.is_public || profile.is_banned {
        return false;
    }
    if let Some(skill) = &filter.skill {
        let needle = skill.to_lowercase();
        let hit = profile
            .skills_offered
            .iter()
            .chain(profile.skills_wanted.iter())
            .any(|s| s.name.to_lowercase().contains(&needle));
        if !hit {
            return false;
        }
    }
    if let Some(location) = &filter.location {
        let needle = location.to_lowercase();
        match &profile.location {
            Some(loc) if loc.to_lowercase().contains(&needle) => {}
            _ => return false,
        }
    }
    true
}
