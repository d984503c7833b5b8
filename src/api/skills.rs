//! Skill discovery endpoints
//!
//! Public aggregations over the directory's skill lists. Both endpoints only
//! consider public, unbanned profiles and count offered and wanted skills
//! alike.
//!
//! Endpoints:
//!   GET /popular         -> top skill names by mention count
//!   GET /suggestions?q=  -> distinct skill names matching the query

use std::collections::HashMap;

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ApiState};
use crate::directory::UserProfile;

const POPULAR_LIMIT: usize = 20;
const SUGGESTION_LIMIT: usize = 10;
const SUGGESTION_MIN_QUERY: usize = 2;

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SkillCount {
    pub name: String,
    pub count: u32,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub q: String,
}

fn visible(profile: &UserProfile) -> bool {
    profile.is_public && !profile.is_banned
}

/// Mention counts per lowercased skill name, most mentioned first.
/// Ties break alphabetically so the ordering is stable.
fn popular_skills(profiles: &[UserProfile]) -> Vec<SkillCount> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for profile in profiles.iter().filter(|p| visible(p)) {
        for skill in profile.skills_offered.iter().chain(&profile.skills_wanted) {
            *counts.entry(skill.name.to_lowercase()).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<SkillCount> = counts
        .into_iter()
        .map(|(name, count)| SkillCount { name, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    ranked.truncate(POPULAR_LIMIT);
    ranked
}

/// Distinct skill names containing the query, case-insensitive. Queries
/// shorter than two characters yield nothing.
fn skill_suggestions(profiles: &[UserProfile], query: &str) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    if needle.chars().count() < SUGGESTION_MIN_QUERY {
        return Vec::new();
    }

    let mut names: Vec<String> = Vec::new();
    for profile in profiles.iter().filter(|p| visible(p)) {
        for skill in profile.skills_offered.iter().chain(&profile.skills_wanted) {
            if skill.name.to_lowercase().contains(&needle)
                && !names.iter().any(|n| n.eq_ignore_ascii_case(&skill.name))
            {
                names.push(skill.name.clone());
            }
        }
    }
    names.truncate(SUGGESTION_LIMIT);
    names
}

async fn popular(State(state): State<ApiState>) -> Result<Json<Vec<SkillCount>>, ApiError> {
    let profiles = state.users.list_all().await?;
    Ok(Json(popular_skills(&profiles)))
}

async fn suggestions(
    State(state): State<ApiState>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<Vec<String>>, ApiError> {
    let profiles = state.users.list_all().await?;
    Ok(Json(skill_suggestions(&profiles, &query.q)))
}

pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/popular", get(popular))
        .route("/suggestions", get(suggestions))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::Skill;
    use crate::swap::SkillLevel;

    fn profile(offered: &[&str], wanted: &[&str]) -> UserProfile {
        let mut profile = UserProfile::new("Ada");
        let skill = |name: &&str| Skill {
            name: name.to_string(),
            description: None,
            level: SkillLevel::Intermediate,
        };
        profile.skills_offered = offered.iter().map(skill).collect();
        profile.skills_wanted = wanted.iter().map(skill).collect();
        profile
    }

    #[test]
    fn popular_counts_offered_and_wanted_across_profiles() {
        let profiles = vec![
            profile(&["Guitar", "Baking"], &["Chess"]),
            profile(&["guitar"], &["Baking"]),
        ];
        let ranked = popular_skills(&profiles);
        assert_eq!(ranked[0].name, "baking");
        assert_eq!(ranked[0].count, 2);
        assert_eq!(ranked[1].name, "guitar");
        assert_eq!(ranked[1].count, 2);
        assert_eq!(ranked[2], SkillCount { name: "chess".to_string(), count: 1 });
    }

    #[test]
    fn popular_ignores_private_and_banned_profiles() {
        let mut private = profile(&["Chess"], &[]);
        private.is_public = false;
        let mut banned = profile(&["Chess"], &[]);
        banned.is_banned = true;
        assert!(popular_skills(&[private, banned]).is_empty());
    }

    #[test]
    fn suggestions_match_substring_case_insensitively_without_duplicates() {
        let profiles = vec![
            profile(&["Woodworking"], &["woodworking"]),
            profile(&["Metalwork"], &[]),
        ];
        let names = skill_suggestions(&profiles, "WORK");
        assert_eq!(names, vec!["Woodworking".to_string(), "Metalwork".to_string()]);
    }

    #[test]
    fn suggestions_require_two_query_characters() {
        let profiles = vec![profile(&["Guitar"], &[])];
        assert!(skill_suggestions(&profiles, "g").is_empty());
        assert!(skill_suggestions(&profiles, "  ").is_empty());
        assert_eq!(skill_suggestions(&profiles, "gu").len(), 1);
    }
}
