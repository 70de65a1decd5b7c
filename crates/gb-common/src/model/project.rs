use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use super::UserId;

pub type ProjectId = i64;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectStatus {
    Active,
    InProgress,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    /// Whether the project still accepts proposals.
    pub fn is_open(self) -> bool {
        self == ProjectStatus::Active
    }
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProjectTier {
    #[default]
    Standard,
    Vip,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deliverable {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub owner_id: UserId,
    pub freelancer_id: Option<UserId>,
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub skills: Vec<String>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub currency: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub location: Option<String>,
    pub attachments: Vec<String>,
    pub objectives: Option<String>,
    pub technical_requirements: Option<String>,
    pub deliverables: Vec<Deliverable>,
    pub tier: ProjectTier,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.owner_id == user
    }
}

/// Insert payload for `market.projects`; the store assigns id and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewProject {
    pub owner_id: UserId,
    pub title: String,
    pub short_description: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub skills: Vec<String>,
    pub budget_min: Option<i64>,
    pub budget_max: Option<i64>,
    pub currency: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub location: Option<String>,
    pub attachments: Vec<String>,
    pub objectives: Option<String>,
    pub technical_requirements: Option<String>,
    pub deliverables: Vec<Deliverable>,
    pub tier: ProjectTier,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectSort {
    #[default]
    Newest,
    Oldest,
    BudgetHigh,
    BudgetLow,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    pub category: Option<String>,
    pub tier: Option<ProjectTier>,
    pub owner_id: Option<UserId>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    #[serde(default)]
    pub sort: ProjectSort,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_through_snake_case() {
        assert_eq!(ProjectStatus::InProgress.as_ref(), "in_progress");
        assert_eq!(
            ProjectStatus::from_str("in_progress").unwrap(),
            ProjectStatus::InProgress
        );
        assert!(ProjectStatus::from_str("archived").is_err());
    }

    #[test]
    fn only_active_projects_are_open() {
        assert!(ProjectStatus::Active.is_open());
        assert!(!ProjectStatus::InProgress.is_open());
        assert!(!ProjectStatus::Completed.is_open());
        assert!(!ProjectStatus::Cancelled.is_open());
    }

    #[test]
    fn deliverable_description_and_deadline_are_optional() {
        let parsed: Deliverable = serde_json::from_str(r#"{"title":"Wireframes"}"#).unwrap();
        assert_eq!(parsed.title, "Wireframes");
        assert!(parsed.description.is_none());
        assert!(parsed.deadline.is_none());
    }
}
