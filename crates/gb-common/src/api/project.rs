use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{Deliverable, ProjectSort, ProjectStatus, ProjectTier};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostProjectRequest {
    pub title: String,
    #[serde(default)]
    pub short_description: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub budget_min: Option<i64>,
    #[serde(default)]
    pub budget_max: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub objectives: Option<String>,
    #[serde(default)]
    pub technical_requirements: Option<String>,
    #[serde(default)]
    pub deliverables: Vec<Deliverable>,
    #[serde(default)]
    pub tier: ProjectTier,
}

/// Query string accepted by `GET /api/projects`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ListProjectsParams {
    pub status: Option<ProjectStatus>,
    pub category: Option<String>,
    pub tier: Option<ProjectTier>,
    pub owner_id: Option<uuid::Uuid>,
    pub q: Option<String>,
    #[serde(default)]
    pub sort: ProjectSort,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Project as returned by `GET /api/projects/:id`, with the caller's saved flag.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: crate::model::Project,
    pub saved: bool,
}
