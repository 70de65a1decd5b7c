use serde::{Deserialize, Serialize};

use crate::model::{ApplicationStatus, EmploymentType};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PostJobRequest {
    pub title: String,
    pub company: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub employment_type: EmploymentType,
    #[serde(default)]
    pub salary_min: Option<i64>,
    #[serde(default)]
    pub salary_max: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApplyRequest {
    pub cover_letter: String,
    #[serde(default)]
    pub resume_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReviewApplicationRequest {
    pub status: ApplicationStatus,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct ListJobsParams {
    #[serde(default)]
    pub open_only: bool,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
