use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use super::{ProjectId, ProjectStatus, ProposalId, UserId};

pub type ContractId = Uuid;

pub const MAX_PROGRESS: i32 = 100;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Completed,
    Cancelled,
}

impl ContractStatus {
    /// Project status that a contract closed with this status cascades to.
    pub fn project_status(self) -> ProjectStatus {
        match self {
            ContractStatus::Active => ProjectStatus::InProgress,
            ContractStatus::Completed => ProjectStatus::Completed,
            ContractStatus::Cancelled => ProjectStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
}

impl Milestone {
    pub fn pending(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            completed: false,
            due_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub project_id: ProjectId,
    pub proposal_id: ProposalId,
    pub client_id: UserId,
    pub freelancer_id: UserId,
    pub budget_amount: i64,
    pub currency: String,
    pub status: ContractStatus,
    pub progress: i32,
    pub start_date: NaiveDate,
    pub deadline: Option<NaiveDate>,
    pub milestones: Vec<Milestone>,
    pub terms: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn is_party(&self, user: UserId) -> bool {
        self.client_id == user || self.freelancer_id == user
    }
}

/// A contract derived from an accepted proposal, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContract {
    pub project_id: ProjectId,
    pub proposal_id: ProposalId,
    pub client_id: UserId,
    pub freelancer_id: UserId,
    pub budget_amount: i64,
    pub currency: String,
    pub status: ContractStatus,
    pub progress: i32,
    pub start_date: NaiveDate,
    pub deadline: Option<NaiveDate>,
    pub milestones: Vec<Milestone>,
    pub terms: Option<String>,
}

/// Terminal transition applied to an active contract together with its project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractClosure {
    pub status: ContractStatus,
    pub progress: i32,
    pub terms: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_milestone_serializes_with_null_due_date() {
        let value = serde_json::to_value(Milestone::pending("A")).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "A", "completed": false, "due_date": null})
        );
    }

    #[test]
    fn closure_status_maps_to_project_status() {
        assert_eq!(
            ContractStatus::Completed.project_status(),
            ProjectStatus::Completed
        );
        assert_eq!(
            ContractStatus::Cancelled.project_status(),
            ProjectStatus::Cancelled
        );
    }
}
