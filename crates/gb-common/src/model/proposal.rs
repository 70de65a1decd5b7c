use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

use super::{ProjectId, UserId};

pub type ProposalId = Uuid;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProposalStatus {
    Submitted,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub project_id: ProjectId,
    pub freelancer_id: UserId,
    pub bid_amount: i64,
    pub timeline: String,
    pub cover_letter: String,
    pub status: ProposalStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Proposal {
    pub fn is_accepted(&self) -> bool {
        self.status == ProposalStatus::Accepted
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProposal {
    pub project_id: ProjectId,
    pub freelancer_id: UserId,
    pub bid_amount: i64,
    pub timeline: String,
    pub cover_letter: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProposalFilter {
    pub project_id: Option<ProjectId>,
    pub freelancer_id: Option<UserId>,
    pub status: Option<ProposalStatus>,
}

impl ProposalFilter {
    pub fn for_project(project_id: ProjectId) -> Self {
        Self {
            project_id: Some(project_id),
            ..Default::default()
        }
    }

    pub fn for_freelancer(freelancer_id: UserId) -> Self {
        Self {
            freelancer_id: Some(freelancer_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, proposal: &Proposal) -> bool {
        self.project_id.map_or(true, |id| proposal.project_id == id)
            && self
                .freelancer_id
                .map_or(true, |id| proposal.freelancer_id == id)
            && self.status.map_or(true, |status| proposal.status == status)
    }
}
