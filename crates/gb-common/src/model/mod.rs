pub mod contract;
pub mod project;
pub mod proposal;
pub mod recruitment;
pub mod saved_job;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use contract::{Contract, ContractClosure, ContractId, ContractStatus, Milestone, NewContract};
pub use project::{
    Deliverable, NewProject, Project, ProjectFilter, ProjectId, ProjectSort, ProjectStatus,
    ProjectTier,
};
pub use proposal::{NewProposal, Proposal, ProposalFilter, ProposalId, ProposalStatus};
pub use recruitment::{
    ApplicationId, ApplicationStatus, Category, EmploymentType, JobApplication, NewJobApplication,
    NewRecruitmentJob, RecruitmentJob, RecruitmentJobId, RecruitmentJobStatus,
};
pub use saved_job::SavedJob;

use crate::error::MarketError;

/// Users are identified by the UUID issued by the external auth provider.
pub type UserId = Uuid;

/// Identity of whoever issued a call. Passed explicitly into every service
/// operation instead of being read from ambient session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requester {
    Anonymous,
    User(UserId),
}

impl Requester {
    pub fn user(&self) -> Option<UserId> {
        match self {
            Requester::Anonymous => None,
            Requester::User(id) => Some(*id),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Requester::User(_))
    }

    /// Resolve the acting user or fail with `Authentication`.
    pub fn require(&self) -> Result<UserId, MarketError> {
        self.user().ok_or(MarketError::Authentication)
    }
}

impl From<Option<UserId>> for Requester {
    fn from(value: Option<UserId>) -> Self {
        value.map_or(Requester::Anonymous, Requester::User)
    }
}

fn default_limit() -> i64 {
    50
}

/// Offset pagination shared by list endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

pub const MAX_PAGE_LIMIT: i64 = 200;
pub const MAX_PAGE_OFFSET: i64 = 10_000;

impl Pagination {
    /// Build a pagination window, rejecting out-of-range values.
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Result<Self, MarketError> {
        let pagination = Self {
            limit: limit.unwrap_or_else(default_limit),
            offset: offset.unwrap_or(0),
        };
        pagination.validate()?;
        Ok(pagination)
    }

    pub fn validate(&self) -> Result<(), MarketError> {
        if !(1..=MAX_PAGE_LIMIT).contains(&self.limit) {
            return Err(MarketError::validation(format!(
                "limit must be between 1 and {MAX_PAGE_LIMIT}"
            )));
        }
        if !(0..=MAX_PAGE_OFFSET).contains(&self.offset) {
            return Err(MarketError::validation(format!(
                "offset must be between 0 and {MAX_PAGE_OFFSET}"
            )));
        }
        Ok(())
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            offset: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// Build a page from a result set fetched with `limit + 1` rows.
    pub fn from_overfetch(mut items: Vec<T>, pagination: Pagination) -> Self {
        let has_more = (items.len() as i64) > pagination.limit;
        if has_more {
            items.truncate(pagination.limit.max(0) as usize);
        }

        Self {
            items,
            limit: pagination.limit,
            offset: pagination.offset,
            has_more,
        }
    }
}
