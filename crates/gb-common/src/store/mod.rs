//! Persistence gateway.
//!
//! `MarketStore` is the only seam between the services and storage. It is
//! plain CRUD plus a handful of multi-row writes that must commit as one unit
//! (`commit_acceptance`, `reconcile_acceptance`, `close_contract`). Conditional
//! writes report a miss through their return value instead of an error so the
//! caller can tell "condition failed" apart from "row absent".

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{
    ApplicationId, ApplicationStatus, Category, Contract, ContractClosure, ContractId,
    JobApplication, NewContract, NewJobApplication, NewProject, NewProposal, NewRecruitmentJob,
    Page, Pagination, Project, ProjectFilter, ProjectId, Proposal, ProposalFilter, ProposalId,
    ProposalStatus, RecruitmentJob, RecruitmentJobId, RecruitmentJobStatus, SavedJob, UserId,
};

pub use memory::MemoryStore;

/// Constraint names shared by the PostgreSQL schema and the in-memory store.
pub mod constraints {
    pub const ONE_ACCEPTED_PER_PROJECT: &str = "proposals_one_accepted_per_project";
    pub const PROPOSAL_PER_FREELANCER: &str = "proposals_project_freelancer_key";
    pub const CONTRACT_PER_PROPOSAL: &str = "contracts_proposal_id_key";
    pub const SAVED_JOB_PER_USER: &str = "saved_jobs_user_project_key";
    pub const APPLICATION_PER_APPLICANT: &str = "job_applications_job_applicant_key";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),
    #[error("check constraint violated: {0}")]
    CheckViolation(String),
    #[error("failed to map row: {0}")]
    Mapping(String),
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn violates(&self, constraint: &str) -> bool {
        matches!(self, StoreError::UniqueViolation(name) if name == constraint)
    }
}

/// Outcome of a conditional delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    ConditionFailed,
}

/// Everything the acceptance cascade writes, derived before the transaction opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptanceWrite {
    pub project_id: ProjectId,
    pub proposal_id: ProposalId,
    pub freelancer_id: UserId,
    pub contract: NewContract,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcceptanceCommit {
    Committed { contract: Contract, rejected: u64 },
    /// The proposal left `submitted` before the conditional update ran.
    ProposalNotSubmitted,
    /// The project is no longer `active`, so another proposal already won.
    ProjectNotActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub contract: Contract,
    pub contract_created: bool,
    pub rejected: u64,
    pub project_promoted: bool,
}

#[async_trait]
pub trait MarketStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    // projects
    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError>;
    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError>;
    async fn list_projects(
        &self,
        filter: &ProjectFilter,
        pagination: Pagination,
    ) -> Result<Page<Project>, StoreError>;

    // proposals
    async fn insert_proposal(&self, proposal: NewProposal) -> Result<Proposal, StoreError>;
    async fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError>;
    async fn list_proposals(&self, filter: &ProposalFilter) -> Result<Vec<Proposal>, StoreError>;
    async fn count_proposals(
        &self,
        project_id: ProjectId,
        status: ProposalStatus,
    ) -> Result<u64, StoreError>;
    /// Delete a proposal owned by `freelancer_id` that is not `accepted`.
    async fn delete_proposal(
        &self,
        id: ProposalId,
        freelancer_id: UserId,
    ) -> Result<DeleteOutcome, StoreError>;
    /// Accepted proposals that have no contract row.
    async fn list_accepted_without_contract(&self, limit: i64)
        -> Result<Vec<Proposal>, StoreError>;

    // acceptance cascade
    async fn commit_acceptance(
        &self,
        write: &AcceptanceWrite,
    ) -> Result<AcceptanceCommit, StoreError>;
    /// Finish the cascade for a proposal that is already `accepted`; `None`
    /// when the proposal is not `accepted`.
    async fn reconcile_acceptance(
        &self,
        write: &AcceptanceWrite,
    ) -> Result<Option<ReconcileOutcome>, StoreError>;

    // contracts
    async fn insert_contract(&self, contract: NewContract) -> Result<Contract, StoreError>;
    async fn get_contract(&self, id: ContractId) -> Result<Option<Contract>, StoreError>;
    async fn get_contract_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<Contract>, StoreError>;
    async fn list_contracts_for_user(&self, user_id: UserId) -> Result<Vec<Contract>, StoreError>;
    /// Set progress on an `active` contract; `None` when the condition fails.
    async fn update_contract_progress(
        &self,
        id: ContractId,
        progress: i32,
    ) -> Result<Option<Contract>, StoreError>;
    /// Close an `active` contract and cascade its project status.
    async fn close_contract(
        &self,
        id: ContractId,
        closure: &ContractClosure,
    ) -> Result<Option<Contract>, StoreError>;

    // saved jobs
    async fn saved_job_exists(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, StoreError>;
    async fn insert_saved_job(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<SavedJob, StoreError>;
    async fn delete_saved_job(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, StoreError>;
    async fn list_saved_jobs(&self, user_id: UserId) -> Result<Vec<SavedJob>, StoreError>;

    // recruitment board
    async fn insert_recruitment_job(
        &self,
        job: NewRecruitmentJob,
    ) -> Result<RecruitmentJob, StoreError>;
    async fn get_recruitment_job(
        &self,
        id: RecruitmentJobId,
    ) -> Result<Option<RecruitmentJob>, StoreError>;
    async fn list_recruitment_jobs(
        &self,
        status: Option<RecruitmentJobStatus>,
        pagination: Pagination,
    ) -> Result<Page<RecruitmentJob>, StoreError>;
    async fn set_recruitment_job_status(
        &self,
        id: RecruitmentJobId,
        status: RecruitmentJobStatus,
    ) -> Result<Option<RecruitmentJob>, StoreError>;
    async fn insert_application(
        &self,
        application: NewJobApplication,
    ) -> Result<JobApplication, StoreError>;
    async fn get_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<JobApplication>, StoreError>;
    async fn list_applications(
        &self,
        job_id: RecruitmentJobId,
    ) -> Result<Vec<JobApplication>, StoreError>;
    async fn set_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Option<JobApplication>, StoreError>;
    async fn delete_application(
        &self,
        id: ApplicationId,
        applicant_id: UserId,
    ) -> Result<DeleteOutcome, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;
}
