//! PostgreSQL implementation of [`MarketStore`].
//!
//! Each collection lives in its own module as free functions over a
//! `GenericClient`, so the same statements run on a pooled connection or
//! inside a transaction. [`PgStore`] wires them into the trait.

pub mod contracts;
pub mod migrations;
pub mod pool;
pub mod projects;
pub mod proposals;
pub mod recruitment;
pub mod saved_jobs;
pub mod util;

use std::str::FromStr;

use async_trait::async_trait;
use deadpool_postgres::PoolError;
use tokio_postgres::error::SqlState;
use tokio_postgres::Error as PgError;
use tracing::instrument;

use crate::model::{
    ApplicationId, ApplicationStatus, Category, Contract, ContractClosure, ContractId,
    JobApplication, NewContract, NewJobApplication, NewProject, NewProposal, NewRecruitmentJob,
    Page, Pagination, Project, ProjectFilter, ProjectId, Proposal, ProposalFilter, ProposalId,
    ProposalStatus, RecruitmentJob, RecruitmentJobId, RecruitmentJobStatus, SavedJob, UserId,
};
use crate::store::{
    AcceptanceCommit, AcceptanceWrite, DeleteOutcome, MarketStore, ReconcileOutcome, StoreError,
};

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool_from_url, create_pool_with_size, DbPoolError, PgPool};

impl From<PgError> for StoreError {
    fn from(err: PgError) -> Self {
        if let Some(db) = err.as_db_error() {
            let constraint = db.constraint().unwrap_or_default().to_string();
            if *db.code() == SqlState::UNIQUE_VIOLATION {
                return StoreError::UniqueViolation(constraint);
            }
            if *db.code() == SqlState::CHECK_VIOLATION {
                return StoreError::CheckViolation(constraint);
            }
        } else if err.is_closed() {
            return StoreError::Unavailable(err.to_string());
        }
        StoreError::Backend(err.to_string())
    }
}

impl From<PoolError> for StoreError {
    fn from(err: PoolError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Parse a text column into one of the snake_case status enums.
pub(crate) fn parse_column<T: FromStr>(column: &str, value: &str) -> Result<T, StoreError> {
    value
        .parse()
        .map_err(|_| StoreError::Mapping(format!("unexpected {column} value: {value}")))
}

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl MarketStore for PgStore {
    #[instrument(skip(self))]
    async fn ping(&self) -> Result<(), StoreError> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let client = self.pool.get().await?;
        projects::insert_project(&client, &project).await
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let client = self.pool.get().await?;
        projects::get_project(&client, id).await
    }

    async fn list_projects(
        &self,
        filter: &ProjectFilter,
        pagination: Pagination,
    ) -> Result<Page<Project>, StoreError> {
        let client = self.pool.get().await?;
        projects::list_projects(&client, filter, pagination).await
    }

    async fn insert_proposal(&self, proposal: NewProposal) -> Result<Proposal, StoreError> {
        let client = self.pool.get().await?;
        proposals::insert_proposal(&client, &proposal).await
    }

    async fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError> {
        let client = self.pool.get().await?;
        proposals::get_proposal(&client, id).await
    }

    async fn list_proposals(&self, filter: &ProposalFilter) -> Result<Vec<Proposal>, StoreError> {
        let client = self.pool.get().await?;
        proposals::list_proposals(&client, filter).await
    }

    async fn count_proposals(
        &self,
        project_id: ProjectId,
        status: ProposalStatus,
    ) -> Result<u64, StoreError> {
        let client = self.pool.get().await?;
        proposals::count_proposals(&client, project_id, status).await
    }

    async fn delete_proposal(
        &self,
        id: ProposalId,
        freelancer_id: UserId,
    ) -> Result<DeleteOutcome, StoreError> {
        let client = self.pool.get().await?;
        proposals::delete_proposal(&client, id, freelancer_id).await
    }

    async fn list_accepted_without_contract(
        &self,
        limit: i64,
    ) -> Result<Vec<Proposal>, StoreError> {
        let client = self.pool.get().await?;
        proposals::list_accepted_without_contract(&client, limit).await
    }

    async fn commit_acceptance(
        &self,
        write: &AcceptanceWrite,
    ) -> Result<AcceptanceCommit, StoreError> {
        let mut client = self.pool.get().await?;
        contracts::commit_acceptance(&mut client, write).await
    }

    async fn reconcile_acceptance(
        &self,
        write: &AcceptanceWrite,
    ) -> Result<Option<ReconcileOutcome>, StoreError> {
        let mut client = self.pool.get().await?;
        contracts::reconcile_acceptance(&mut client, write).await
    }

    async fn insert_contract(&self, contract: NewContract) -> Result<Contract, StoreError> {
        let client = self.pool.get().await?;
        contracts::insert_contract(&client, &contract).await
    }

    async fn get_contract(&self, id: ContractId) -> Result<Option<Contract>, StoreError> {
        let client = self.pool.get().await?;
        contracts::get_contract(&client, id).await
    }

    async fn get_contract_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<Contract>, StoreError> {
        let client = self.pool.get().await?;
        contracts::get_contract_by_proposal(&client, proposal_id).await
    }

    async fn list_contracts_for_user(&self, user_id: UserId) -> Result<Vec<Contract>, StoreError> {
        let client = self.pool.get().await?;
        contracts::list_contracts_for_user(&client, user_id).await
    }

    async fn update_contract_progress(
        &self,
        id: ContractId,
        progress: i32,
    ) -> Result<Option<Contract>, StoreError> {
        let client = self.pool.get().await?;
        contracts::update_contract_progress(&client, id, progress).await
    }

    async fn close_contract(
        &self,
        id: ContractId,
        closure: &ContractClosure,
    ) -> Result<Option<Contract>, StoreError> {
        let mut client = self.pool.get().await?;
        contracts::close_contract(&mut client, id, closure).await
    }

    async fn saved_job_exists(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        saved_jobs::saved_job_exists(&client, user_id, project_id).await
    }

    async fn insert_saved_job(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<SavedJob, StoreError> {
        let client = self.pool.get().await?;
        saved_jobs::insert_saved_job(&client, user_id, project_id).await
    }

    async fn delete_saved_job(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, StoreError> {
        let client = self.pool.get().await?;
        saved_jobs::delete_saved_job(&client, user_id, project_id).await
    }

    async fn list_saved_jobs(&self, user_id: UserId) -> Result<Vec<SavedJob>, StoreError> {
        let client = self.pool.get().await?;
        saved_jobs::list_saved_jobs(&client, user_id).await
    }

    async fn insert_recruitment_job(
        &self,
        job: NewRecruitmentJob,
    ) -> Result<RecruitmentJob, StoreError> {
        let client = self.pool.get().await?;
        recruitment::insert_job(&client, &job).await
    }

    async fn get_recruitment_job(
        &self,
        id: RecruitmentJobId,
    ) -> Result<Option<RecruitmentJob>, StoreError> {
        let client = self.pool.get().await?;
        recruitment::get_job(&client, id).await
    }

    async fn list_recruitment_jobs(
        &self,
        status: Option<RecruitmentJobStatus>,
        pagination: Pagination,
    ) -> Result<Page<RecruitmentJob>, StoreError> {
        let client = self.pool.get().await?;
        recruitment::list_jobs(&client, status, pagination).await
    }

    async fn set_recruitment_job_status(
        &self,
        id: RecruitmentJobId,
        status: RecruitmentJobStatus,
    ) -> Result<Option<RecruitmentJob>, StoreError> {
        let client = self.pool.get().await?;
        recruitment::set_job_status(&client, id, status).await
    }

    async fn insert_application(
        &self,
        application: NewJobApplication,
    ) -> Result<JobApplication, StoreError> {
        let client = self.pool.get().await?;
        recruitment::insert_application(&client, &application).await
    }

    async fn get_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<JobApplication>, StoreError> {
        let client = self.pool.get().await?;
        recruitment::get_application(&client, id).await
    }

    async fn list_applications(
        &self,
        job_id: RecruitmentJobId,
    ) -> Result<Vec<JobApplication>, StoreError> {
        let client = self.pool.get().await?;
        recruitment::list_applications(&client, job_id).await
    }

    async fn set_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Option<JobApplication>, StoreError> {
        let client = self.pool.get().await?;
        recruitment::set_application_status(&client, id, status).await
    }

    async fn delete_application(
        &self,
        id: ApplicationId,
        applicant_id: UserId,
    ) -> Result<DeleteOutcome, StoreError> {
        let client = self.pool.get().await?;
        recruitment::delete_application(&client, id, applicant_id).await
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let client = self.pool.get().await?;
        recruitment::list_categories(&client).await
    }
}
