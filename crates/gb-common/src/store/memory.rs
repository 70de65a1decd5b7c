use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::{
    constraints, AcceptanceCommit, AcceptanceWrite, DeleteOutcome, MarketStore,
    ReconcileOutcome, StoreError,
};
use crate::model::{
    ApplicationId, ApplicationStatus, Category, Contract, ContractClosure, ContractId,
    ContractStatus, JobApplication, NewContract, NewJobApplication, NewProject, NewProposal,
    NewRecruitmentJob, Page, Pagination, Project, ProjectFilter, ProjectId, ProjectSort,
    ProjectStatus, Proposal, ProposalFilter, ProposalId, ProposalStatus, RecruitmentJob,
    RecruitmentJobId, RecruitmentJobStatus, SavedJob, UserId,
};

#[derive(Default)]
struct Tables {
    projects: Vec<Project>,
    proposals: Vec<Proposal>,
    contracts: Vec<Contract>,
    saved_jobs: Vec<SavedJob>,
    recruitment_jobs: Vec<RecruitmentJob>,
    applications: Vec<JobApplication>,
    categories: Vec<Category>,
    next_project_id: ProjectId,
    next_recruitment_job_id: RecruitmentJobId,
}

impl Tables {
    fn project_mut(&mut self, id: ProjectId) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id == id)
    }

    fn proposal_mut(&mut self, id: ProposalId) -> Option<&mut Proposal> {
        self.proposals.iter_mut().find(|p| p.id == id)
    }

    fn contract_for_proposal(&self, proposal_id: ProposalId) -> Option<&Contract> {
        self.contracts.iter().find(|c| c.proposal_id == proposal_id)
    }

    fn push_contract(&mut self, contract: NewContract) -> Result<Contract, StoreError> {
        if self.contract_for_proposal(contract.proposal_id).is_some() {
            return Err(StoreError::UniqueViolation(
                constraints::CONTRACT_PER_PROPOSAL.into(),
            ));
        }

        let now = Utc::now();
        let row = Contract {
            id: Uuid::new_v4(),
            project_id: contract.project_id,
            proposal_id: contract.proposal_id,
            client_id: contract.client_id,
            freelancer_id: contract.freelancer_id,
            budget_amount: contract.budget_amount,
            currency: contract.currency,
            status: contract.status,
            progress: contract.progress,
            start_date: contract.start_date,
            deadline: contract.deadline,
            milestones: contract.milestones,
            terms: contract.terms,
            created_at: now,
            updated_at: now,
        };
        self.contracts.push(row.clone());
        Ok(row)
    }

    fn reject_siblings(&mut self, project_id: ProjectId, winner: ProposalId) -> u64 {
        let now = Utc::now();
        let mut rejected = 0;
        for proposal in self.proposals.iter_mut().filter(|p| {
            p.project_id == project_id && p.id != winner && p.status == ProposalStatus::Submitted
        }) {
            proposal.status = ProposalStatus::Rejected;
            proposal.updated_at = now;
            rejected += 1;
        }
        rejected
    }

    /// `active` → `in_progress`; returns whether the row changed.
    fn promote_project(&mut self, project_id: ProjectId, freelancer_id: UserId) -> bool {
        match self.project_mut(project_id) {
            Some(project) if project.status == ProjectStatus::Active => {
                project.status = ProjectStatus::InProgress;
                project.freelancer_id = Some(freelancer_id);
                project.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }
}

/// In-memory `MarketStore`.
///
/// Every method runs under one mutex, so multi-row writes are atomic in the
/// same way the PostgreSQL transactions are. The same unique constraints are
/// enforced and reported with the same constraint names.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
    stale_saved_job_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_categories(categories: Vec<Category>) -> Self {
        let store = Self::default();
        if let Ok(mut tables) = store.tables.lock() {
            tables.categories = categories;
        }
        store
    }

    /// Make every call fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Make `saved_job_exists` always answer `false`, as a read that lost the
    /// race with a concurrent insert would.
    pub fn set_stale_saved_job_reads(&self, stale: bool) {
        self.stale_saved_job_reads.store(stale, Ordering::SeqCst);
    }

    /// Overwrite a proposal status without running any cascade. Used to
    /// reproduce rows left behind by partial writers.
    pub fn force_proposal_status(&self, id: ProposalId, status: ProposalStatus) -> bool {
        let Ok(mut tables) = self.tables.lock() else {
            return false;
        };
        match tables.proposal_mut(id) {
            Some(proposal) => {
                proposal.status = status;
                true
            }
            None => false,
        }
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is offline".into()));
        }
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

fn project_matches(filter: &ProjectFilter, project: &Project) -> bool {
    filter.status.map_or(true, |s| project.status == s)
        && filter.tier.map_or(true, |t| project.tier == t)
        && filter.owner_id.map_or(true, |o| project.owner_id == o)
        && filter
            .category
            .as_deref()
            .map_or(true, |c| project.category.as_deref() == Some(c))
        && filter.search.as_deref().map_or(true, |needle| {
            project
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase())
        })
}

fn sort_projects(projects: &mut [Project], sort: ProjectSort) {
    match sort {
        ProjectSort::Newest => {
            projects.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)))
        }
        ProjectSort::Oldest => {
            projects.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
        }
        ProjectSort::BudgetHigh => projects.sort_by(|a, b| {
            b.budget_max
                .unwrap_or(i64::MIN)
                .cmp(&a.budget_max.unwrap_or(i64::MIN))
                .then(b.id.cmp(&a.id))
        }),
        ProjectSort::BudgetLow => projects.sort_by(|a, b| {
            a.budget_min
                .unwrap_or(i64::MAX)
                .cmp(&b.budget_min.unwrap_or(i64::MAX))
                .then(a.id.cmp(&b.id))
        }),
    }
}

fn paginate<T: Clone>(rows: &[T], pagination: Pagination) -> Page<T> {
    let fetched = rows
        .iter()
        .skip(pagination.offset.max(0) as usize)
        .take(pagination.limit.max(0) as usize + 1)
        .cloned()
        .collect();
    Page::from_overfetch(fetched, pagination)
}

#[async_trait]
impl MarketStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.tables().map(|_| ())
    }

    async fn insert_project(&self, project: NewProject) -> Result<Project, StoreError> {
        let mut tables = self.tables()?;
        tables.next_project_id += 1;
        let now = Utc::now();
        let row = Project {
            id: tables.next_project_id,
            owner_id: project.owner_id,
            freelancer_id: None,
            title: project.title,
            short_description: project.short_description,
            description: project.description,
            category: project.category,
            skills: project.skills,
            budget_min: project.budget_min,
            budget_max: project.budget_max,
            currency: project.currency,
            deadline: project.deadline,
            location: project.location,
            attachments: project.attachments,
            objectives: project.objectives,
            technical_requirements: project.technical_requirements,
            deliverables: project.deliverables,
            tier: project.tier,
            status: ProjectStatus::Active,
            created_at: now,
            updated_at: now,
        };
        tables.projects.push(row.clone());
        Ok(row)
    }

    async fn get_project(&self, id: ProjectId) -> Result<Option<Project>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn list_projects(
        &self,
        filter: &ProjectFilter,
        pagination: Pagination,
    ) -> Result<Page<Project>, StoreError> {
        let tables = self.tables()?;
        let mut matching: Vec<Project> = tables
            .projects
            .iter()
            .filter(|p| project_matches(filter, p))
            .cloned()
            .collect();
        sort_projects(&mut matching, filter.sort);
        Ok(paginate(&matching, pagination))
    }

    async fn insert_proposal(&self, proposal: NewProposal) -> Result<Proposal, StoreError> {
        let mut tables = self.tables()?;
        if tables.proposals.iter().any(|p| {
            p.project_id == proposal.project_id && p.freelancer_id == proposal.freelancer_id
        }) {
            return Err(StoreError::UniqueViolation(
                constraints::PROPOSAL_PER_FREELANCER.into(),
            ));
        }

        let now = Utc::now();
        let row = Proposal {
            id: Uuid::new_v4(),
            project_id: proposal.project_id,
            freelancer_id: proposal.freelancer_id,
            bid_amount: proposal.bid_amount,
            timeline: proposal.timeline,
            cover_letter: proposal.cover_letter,
            status: ProposalStatus::Submitted,
            created_at: now,
            updated_at: now,
        };
        tables.proposals.push(row.clone());
        Ok(row)
    }

    async fn get_proposal(&self, id: ProposalId) -> Result<Option<Proposal>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.proposals.iter().find(|p| p.id == id).cloned())
    }

    async fn list_proposals(&self, filter: &ProposalFilter) -> Result<Vec<Proposal>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<Proposal> = tables
            .proposals
            .iter()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn count_proposals(
        &self,
        project_id: ProjectId,
        status: ProposalStatus,
    ) -> Result<u64, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .proposals
            .iter()
            .filter(|p| p.project_id == project_id && p.status == status)
            .count() as u64)
    }

    async fn delete_proposal(
        &self,
        id: ProposalId,
        freelancer_id: UserId,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut tables = self.tables()?;
        let Some(idx) = tables.proposals.iter().position(|p| p.id == id) else {
            return Ok(DeleteOutcome::NotFound);
        };

        let row = &tables.proposals[idx];
        if row.freelancer_id != freelancer_id || row.status == ProposalStatus::Accepted {
            return Ok(DeleteOutcome::ConditionFailed);
        }

        tables.proposals.remove(idx);
        Ok(DeleteOutcome::Deleted)
    }

    async fn list_accepted_without_contract(
        &self,
        limit: i64,
    ) -> Result<Vec<Proposal>, StoreError> {
        let tables = self.tables()?;
        Ok(tables
            .proposals
            .iter()
            .filter(|p| {
                p.status == ProposalStatus::Accepted && tables.contract_for_proposal(p.id).is_none()
            })
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn commit_acceptance(
        &self,
        write: &AcceptanceWrite,
    ) -> Result<AcceptanceCommit, StoreError> {
        let mut tables = self.tables()?;

        let project_active = tables
            .projects
            .iter()
            .any(|p| p.id == write.project_id && p.status == ProjectStatus::Active);
        if !project_active {
            return Ok(AcceptanceCommit::ProjectNotActive);
        }

        let submitted = tables.proposals.iter().any(|p| {
            p.id == write.proposal_id
                && p.project_id == write.project_id
                && p.status == ProposalStatus::Submitted
        });
        if !submitted {
            return Ok(AcceptanceCommit::ProposalNotSubmitted);
        }

        if tables
            .proposals
            .iter()
            .any(|p| p.project_id == write.project_id && p.status == ProposalStatus::Accepted)
        {
            return Err(StoreError::UniqueViolation(
                constraints::ONE_ACCEPTED_PER_PROJECT.into(),
            ));
        }

        // Checks above guarantee the remaining steps cannot fail, so nothing
        // needs rolling back once mutation starts.
        let contract = tables.push_contract(write.contract.clone())?;
        if let Some(proposal) = tables.proposal_mut(write.proposal_id) {
            proposal.status = ProposalStatus::Accepted;
            proposal.updated_at = Utc::now();
        }
        let rejected = tables.reject_siblings(write.project_id, write.proposal_id);
        tables.promote_project(write.project_id, write.freelancer_id);

        Ok(AcceptanceCommit::Committed { contract, rejected })
    }

    async fn reconcile_acceptance(
        &self,
        write: &AcceptanceWrite,
    ) -> Result<Option<ReconcileOutcome>, StoreError> {
        let mut tables = self.tables()?;

        let accepted = tables.proposals.iter().any(|p| {
            p.id == write.proposal_id
                && p.project_id == write.project_id
                && p.status == ProposalStatus::Accepted
        });
        if !accepted {
            return Ok(None);
        }

        let (contract, contract_created) = match tables.contract_for_proposal(write.proposal_id) {
            Some(existing) => (existing.clone(), false),
            None => (tables.push_contract(write.contract.clone())?, true),
        };
        let rejected = tables.reject_siblings(write.project_id, write.proposal_id);
        let project_promoted = tables.promote_project(write.project_id, write.freelancer_id);

        Ok(Some(ReconcileOutcome {
            contract,
            contract_created,
            rejected,
            project_promoted,
        }))
    }

    async fn insert_contract(&self, contract: NewContract) -> Result<Contract, StoreError> {
        let mut tables = self.tables()?;
        tables.push_contract(contract)
    }

    async fn get_contract(&self, id: ContractId) -> Result<Option<Contract>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.contracts.iter().find(|c| c.id == id).cloned())
    }

    async fn get_contract_by_proposal(
        &self,
        proposal_id: ProposalId,
    ) -> Result<Option<Contract>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.contract_for_proposal(proposal_id).cloned())
    }

    async fn list_contracts_for_user(&self, user_id: UserId) -> Result<Vec<Contract>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<Contract> = tables
            .contracts
            .iter()
            .filter(|c| c.is_party(user_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_contract_progress(
        &self,
        id: ContractId,
        progress: i32,
    ) -> Result<Option<Contract>, StoreError> {
        let mut tables = self.tables()?;
        let Some(contract) = tables
            .contracts
            .iter_mut()
            .find(|c| c.id == id && c.status == ContractStatus::Active)
        else {
            return Ok(None);
        };

        contract.progress = progress;
        contract.updated_at = Utc::now();
        Ok(Some(contract.clone()))
    }

    async fn close_contract(
        &self,
        id: ContractId,
        closure: &ContractClosure,
    ) -> Result<Option<Contract>, StoreError> {
        let mut tables = self.tables()?;
        let now = Utc::now();
        let Some(contract) = tables
            .contracts
            .iter_mut()
            .find(|c| c.id == id && c.status == ContractStatus::Active)
        else {
            return Ok(None);
        };

        contract.status = closure.status;
        contract.progress = closure.progress;
        contract.terms = closure.terms.clone();
        contract.updated_at = now;
        let closed = contract.clone();

        if let Some(project) = tables.project_mut(closed.project_id) {
            project.status = closure.status.project_status();
            project.updated_at = now;
        }

        Ok(Some(closed))
    }

    async fn saved_job_exists(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, StoreError> {
        let tables = self.tables()?;
        if self.stale_saved_job_reads.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(tables
            .saved_jobs
            .iter()
            .any(|s| s.user_id == user_id && s.project_id == project_id))
    }

    async fn insert_saved_job(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<SavedJob, StoreError> {
        let mut tables = self.tables()?;
        if tables
            .saved_jobs
            .iter()
            .any(|s| s.user_id == user_id && s.project_id == project_id)
        {
            return Err(StoreError::UniqueViolation(
                constraints::SAVED_JOB_PER_USER.into(),
            ));
        }

        let row = SavedJob {
            id: Uuid::new_v4(),
            user_id,
            project_id,
            created_at: Utc::now(),
        };
        tables.saved_jobs.push(row.clone());
        Ok(row)
    }

    async fn delete_saved_job(
        &self,
        user_id: UserId,
        project_id: ProjectId,
    ) -> Result<bool, StoreError> {
        let mut tables = self.tables()?;
        let before = tables.saved_jobs.len();
        tables
            .saved_jobs
            .retain(|s| !(s.user_id == user_id && s.project_id == project_id));
        Ok(tables.saved_jobs.len() != before)
    }

    async fn list_saved_jobs(&self, user_id: UserId) -> Result<Vec<SavedJob>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<SavedJob> = tables
            .saved_jobs
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn insert_recruitment_job(
        &self,
        job: NewRecruitmentJob,
    ) -> Result<RecruitmentJob, StoreError> {
        let mut tables = self.tables()?;
        tables.next_recruitment_job_id += 1;
        let now = Utc::now();
        let row = RecruitmentJob {
            id: tables.next_recruitment_job_id,
            employer_id: job.employer_id,
            title: job.title,
            company: job.company,
            description: job.description,
            location: job.location,
            employment_type: job.employment_type,
            salary_min: job.salary_min,
            salary_max: job.salary_max,
            currency: job.currency,
            status: RecruitmentJobStatus::Open,
            created_at: now,
            updated_at: now,
        };
        tables.recruitment_jobs.push(row.clone());
        Ok(row)
    }

    async fn get_recruitment_job(
        &self,
        id: RecruitmentJobId,
    ) -> Result<Option<RecruitmentJob>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.recruitment_jobs.iter().find(|j| j.id == id).cloned())
    }

    async fn list_recruitment_jobs(
        &self,
        status: Option<RecruitmentJobStatus>,
        pagination: Pagination,
    ) -> Result<Page<RecruitmentJob>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<RecruitmentJob> = tables
            .recruitment_jobs
            .iter()
            .filter(|j| status.map_or(true, |s| j.status == s))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(paginate(&rows, pagination))
    }

    async fn set_recruitment_job_status(
        &self,
        id: RecruitmentJobId,
        status: RecruitmentJobStatus,
    ) -> Result<Option<RecruitmentJob>, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables
            .recruitment_jobs
            .iter_mut()
            .find(|j| j.id == id)
            .map(|job| {
                job.status = status;
                job.updated_at = Utc::now();
                job.clone()
            }))
    }

    async fn insert_application(
        &self,
        application: NewJobApplication,
    ) -> Result<JobApplication, StoreError> {
        let mut tables = self.tables()?;
        if tables.applications.iter().any(|a| {
            a.job_id == application.job_id && a.applicant_id == application.applicant_id
        }) {
            return Err(StoreError::UniqueViolation(
                constraints::APPLICATION_PER_APPLICANT.into(),
            ));
        }

        let now = Utc::now();
        let row = JobApplication {
            id: Uuid::new_v4(),
            job_id: application.job_id,
            applicant_id: application.applicant_id,
            cover_letter: application.cover_letter,
            resume_url: application.resume_url,
            status: ApplicationStatus::Submitted,
            created_at: now,
            updated_at: now,
        };
        tables.applications.push(row.clone());
        Ok(row)
    }

    async fn get_application(
        &self,
        id: ApplicationId,
    ) -> Result<Option<JobApplication>, StoreError> {
        let tables = self.tables()?;
        Ok(tables.applications.iter().find(|a| a.id == id).cloned())
    }

    async fn list_applications(
        &self,
        job_id: RecruitmentJobId,
    ) -> Result<Vec<JobApplication>, StoreError> {
        let tables = self.tables()?;
        let mut rows: Vec<JobApplication> = tables
            .applications
            .iter()
            .filter(|a| a.job_id == job_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn set_application_status(
        &self,
        id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<Option<JobApplication>, StoreError> {
        let mut tables = self.tables()?;
        Ok(tables
            .applications
            .iter_mut()
            .find(|a| a.id == id)
            .map(|application| {
                application.status = status;
                application.updated_at = Utc::now();
                application.clone()
            }))
    }

    async fn delete_application(
        &self,
        id: ApplicationId,
        applicant_id: UserId,
    ) -> Result<DeleteOutcome, StoreError> {
        let mut tables = self.tables()?;
        let Some(idx) = tables.applications.iter().position(|a| a.id == id) else {
            return Ok(DeleteOutcome::NotFound);
        };
        if tables.applications[idx].applicant_id != applicant_id {
            return Ok(DeleteOutcome::ConditionFailed);
        }
        tables.applications.remove(idx);
        Ok(DeleteOutcome::Deleted)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        let tables = self.tables()?;
        let mut rows = tables.categories.clone();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rows)
    }
}
