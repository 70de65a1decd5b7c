use tracing::{info, instrument};

use crate::api::recruitment::{ApplyRequest, PostJobRequest};
use crate::error::MarketError;
use crate::model::{
    ApplicationId, ApplicationStatus, Category, JobApplication, NewJobApplication,
    NewRecruitmentJob, Page, Pagination, RecruitmentJob, RecruitmentJobId, RecruitmentJobStatus,
    Requester,
};
use crate::normalize::clean_optional;
use crate::store::{constraints, DeleteOutcome};

use super::lifecycle::validate_text;
use super::Gateway;

const MAX_TITLE_LEN: usize = 200;
const MAX_COVER_LETTER_LEN: usize = 10_000;

/// Employment listings and the applications filed against them.
#[derive(Clone)]
pub struct RecruitmentService {
    gateway: Gateway,
}

impl RecruitmentService {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    async fn load_job(&self, id: RecruitmentJobId) -> Result<RecruitmentJob, MarketError> {
        self.gateway
            .call(
                "get_recruitment_job",
                self.gateway.store().get_recruitment_job(id),
            )
            .await?
            .ok_or_else(|| MarketError::not_found("recruitment job", id))
    }

    async fn load_application(&self, id: ApplicationId) -> Result<JobApplication, MarketError> {
        self.gateway
            .call("get_application", self.gateway.store().get_application(id))
            .await?
            .ok_or_else(|| MarketError::not_found("application", id))
    }

    #[instrument(skip(self, request))]
    pub async fn post_job(
        &self,
        requester: &Requester,
        request: PostJobRequest,
    ) -> Result<RecruitmentJob, MarketError> {
        let employer_id = requester.require()?;
        let title = validate_text("title", &request.title, MAX_TITLE_LEN)?;
        let company = validate_text("company", &request.company, MAX_TITLE_LEN)?;

        if request.salary_min.is_some_and(|v| v < 0) || request.salary_max.is_some_and(|v| v < 0) {
            return Err(MarketError::validation("salary must not be negative"));
        }
        if let (Some(min), Some(max)) = (request.salary_min, request.salary_max) {
            if min > max {
                return Err(MarketError::validation(
                    "salary_min must not exceed salary_max",
                ));
            }
        }

        let draft = NewRecruitmentJob {
            employer_id,
            title,
            company,
            description: clean_optional(request.description),
            location: clean_optional(request.location),
            employment_type: request.employment_type,
            salary_min: request.salary_min,
            salary_max: request.salary_max,
            currency: clean_optional(request.currency).map(|c| c.to_uppercase()),
        };

        let job = self
            .gateway
            .call(
                "insert_recruitment_job",
                self.gateway.store().insert_recruitment_job(draft),
            )
            .await?;
        info!(job_id = job.id, "recruitment_job_posted");
        Ok(job)
    }

    /// Close a listing. Closing a closed listing returns it as is.
    #[instrument(skip(self))]
    pub async fn close_job(
        &self,
        requester: &Requester,
        id: RecruitmentJobId,
    ) -> Result<RecruitmentJob, MarketError> {
        let user = requester.require()?;
        let job = self.load_job(id).await?;
        if job.employer_id != user {
            return Err(MarketError::forbidden("only the employer may close this job"));
        }
        if job.status == RecruitmentJobStatus::Closed {
            return Ok(job);
        }

        self.gateway
            .call(
                "set_recruitment_job_status",
                self.gateway
                    .store()
                    .set_recruitment_job_status(id, RecruitmentJobStatus::Closed),
            )
            .await?
            .ok_or_else(|| MarketError::not_found("recruitment job", id))
    }

    pub async fn get_job(&self, id: RecruitmentJobId) -> Result<RecruitmentJob, MarketError> {
        self.load_job(id).await
    }

    pub async fn list_jobs(
        &self,
        open_only: bool,
        pagination: Pagination,
    ) -> Result<Page<RecruitmentJob>, MarketError> {
        pagination.validate()?;
        let status = open_only.then_some(RecruitmentJobStatus::Open);
        self.gateway
            .call(
                "list_recruitment_jobs",
                self.gateway.store().list_recruitment_jobs(status, pagination),
            )
            .await
    }

    #[instrument(skip(self, request))]
    pub async fn apply(
        &self,
        requester: &Requester,
        job_id: RecruitmentJobId,
        request: ApplyRequest,
    ) -> Result<JobApplication, MarketError> {
        let applicant_id = requester.require()?;
        let cover_letter =
            validate_text("cover_letter", &request.cover_letter, MAX_COVER_LETTER_LEN)?;

        let job = self.load_job(job_id).await?;
        if job.status != RecruitmentJobStatus::Open {
            return Err(MarketError::validation(format!(
                "recruitment job {job_id} is closed"
            )));
        }
        if job.employer_id == applicant_id {
            return Err(MarketError::validation(
                "employers cannot apply to their own job",
            ));
        }

        let draft = NewJobApplication {
            job_id,
            applicant_id,
            cover_letter,
            resume_url: clean_optional(request.resume_url),
        };
        let inserted = self
            .gateway
            .call_raw(
                "insert_application",
                self.gateway.store().insert_application(draft),
            )
            .await?;
        match inserted {
            Ok(application) => {
                info!(application_id = %application.id, job_id, "application_submitted");
                Ok(application)
            }
            Err(err) if err.violates(constraints::APPLICATION_PER_APPLICANT) => Err(
                MarketError::Duplicate(format!("already applied to recruitment job {job_id}")),
            ),
            Err(err) => Err(err.into()),
        }
    }

    #[instrument(skip(self))]
    pub async fn withdraw(
        &self,
        requester: &Requester,
        application_id: ApplicationId,
    ) -> Result<(), MarketError> {
        let user = requester.require()?;
        let outcome = self
            .gateway
            .call(
                "delete_application",
                self.gateway.store().delete_application(application_id, user),
            )
            .await?;

        match outcome {
            DeleteOutcome::Deleted => Ok(()),
            DeleteOutcome::NotFound => Err(MarketError::not_found("application", application_id)),
            DeleteOutcome::ConditionFailed => Err(MarketError::forbidden(
                "only the applicant may withdraw an application",
            )),
        }
    }

    pub async fn list_applications(
        &self,
        requester: &Requester,
        job_id: RecruitmentJobId,
    ) -> Result<Vec<JobApplication>, MarketError> {
        let user = requester.require()?;
        let job = self.load_job(job_id).await?;
        if job.employer_id != user {
            return Err(MarketError::forbidden(
                "only the employer may list applications",
            ));
        }

        self.gateway
            .call(
                "list_applications",
                self.gateway.store().list_applications(job_id),
            )
            .await
    }

    #[instrument(skip(self))]
    pub async fn review_application(
        &self,
        requester: &Requester,
        application_id: ApplicationId,
        status: ApplicationStatus,
    ) -> Result<JobApplication, MarketError> {
        let user = requester.require()?;
        if !status.is_review_outcome() {
            return Err(MarketError::validation(
                "applications cannot be moved back to submitted",
            ));
        }

        let application = self.load_application(application_id).await?;
        let job = self.load_job(application.job_id).await?;
        if job.employer_id != user {
            return Err(MarketError::forbidden(
                "only the employer may review applications",
            ));
        }

        self.gateway
            .call(
                "set_application_status",
                self.gateway
                    .store()
                    .set_application_status(application_id, status),
            )
            .await?
            .ok_or_else(|| MarketError::not_found("application", application_id))
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, MarketError> {
        self.gateway
            .call("list_categories", self.gateway.store().list_categories())
            .await
    }
}
