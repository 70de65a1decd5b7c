use deadpool_postgres::GenericClient;
use tokio_postgres::Row;
use tracing::instrument;
use uuid::Uuid;

use crate::db::parse_column;
use crate::db::util::TimedClientExt;
use crate::model::{
    ApplicationId, ApplicationStatus, Category, JobApplication, NewJobApplication,
    NewRecruitmentJob, Page, Pagination, RecruitmentJob, RecruitmentJobId, RecruitmentJobStatus,
    UserId,
};
use crate::store::{DeleteOutcome, StoreError};

const JOB_COLUMNS: &str = "id, employer_id, title, company, description, location, employment_type, salary_min, salary_max, currency, status, created_at, updated_at";
const APPLICATION_COLUMNS: &str =
    "id, job_id, applicant_id, cover_letter, resume_url, status, created_at, updated_at";

fn row_to_job(row: &Row) -> Result<RecruitmentJob, StoreError> {
    Ok(RecruitmentJob {
        id: row.try_get("id")?,
        employer_id: row.try_get("employer_id")?,
        title: row.try_get("title")?,
        company: row.try_get("company")?,
        description: row.try_get("description")?,
        location: row.try_get("location")?,
        employment_type: parse_column(
            "employment_type",
            row.try_get::<_, &str>("employment_type")?,
        )?,
        salary_min: row.try_get("salary_min")?,
        salary_max: row.try_get("salary_max")?,
        currency: row.try_get("currency")?,
        status: parse_column("status", row.try_get::<_, &str>("status")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_application(row: &Row) -> Result<JobApplication, StoreError> {
    Ok(JobApplication {
        id: row.try_get("id")?,
        job_id: row.try_get("job_id")?,
        applicant_id: row.try_get("applicant_id")?,
        cover_letter: row.try_get("cover_letter")?,
        resume_url: row.try_get("resume_url")?,
        status: parse_column("status", row.try_get::<_, &str>("status")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[instrument(skip(client, job), fields(employer_id = %job.employer_id))]
pub async fn insert_job(
    client: &impl GenericClient,
    job: &NewRecruitmentJob,
) -> Result<RecruitmentJob, StoreError> {
    let query = format!(
        "INSERT INTO market.recruitment_jobs (
            employer_id, title, company, description, location, employment_type,
            salary_min, salary_max, currency
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING {JOB_COLUMNS}"
    );
    let row = client
        .timed_query_one(
            &query,
            &[
                &job.employer_id,
                &job.title,
                &job.company,
                &job.description,
                &job.location,
                &job.employment_type.as_ref(),
                &job.salary_min,
                &job.salary_max,
                &job.currency,
            ],
            "insert_recruitment_job",
        )
        .await?;
    row_to_job(&row)
}

#[instrument(skip(client))]
pub async fn get_job(
    client: &impl GenericClient,
    id: RecruitmentJobId,
) -> Result<Option<RecruitmentJob>, StoreError> {
    let query = format!("SELECT {JOB_COLUMNS} FROM market.recruitment_jobs WHERE id = $1");
    let row = client
        .timed_query_opt(&query, &[&id], "get_recruitment_job")
        .await?;
    row.map(|r| row_to_job(&r)).transpose()
}

#[instrument(skip(client))]
pub async fn list_jobs(
    client: &impl GenericClient,
    status: Option<RecruitmentJobStatus>,
    pagination: Pagination,
) -> Result<Page<RecruitmentJob>, StoreError> {
    let query = format!(
        "SELECT {JOB_COLUMNS} FROM market.recruitment_jobs
         WHERE ($1::TEXT IS NULL OR status = $1)
         ORDER BY created_at DESC, id DESC
         LIMIT $2 OFFSET $3"
    );
    let status = status.map(|s| s.as_ref().to_string());
    let rows = client
        .timed_query(
            &query,
            &[&status, &(pagination.limit + 1), &pagination.offset],
            "list_recruitment_jobs",
        )
        .await?;
    let items = rows.iter().map(row_to_job).collect::<Result<Vec<_>, _>>()?;
    Ok(Page::from_overfetch(items, pagination))
}

#[instrument(skip(client))]
pub async fn set_job_status(
    client: &impl GenericClient,
    id: RecruitmentJobId,
    status: RecruitmentJobStatus,
) -> Result<Option<RecruitmentJob>, StoreError> {
    let query = format!(
        "UPDATE market.recruitment_jobs SET status = $2, updated_at = NOW()
         WHERE id = $1 RETURNING {JOB_COLUMNS}"
    );
    let row = client
        .timed_query_opt(&query, &[&id, &status.as_ref()], "set_recruitment_job_status")
        .await?;
    row.map(|r| row_to_job(&r)).transpose()
}

#[instrument(skip(client, application), fields(job_id = application.job_id))]
pub async fn insert_application(
    client: &impl GenericClient,
    application: &NewJobApplication,
) -> Result<JobApplication, StoreError> {
    let query = format!(
        "INSERT INTO market.job_applications (id, job_id, applicant_id, cover_letter, resume_url)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {APPLICATION_COLUMNS}"
    );
    let row = client
        .timed_query_one(
            &query,
            &[
                &Uuid::new_v4(),
                &application.job_id,
                &application.applicant_id,
                &application.cover_letter,
                &application.resume_url,
            ],
            "insert_application",
        )
        .await?;
    row_to_application(&row)
}

#[instrument(skip(client))]
pub async fn get_application(
    client: &impl GenericClient,
    id: ApplicationId,
) -> Result<Option<JobApplication>, StoreError> {
    let query = format!("SELECT {APPLICATION_COLUMNS} FROM market.job_applications WHERE id = $1");
    let row = client.timed_query_opt(&query, &[&id], "get_application").await?;
    row.map(|r| row_to_application(&r)).transpose()
}

#[instrument(skip(client))]
pub async fn list_applications(
    client: &impl GenericClient,
    job_id: RecruitmentJobId,
) -> Result<Vec<JobApplication>, StoreError> {
    let query = format!(
        "SELECT {APPLICATION_COLUMNS} FROM market.job_applications
         WHERE job_id = $1 ORDER BY created_at, id"
    );
    let rows = client
        .timed_query(&query, &[&job_id], "list_applications")
        .await?;
    rows.iter().map(row_to_application).collect()
}

#[instrument(skip(client))]
pub async fn set_application_status(
    client: &impl GenericClient,
    id: ApplicationId,
    status: ApplicationStatus,
) -> Result<Option<JobApplication>, StoreError> {
    let query = format!(
        "UPDATE market.job_applications SET status = $2, updated_at = NOW()
         WHERE id = $1 RETURNING {APPLICATION_COLUMNS}"
    );
    let row = client
        .timed_query_opt(&query, &[&id, &status.as_ref()], "set_application_status")
        .await?;
    row.map(|r| row_to_application(&r)).transpose()
}

#[instrument(skip(client))]
pub async fn delete_application(
    client: &impl GenericClient,
    id: ApplicationId,
    applicant_id: UserId,
) -> Result<DeleteOutcome, StoreError> {
    let deleted = client
        .timed_execute(
            "DELETE FROM market.job_applications WHERE id = $1 AND applicant_id = $2",
            &[&id, &applicant_id],
            "delete_application",
        )
        .await?;
    if deleted == 1 {
        return Ok(DeleteOutcome::Deleted);
    }

    let exists = client
        .timed_query_opt(
            "SELECT 1 FROM market.job_applications WHERE id = $1",
            &[&id],
            "application_exists",
        )
        .await?
        .is_some();
    Ok(if exists {
        DeleteOutcome::ConditionFailed
    } else {
        DeleteOutcome::NotFound
    })
}

#[instrument(skip(client))]
pub async fn list_categories(client: &impl GenericClient) -> Result<Vec<Category>, StoreError> {
    let rows = client
        .timed_query(
            "SELECT id, slug, name FROM market.categories ORDER BY name",
            &[],
            "list_categories",
        )
        .await?;
    rows.iter()
        .map(|row| {
            Ok(Category {
                id: row.try_get("id")?,
                slug: row.try_get("slug")?,
                name: row.try_get("name")?,
            })
        })
        .collect()
}
