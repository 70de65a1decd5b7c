use deadpool_postgres::GenericClient;
use tokio_postgres::Row;
use tracing::instrument;
use uuid::Uuid;

use crate::db::util::TimedClientExt;
use crate::model::{ProjectId, SavedJob, UserId};
use crate::store::StoreError;

fn row_to_saved_job(row: &Row) -> Result<SavedJob, StoreError> {
    Ok(SavedJob {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        project_id: row.try_get("project_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[instrument(skip(client))]
pub async fn saved_job_exists(
    client: &impl GenericClient,
    user_id: UserId,
    project_id: ProjectId,
) -> Result<bool, StoreError> {
    let row = client
        .timed_query_one(
            "SELECT EXISTS (
                SELECT 1 FROM market.saved_jobs WHERE user_id = $1 AND project_id = $2
             )",
            &[&user_id, &project_id],
            "saved_job_exists",
        )
        .await?;
    Ok(row.try_get(0)?)
}

/// Plain insert; a second save surfaces as a unique violation.
#[instrument(skip(client))]
pub async fn insert_saved_job(
    client: &impl GenericClient,
    user_id: UserId,
    project_id: ProjectId,
) -> Result<SavedJob, StoreError> {
    let row = client
        .timed_query_one(
            "INSERT INTO market.saved_jobs (id, user_id, project_id)
             VALUES ($1, $2, $3)
             RETURNING id, user_id, project_id, created_at",
            &[&Uuid::new_v4(), &user_id, &project_id],
            "insert_saved_job",
        )
        .await?;
    row_to_saved_job(&row)
}

#[instrument(skip(client))]
pub async fn delete_saved_job(
    client: &impl GenericClient,
    user_id: UserId,
    project_id: ProjectId,
) -> Result<bool, StoreError> {
    let deleted = client
        .timed_execute(
            "DELETE FROM market.saved_jobs WHERE user_id = $1 AND project_id = $2",
            &[&user_id, &project_id],
            "delete_saved_job",
        )
        .await?;
    Ok(deleted > 0)
}

#[instrument(skip(client))]
pub async fn list_saved_jobs(
    client: &impl GenericClient,
    user_id: UserId,
) -> Result<Vec<SavedJob>, StoreError> {
    let rows = client
        .timed_query(
            "SELECT id, user_id, project_id, created_at FROM market.saved_jobs
             WHERE user_id = $1 ORDER BY created_at DESC, id",
            &[&user_id],
            "list_saved_jobs",
        )
        .await?;
    rows.iter().map(row_to_saved_job).collect()
}
