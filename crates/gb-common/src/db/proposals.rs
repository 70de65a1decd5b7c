use deadpool_postgres::GenericClient;
use tokio_postgres::types::ToSql;
use tokio_postgres::Row;
use tracing::instrument;
use uuid::Uuid;

use crate::db::parse_column;
use crate::db::util::TimedClientExt;
use crate::model::{NewProposal, ProjectId, Proposal, ProposalFilter, ProposalId, ProposalStatus, UserId};
use crate::store::{DeleteOutcome, StoreError};

pub(crate) const PROPOSAL_COLUMNS: &str =
    "id, project_id, freelancer_id, bid_amount, timeline, cover_letter, status, created_at, updated_at";

pub(crate) fn row_to_proposal(row: &Row) -> Result<Proposal, StoreError> {
    Ok(Proposal {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        freelancer_id: row.try_get("freelancer_id")?,
        bid_amount: row.try_get("bid_amount")?,
        timeline: row.try_get("timeline")?,
        cover_letter: row.try_get("cover_letter")?,
        status: parse_column("status", row.try_get::<_, &str>("status")?)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[instrument(skip(client, proposal), fields(project_id = proposal.project_id))]
pub async fn insert_proposal(
    client: &impl GenericClient,
    proposal: &NewProposal,
) -> Result<Proposal, StoreError> {
    let query = format!(
        "INSERT INTO market.proposals (id, project_id, freelancer_id, bid_amount, timeline, cover_letter)
         VALUES ($1, $2, $3, $4, $5, $6)
         RETURNING {PROPOSAL_COLUMNS}"
    );
    let row = client
        .timed_query_one(
            &query,
            &[
                &Uuid::new_v4(),
                &proposal.project_id,
                &proposal.freelancer_id,
                &proposal.bid_amount,
                &proposal.timeline,
                &proposal.cover_letter,
            ],
            "insert_proposal",
        )
        .await?;
    row_to_proposal(&row)
}

#[instrument(skip(client))]
pub async fn get_proposal(
    client: &impl GenericClient,
    id: ProposalId,
) -> Result<Option<Proposal>, StoreError> {
    let query = format!("SELECT {PROPOSAL_COLUMNS} FROM market.proposals WHERE id = $1");
    let row = client.timed_query_opt(&query, &[&id], "get_proposal").await?;
    row.map(|r| row_to_proposal(&r)).transpose()
}

#[instrument(skip(client))]
pub async fn list_proposals(
    client: &impl GenericClient,
    filter: &ProposalFilter,
) -> Result<Vec<Proposal>, StoreError> {
    let mut values: Vec<Box<dyn ToSql + Sync + Send>> = Vec::new();
    let mut query = format!("SELECT {PROPOSAL_COLUMNS} FROM market.proposals WHERE 1=1");

    if let Some(project_id) = filter.project_id {
        query.push_str(&format!(" AND project_id = ${}", values.len() + 1));
        values.push(Box::new(project_id));
    }
    if let Some(freelancer_id) = filter.freelancer_id {
        query.push_str(&format!(" AND freelancer_id = ${}", values.len() + 1));
        values.push(Box::new(freelancer_id));
    }
    if let Some(status) = filter.status {
        query.push_str(&format!(" AND status = ${}", values.len() + 1));
        values.push(Box::new(status.as_ref().to_string()));
    }
    query.push_str(" ORDER BY created_at DESC, id");

    let params: Vec<&(dyn ToSql + Sync)> = values
        .iter()
        .map(|v| v.as_ref() as &(dyn ToSql + Sync))
        .collect();
    let rows = client.timed_query(&query, &params, "list_proposals").await?;
    rows.iter().map(row_to_proposal).collect()
}

#[instrument(skip(client))]
pub async fn count_proposals(
    client: &impl GenericClient,
    project_id: ProjectId,
    status: ProposalStatus,
) -> Result<u64, StoreError> {
    let row = client
        .timed_query_one(
            "SELECT COUNT(*) FROM market.proposals WHERE project_id = $1 AND status = $2",
            &[&project_id, &status.as_ref()],
            "count_proposals",
        )
        .await?;
    let count: i64 = row.try_get(0)?;
    Ok(count.max(0) as u64)
}

#[instrument(skip(client))]
pub async fn delete_proposal(
    client: &impl GenericClient,
    id: ProposalId,
    freelancer_id: UserId,
) -> Result<DeleteOutcome, StoreError> {
    let deleted = client
        .timed_execute(
            "DELETE FROM market.proposals
             WHERE id = $1 AND freelancer_id = $2 AND status <> 'accepted'",
            &[&id, &freelancer_id],
            "delete_proposal",
        )
        .await?;
    if deleted == 1 {
        return Ok(DeleteOutcome::Deleted);
    }

    let exists = client
        .timed_query_opt(
            "SELECT 1 FROM market.proposals WHERE id = $1",
            &[&id],
            "proposal_exists",
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
pub async fn list_accepted_without_contract(
    client: &impl GenericClient,
    limit: i64,
) -> Result<Vec<Proposal>, StoreError> {
    let rows = client
        .timed_query(
            "SELECT p.id, p.project_id, p.freelancer_id, p.bid_amount, p.timeline,
                    p.cover_letter, p.status, p.created_at, p.updated_at
             FROM market.proposals p
             LEFT JOIN market.contracts c ON c.proposal_id = p.id
             WHERE p.status = 'accepted' AND c.id IS NULL
             ORDER BY p.updated_at, p.id
             LIMIT $1",
            &[&limit.max(0)],
            "list_accepted_without_contract",
        )
        .await?;
    rows.iter().map(row_to_proposal).collect()
}
