use deadpool_postgres::{Client, GenericClient};
use tokio_postgres::types::Json;
use tokio_postgres::Row;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::db::parse_column;
use crate::db::util::TimedClientExt;
use crate::model::{
    Contract, ContractClosure, ContractId, Milestone, NewContract, ProjectId, ProjectStatus,
    ProposalId, UserId,
};
use crate::store::{AcceptanceCommit, AcceptanceWrite, ReconcileOutcome, StoreError};

const CONTRACT_COLUMNS: &str = "id, project_id, proposal_id, client_id, freelancer_id, budget_amount, currency, status, progress, start_date, deadline, milestones, terms, created_at, updated_at";

fn row_to_contract(row: &Row) -> Result<Contract, StoreError> {
    let Json(milestones): Json<Vec<Milestone>> = row.try_get("milestones")?;

    Ok(Contract {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        proposal_id: row.try_get("proposal_id")?,
        client_id: row.try_get("client_id")?,
        freelancer_id: row.try_get("freelancer_id")?,
        budget_amount: row.try_get("budget_amount")?,
        currency: row.try_get("currency")?,
        status: parse_column("status", row.try_get::<_, &str>("status")?)?,
        progress: row.try_get("progress")?,
        start_date: row.try_get("start_date")?,
        deadline: row.try_get("deadline")?,
        milestones,
        terms: row.try_get("terms")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[instrument(skip(client, contract), fields(proposal_id = %contract.proposal_id))]
pub async fn insert_contract(
    client: &impl GenericClient,
    contract: &NewContract,
) -> Result<Contract, StoreError> {
    let query = format!(
        "INSERT INTO market.contracts (
            id, project_id, proposal_id, client_id, freelancer_id, budget_amount, currency,
            status, progress, start_date, deadline, milestones, terms
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        RETURNING {CONTRACT_COLUMNS}"
    );
    let row = client
        .timed_query_one(
            &query,
            &[
                &Uuid::new_v4(),
                &contract.project_id,
                &contract.proposal_id,
                &contract.client_id,
                &contract.freelancer_id,
                &contract.budget_amount,
                &contract.currency,
                &contract.status.as_ref(),
                &contract.progress,
                &contract.start_date,
                &contract.deadline,
                &Json(&contract.milestones),
                &contract.terms,
            ],
            "insert_contract",
        )
        .await?;
    row_to_contract(&row)
}

#[instrument(skip(client))]
pub async fn get_contract(
    client: &impl GenericClient,
    id: ContractId,
) -> Result<Option<Contract>, StoreError> {
    let query = format!("SELECT {CONTRACT_COLUMNS} FROM market.contracts WHERE id = $1");
    let row = client.timed_query_opt(&query, &[&id], "get_contract").await?;
    row.map(|r| row_to_contract(&r)).transpose()
}

#[instrument(skip(client))]
pub async fn get_contract_by_proposal(
    client: &impl GenericClient,
    proposal_id: ProposalId,
) -> Result<Option<Contract>, StoreError> {
    let query = format!("SELECT {CONTRACT_COLUMNS} FROM market.contracts WHERE proposal_id = $1");
    let row = client
        .timed_query_opt(&query, &[&proposal_id], "get_contract_by_proposal")
        .await?;
    row.map(|r| row_to_contract(&r)).transpose()
}

#[instrument(skip(client))]
pub async fn list_contracts_for_user(
    client: &impl GenericClient,
    user_id: UserId,
) -> Result<Vec<Contract>, StoreError> {
    let query = format!(
        "SELECT {CONTRACT_COLUMNS} FROM market.contracts
         WHERE client_id = $1 OR freelancer_id = $1
         ORDER BY created_at DESC, id"
    );
    let rows = client
        .timed_query(&query, &[&user_id], "list_contracts_for_user")
        .await?;
    rows.iter().map(row_to_contract).collect()
}

#[instrument(skip(client))]
pub async fn update_contract_progress(
    client: &impl GenericClient,
    id: ContractId,
    progress: i32,
) -> Result<Option<Contract>, StoreError> {
    let query = format!(
        "UPDATE market.contracts SET progress = $2, updated_at = NOW()
         WHERE id = $1 AND status = 'active'
         RETURNING {CONTRACT_COLUMNS}"
    );
    let row = client
        .timed_query_opt(&query, &[&id, &progress], "update_contract_progress")
        .await?;
    row.map(|r| row_to_contract(&r)).transpose()
}

async fn lock_project_status(
    client: &impl GenericClient,
    project_id: ProjectId,
) -> Result<Option<ProjectStatus>, StoreError> {
    let row = client
        .timed_query_opt(
            "SELECT status FROM market.projects WHERE id = $1 FOR UPDATE",
            &[&project_id],
            "lock_project",
        )
        .await?;
    row.map(|r| parse_column("status", r.try_get::<_, &str>("status")?))
        .transpose()
}

async fn reject_siblings(
    client: &impl GenericClient,
    project_id: ProjectId,
    winner: ProposalId,
) -> Result<u64, StoreError> {
    Ok(client
        .timed_execute(
            "UPDATE market.proposals SET status = 'rejected', updated_at = NOW()
             WHERE project_id = $1 AND id <> $2 AND status = 'submitted'",
            &[&project_id, &winner],
            "reject_sibling_proposals",
        )
        .await?)
}

async fn promote_project(
    client: &impl GenericClient,
    project_id: ProjectId,
    freelancer_id: UserId,
) -> Result<bool, StoreError> {
    let updated = client
        .timed_execute(
            "UPDATE market.projects
             SET status = 'in_progress', freelancer_id = $2, updated_at = NOW()
             WHERE id = $1 AND status = 'active'",
            &[&project_id, &freelancer_id],
            "promote_project",
        )
        .await?;
    Ok(updated == 1)
}

/// Run the whole acceptance cascade in one transaction.
///
/// The project row is locked first so concurrent acceptances on the same
/// project serialize; the proposal flips only from `submitted`. Returning
/// early drops the transaction, which rolls it back.
#[instrument(skip(client, write), fields(project_id = write.project_id, proposal_id = %write.proposal_id))]
pub async fn commit_acceptance(
    client: &mut Client,
    write: &AcceptanceWrite,
) -> Result<AcceptanceCommit, StoreError> {
    let tx = client.transaction().await?;

    if lock_project_status(&tx, write.project_id).await? != Some(ProjectStatus::Active) {
        return Ok(AcceptanceCommit::ProjectNotActive);
    }

    let accepted = tx
        .timed_execute(
            "UPDATE market.proposals SET status = 'accepted', updated_at = NOW()
             WHERE id = $1 AND project_id = $2 AND status = 'submitted'",
            &[&write.proposal_id, &write.project_id],
            "accept_proposal",
        )
        .await?;
    if accepted == 0 {
        return Ok(AcceptanceCommit::ProposalNotSubmitted);
    }

    let contract = insert_contract(&tx, &write.contract).await?;
    let rejected = reject_siblings(&tx, write.project_id, write.proposal_id).await?;
    promote_project(&tx, write.project_id, write.freelancer_id).await?;

    tx.commit().await?;
    debug!(contract_id = %contract.id, rejected, "acceptance_committed");
    Ok(AcceptanceCommit::Committed { contract, rejected })
}

#[instrument(skip(client, write), fields(proposal_id = %write.proposal_id))]
pub async fn reconcile_acceptance(
    client: &mut Client,
    write: &AcceptanceWrite,
) -> Result<Option<ReconcileOutcome>, StoreError> {
    let tx = client.transaction().await?;

    if lock_project_status(&tx, write.project_id).await?.is_none() {
        return Ok(None);
    }

    let accepted = tx
        .timed_query_opt(
            "SELECT 1 FROM market.proposals
             WHERE id = $1 AND project_id = $2 AND status = 'accepted'
             FOR UPDATE",
            &[&write.proposal_id, &write.project_id],
            "lock_accepted_proposal",
        )
        .await?
        .is_some();
    if !accepted {
        return Ok(None);
    }

    let (contract, contract_created) = match get_contract_by_proposal(&tx, write.proposal_id).await? {
        Some(existing) => (existing, false),
        None => (insert_contract(&tx, &write.contract).await?, true),
    };
    let rejected = reject_siblings(&tx, write.project_id, write.proposal_id).await?;
    let project_promoted = promote_project(&tx, write.project_id, write.freelancer_id).await?;

    tx.commit().await?;
    Ok(Some(ReconcileOutcome {
        contract,
        contract_created,
        rejected,
        project_promoted,
    }))
}

/// Close an active contract and move its project to the matching status.
#[instrument(skip(client, closure), fields(status = closure.status.as_ref()))]
pub async fn close_contract(
    client: &mut Client,
    id: ContractId,
    closure: &ContractClosure,
) -> Result<Option<Contract>, StoreError> {
    let tx = client.transaction().await?;

    let query = format!(
        "UPDATE market.contracts
         SET status = $2, progress = $3, terms = $4, updated_at = NOW()
         WHERE id = $1 AND status = 'active'
         RETURNING {CONTRACT_COLUMNS}"
    );
    let Some(row) = tx
        .timed_query_opt(
            &query,
            &[&id, &closure.status.as_ref(), &closure.progress, &closure.terms],
            "close_contract",
        )
        .await?
    else {
        return Ok(None);
    };
    let contract = row_to_contract(&row)?;

    tx.timed_execute(
        "UPDATE market.projects SET status = $2, updated_at = NOW() WHERE id = $1",
        &[&contract.project_id, &closure.status.project_status().as_ref()],
        "cascade_project_status",
    )
    .await?;

    tx.commit().await?;
    Ok(Some(contract))
}
