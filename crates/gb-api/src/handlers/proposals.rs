use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gb_common::api::proposal::SubmitProposalRequest;
use gb_common::model::{ProjectId, Proposal, ProposalId};
use gb_common::service::AcceptanceResult;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn list_project_proposals(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<Vec<Proposal>>, ApiError> {
    let proposals = state
        .services
        .proposals
        .list_project_proposals(&auth.requester, project_id)
        .await?;
    Ok(Json(proposals))
}

pub async fn submit_proposal(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(project_id): Path<ProjectId>,
    Json(request): Json<SubmitProposalRequest>,
) -> Result<(StatusCode, Json<Proposal>), ApiError> {
    let proposal = state
        .services
        .proposals
        .submit_proposal(&auth.requester, project_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(proposal)))
}

pub async fn list_my_proposals(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<Vec<Proposal>>, ApiError> {
    let proposals = state
        .services
        .proposals
        .list_my_proposals(&auth.requester)
        .await?;
    Ok(Json(proposals))
}

pub async fn delete_proposal(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ProposalId>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .proposals
        .delete_proposal(&auth.requester, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `201` when this call created the contract, `200` for a replay.
pub async fn accept_proposal(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ProposalId>,
) -> Result<(StatusCode, Json<AcceptanceResult>), ApiError> {
    let result = state
        .services
        .proposals
        .accept_proposal(&auth.requester, id)
        .await?;
    let status = if result.replayed {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(result)))
}
