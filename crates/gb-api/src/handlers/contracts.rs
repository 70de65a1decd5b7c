use axum::{
    extract::{Path, State},
    Json,
};
use gb_common::api::contract::{CancelContractRequest, ProgressRequest};
use gb_common::model::{Contract, ContractId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn list_my_contracts(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<Vec<Contract>>, ApiError> {
    let contracts = state
        .services
        .contracts
        .list_my_contracts(&auth.requester)
        .await?;
    Ok(Json(contracts))
}

pub async fn get_contract(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ContractId>,
) -> Result<Json<Contract>, ApiError> {
    let contract = state
        .services
        .contracts
        .get_contract(&auth.requester, id)
        .await?;
    Ok(Json(contract))
}

pub async fn update_progress(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ContractId>,
    Json(request): Json<ProgressRequest>,
) -> Result<Json<Contract>, ApiError> {
    let contract = state
        .services
        .contracts
        .update_progress(&auth.requester, id, request.progress)
        .await?;
    Ok(Json(contract))
}

pub async fn complete_contract(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ContractId>,
) -> Result<Json<Contract>, ApiError> {
    let contract = state
        .services
        .contracts
        .complete_contract(&auth.requester, id)
        .await?;
    Ok(Json(contract))
}

pub async fn cancel_contract(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ContractId>,
    Json(request): Json<CancelContractRequest>,
) -> Result<Json<Contract>, ApiError> {
    let contract = state
        .services
        .contracts
        .cancel_contract(&auth.requester, id, &request.reason)
        .await?;
    Ok(Json(contract))
}
