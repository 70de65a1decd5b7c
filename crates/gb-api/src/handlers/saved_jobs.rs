use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gb_common::model::{ProjectId, SavedJob};
use serde_json::json;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn list_saved(
    State(state): State<SharedState>,
    auth: AuthUser,
) -> Result<Json<Vec<SavedJob>>, ApiError> {
    let saved = state.services.saved_jobs.list_saved(&auth.requester).await?;
    Ok(Json(saved))
}

pub async fn is_saved(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let saved = state
        .services
        .saved_jobs
        .is_saved(&auth.requester, project_id)
        .await?;
    Ok(Json(json!({ "project_id": project_id, "saved": saved })))
}

pub async fn save(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<(StatusCode, Json<SavedJob>), ApiError> {
    let saved = state
        .services
        .saved_jobs
        .save(&auth.requester, project_id)
        .await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

pub async fn unsave(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(project_id): Path<ProjectId>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .saved_jobs
        .unsave(&auth.requester, project_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
