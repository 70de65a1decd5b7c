use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use gb_common::api::project::{ListProjectsParams, PostProjectRequest, ProjectDetail};
use gb_common::model::{Page, Project, ProjectId};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn list_projects(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Query(params): Query<ListProjectsParams>,
) -> Result<Json<Page<Project>>, ApiError> {
    let (filter, pagination) = params.into_query()?;
    let page = state
        .services
        .projects
        .list_projects(&filter, pagination)
        .await?;
    Ok(Json(page))
}

pub async fn post_project(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(request): Json<PostProjectRequest>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state
        .services
        .projects
        .post_project(&auth.requester, request)
        .await?;
    Ok((StatusCode::CREATED, Json(project)))
}

pub async fn get_project(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ProjectId>,
) -> Result<Json<ProjectDetail>, ApiError> {
    let project = state.services.projects.get_project(id).await?;
    let saved = state
        .services
        .saved_jobs
        .is_saved(&auth.requester, id)
        .await?;
    Ok(Json(ProjectDetail { project, saved }))
}
