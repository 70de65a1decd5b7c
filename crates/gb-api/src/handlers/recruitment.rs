use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use gb_common::api::recruitment::{
    ApplyRequest, ListJobsParams, PostJobRequest, ReviewApplicationRequest,
};
use gb_common::model::{
    ApplicationId, Category, JobApplication, Page, Pagination, RecruitmentJob, RecruitmentJobId,
};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::SharedState;

pub async fn list_jobs(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Query(params): Query<ListJobsParams>,
) -> Result<Json<Page<RecruitmentJob>>, ApiError> {
    let pagination = Pagination::new(params.limit, params.offset)?;
    let page = state
        .services
        .recruitment
        .list_jobs(params.open_only, pagination)
        .await?;
    Ok(Json(page))
}

pub async fn post_job(
    State(state): State<SharedState>,
    auth: AuthUser,
    Json(request): Json<PostJobRequest>,
) -> Result<(StatusCode, Json<RecruitmentJob>), ApiError> {
    let job = state
        .services
        .recruitment
        .post_job(&auth.requester, request)
        .await?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub async fn get_job(
    State(state): State<SharedState>,
    _auth: AuthUser,
    Path(id): Path<RecruitmentJobId>,
) -> Result<Json<RecruitmentJob>, ApiError> {
    Ok(Json(state.services.recruitment.get_job(id).await?))
}

pub async fn close_job(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<RecruitmentJobId>,
) -> Result<Json<RecruitmentJob>, ApiError> {
    let job = state
        .services
        .recruitment
        .close_job(&auth.requester, id)
        .await?;
    Ok(Json(job))
}

pub async fn list_applications(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(job_id): Path<RecruitmentJobId>,
) -> Result<Json<Vec<JobApplication>>, ApiError> {
    let applications = state
        .services
        .recruitment
        .list_applications(&auth.requester, job_id)
        .await?;
    Ok(Json(applications))
}

pub async fn apply(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(job_id): Path<RecruitmentJobId>,
    Json(request): Json<ApplyRequest>,
) -> Result<(StatusCode, Json<JobApplication>), ApiError> {
    let application = state
        .services
        .recruitment
        .apply(&auth.requester, job_id, request)
        .await?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn withdraw(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ApplicationId>,
) -> Result<StatusCode, ApiError> {
    state
        .services
        .recruitment
        .withdraw(&auth.requester, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn review_application(
    State(state): State<SharedState>,
    auth: AuthUser,
    Path(id): Path<ApplicationId>,
    Json(request): Json<ReviewApplicationRequest>,
) -> Result<Json<JobApplication>, ApiError> {
    let application = state
        .services
        .recruitment
        .review_application(&auth.requester, id, request.status)
        .await?;
    Ok(Json(application))
}

pub async fn list_categories(
    State(state): State<SharedState>,
    _auth: AuthUser,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.services.recruitment.list_categories().await?))
}
