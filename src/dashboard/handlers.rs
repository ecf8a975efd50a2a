use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use tracing::instrument;

use crate::{auth::extractors::AuthUser, error::ApiError, jobs::dto::JobResponse, state::AppState};

use super::dto::{ChartsResponse, OverviewResponse};
use super::repo;

/// Gated on a valid token only, not on the admin role. Any authenticated
/// user can read aggregate metrics.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard/overview", get(overview))
        .route("/dashboard/charts", get(charts))
        .route("/dashboard/recent", get(recent))
}

#[instrument(skip(state))]
async fn overview(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<OverviewResponse>, ApiError> {
    let overview = repo::overview(&state.jobs, &state.users).await?;
    Ok(Json(overview.into()))
}

#[instrument(skip(state))]
async fn charts(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<ChartsResponse>, ApiError> {
    let categories = repo::jobs_per_category(&state.jobs).await?;
    let per_day = repo::jobs_per_day(&state.jobs, Utc::now()).await?;
    Ok(Json(ChartsResponse::new(categories, per_day)))
}

#[instrument(skip(state))]
async fn recent(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> Result<Json<Vec<JobResponse>>, ApiError> {
    let jobs = repo::recent_jobs(&state.jobs).await?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}
