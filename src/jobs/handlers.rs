use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, patch, post},
    Json, Router,
};
use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use tracing::{info, instrument};

use crate::{
    auth::{
        extractors::AuthUser,
        guard::{AccessGuard, Caller, Operation},
        is_valid_email, normalize_email,
    },
    error::ApiError,
    state::AppState,
};

use super::dto::{
    AcceptTaskRequest, CreateJobRequest, EmailQuery, JobListQuery, JobListResponse, JobResponse,
    UpdateJobRequest,
};
use super::repo::{self, JobDoc};

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/allJobs", get(list_jobs))
        .route("/allJobs/:id", get(get_job))
        .route("/myAddedJobs", get(my_added_jobs))
        .route("/my-accepted-tasks", get(my_accepted_tasks))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/allJobs", post(create_job))
        .route("/updateJob/:id", patch(update_job))
        .route("/deleteJob/:id", delete(delete_job))
        .route("/my-accepted-tasks/:id", patch(accept_task))
}

fn parse_job_id(id: &str) -> Result<ObjectId, ApiError> {
    ObjectId::parse_str(id).map_err(|_| ApiError::BadRequest(format!("malformed job id: {id}")))
}

#[instrument(skip(state))]
async fn list_jobs(
    State(state): State<AppState>,
    Query(query): Query<JobListQuery>,
) -> Result<Json<JobListResponse>, ApiError> {
    let filter = repo::list_filter(
        query.q.as_deref(),
        query.category.as_deref(),
        query.status.as_deref(),
    );
    let total = repo::count(&state.jobs, filter.clone()).await?;
    let jobs = repo::list(
        &state.jobs,
        filter,
        query.sort.sort_document(),
        query.skip(),
        query.page_size(),
    )
    .await?;
    Ok(Json(JobListResponse {
        jobs: jobs.into_iter().map(JobResponse::from).collect(),
        total,
        page: query.page(),
        page_size: query.page_size(),
    }))
}

#[instrument(skip(state))]
async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResponse>, ApiError> {
    let id = parse_job_id(&id)?;
    let job = repo::find_by_id(&state.jobs, id)
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    Ok(Json(job.into()))
}

#[instrument(skip(state, payload))]
async fn create_job(
    State(state): State<AppState>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<(StatusCode, HeaderMap, Json<JobResponse>), ApiError> {
    let user_email = normalize_email(&payload.user_email);
    if !is_valid_email(&user_email) {
        return Err(ApiError::BadRequest("invalid userEmail".into()));
    }
    if payload.title.trim().is_empty() {
        return Err(ApiError::BadRequest("title is required".into()));
    }

    let now = Utc::now();
    let mut job = JobDoc {
        id: None,
        title: payload.title,
        posted_by: payload.posted_by,
        category: payload.category,
        summary: payload.summary,
        cover_image: payload.cover_image,
        user_email,
        skills: payload.skills,
        experience: payload.experience,
        requirements: payload.requirements,
        job_type: payload.job_type,
        location_type: payload.location_type,
        posted_date: payload.posted_date,
        salary_range: payload.salary_range,
        accepted_by: None,
        status: payload.status,
        created_at: now,
        updated_at: now,
    };
    let id = repo::insert(&state.jobs, &job).await?;
    job.id = Some(id);
    info!(job_id = %id, owner = %job.user_email, "job created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = format!("/allJobs/{}", id.to_hex()).parse() {
        headers.insert(axum::http::header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(job.into())))
}

#[instrument(skip(state, payload))]
async fn update_job(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateJobRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    let id = parse_job_id(&id)?;
    // NotFound is resolved before authorization.
    let job = repo::find_by_id(&state.jobs, id)
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    AccessGuard::new(&state)
        .authorize_job(&Caller::verified(caller), Operation::Update, &job.user_email)
        .await?;

    let set = payload.to_set_document(Utc::now());
    if set.is_empty() {
        return Err(ApiError::BadRequest("no updatable fields in payload".into()));
    }
    let updated = repo::apply_update(&state.jobs, id, set)
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    info!(job_id = %id, "job updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state))]
async fn delete_job(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_job_id(&id)?;
    let job = repo::find_by_id(&state.jobs, id)
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    AccessGuard::new(&state)
        .authorize_job(&Caller::verified(caller), Operation::Delete, &job.user_email)
        .await?;

    repo::delete(&state.jobs, id).await?;
    info!(job_id = %id, "job deleted");
    Ok(StatusCode::NO_CONTENT)
}

// A missing/garbled email param reports through the same JSON error
// envelope as every other BadRequest, not the extractor's plain text.
fn require_email(query: Result<Query<EmailQuery>, QueryRejection>) -> Result<String, ApiError> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(normalize_email(&query.email))
}

#[instrument(skip(state, query))]
async fn my_added_jobs(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Vec<JobResponse>>, ApiError> {
    let email = require_email(query)?;
    let jobs = repo::find_by_owner(&state.jobs, &email).await?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

#[instrument(skip(state, query))]
async fn my_accepted_tasks(
    State(state): State<AppState>,
    query: Result<Query<EmailQuery>, QueryRejection>,
) -> Result<Json<Vec<JobResponse>>, ApiError> {
    let email = require_email(query)?;
    let jobs = repo::find_by_accepted(&state.jobs, &email).await?;
    Ok(Json(jobs.into_iter().map(JobResponse::from).collect()))
}

/// Ungated: no token, no ownership check. Any caller may claim any job,
/// and concurrent claims race with last write winning.
#[instrument(skip(state, payload))]
async fn accept_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<AcceptTaskRequest>,
) -> Result<Json<JobResponse>, ApiError> {
    let id = parse_job_id(&id)?;
    let accepted_by = payload.accepted_by.as_deref().map(normalize_email);
    let updated = repo::set_accepted_by(&state.jobs, id, accepted_by.as_deref(), Utc::now())
        .await?
        .ok_or(ApiError::NotFound("job"))?;
    info!(job_id = %id, accepted_by = ?updated.accepted_by, "acceptance updated");
    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use crate::config::{AppConfig, JwtConfig, MongoConfig};
    use crate::state::AppState;

    // The mongo client connects lazily, so routes that resolve before
    // their first store operation can be exercised without a server.
    async fn test_router() -> axum::Router {
        let config = Arc::new(AppConfig {
            mongo: MongoConfig {
                uri: "mongodb://localhost:27017".into(),
                database: "freelanceDB-test".into(),
                timeout: Duration::from_secs(1),
            },
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-iss".into(),
                audience: "test-aud".into(),
            },
        });
        let options = mongodb::options::ClientOptions::parse(&config.mongo.uri)
            .await
            .expect("parse uri");
        let client = mongodb::Client::with_options(options).expect("client");
        crate::jobs::router().with_state(AppState::from_parts(&client, config))
    }

    #[tokio::test]
    async fn accept_task_route_has_no_auth_gate() {
        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/my-accepted-tasks/not-an-object-id")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"acceptedBy":"w@x.com"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        // No Authorization header: a gated route would answer 401 before
        // looking at the path. This one proceeds to id parsing.
        assert_ne!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_job_without_token_is_unauthorized() {
        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/updateJob/not-an-object-id")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"title":"x"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn missing_email_param_uses_the_json_error_envelope() {
        let app = test_router().await;
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/myAddedJobs")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).expect("json error body");
        assert!(body.get("error").is_some());
    }
}
