use axum::{
    extract::{Path, State},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::Utc;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        extractors::AuthUser,
        guard::{AccessGuard, Caller, Operation},
        is_valid_email, normalize_email,
    },
    error::ApiError,
    state::AppState,
};

use super::dto::{ChangeRoleRequest, UpdateProfileRequest, UpsertProfileRequest, UserResponse};
use super::repo::{self, Role};

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/users/:email", get(get_user))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(upsert_user))
        .route("/users/:email", put(update_user))
        .route("/users/:email/role", patch(change_role))
}

/// Called by the client on every login/signup; creates the profile on
/// first sight and refreshes it afterwards.
#[instrument(skip(state, payload))]
async fn upsert_user(
    State(state): State<AppState>,
    Json(payload): Json<UpsertProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %payload.email, "invalid email on profile upsert");
        return Err(ApiError::BadRequest("invalid email".into()));
    }
    let now = Utc::now();
    let user = repo::upsert_profile(&state.users, &email, payload.to_set_document(now), now).await?;
    info!(email = %user.email, "profile upserted");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = normalize_email(&email);
    let user = repo::find_by_email(&state.users, &email)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
async fn update_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(email): Path<String>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let email = normalize_email(&email);
    // NotFound is resolved before authorization.
    let target = repo::find_by_email(&state.users, &email)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    AccessGuard::new(&state)
        .authorize_user(&Caller::verified(caller), Operation::Update, &target.email)
        .await?;

    let set = payload.to_set_document(Utc::now());
    if set.is_empty() {
        return Err(ApiError::BadRequest("no updatable fields in payload".into()));
    }
    let updated = repo::update_profile(&state.users, &email, set)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    info!(email = %email, "profile updated");
    Ok(Json(updated.into()))
}

#[instrument(skip(state, payload))]
async fn change_role(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(email): Path<String>,
    Json(payload): Json<ChangeRoleRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let role: Role = payload
        .role
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("unknown role: {}", payload.role)))?;

    let email = normalize_email(&email);
    let target = repo::find_by_email(&state.users, &email)
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    AccessGuard::new(&state)
        .authorize_user(&Caller::verified(caller), Operation::ChangeRole, &target.email)
        .await?;

    let updated = repo::set_role(&state.users, &target.email, role, Utc::now())
        .await?
        .ok_or(ApiError::NotFound("user"))?;
    info!(email = %email, role = role.as_str(), "role changed");
    Ok(Json(updated.into()))
}
