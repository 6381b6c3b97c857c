use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{EducationRequest, ExperienceRequest, MessageResponse, ProfileRequest, ProfileView},
    repo_types::Profile,
    services::{self, EntryKind, Removal},
};
use crate::{
    auth::jwt::AuthUser,
    error::AppResult,
    extract::JsonBody,
    state::AppState,
};

pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/profile",
            get(list_profiles).post(upsert_profile).delete(delete_account),
        )
        .route("/profile/me", get(get_my_profile))
        .route("/profile/user/:user_id", get(get_profile_by_user))
        .route("/profile/experience", put(add_experience))
        .route("/profile/experience/:exp_id", delete(remove_experience))
        .route("/profile/education", put(add_education))
        .route("/profile/education/:edu_id", delete(remove_education))
}

#[instrument(skip(state))]
pub async fn get_my_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<ProfileView>> {
    services::my_profile(state.store.as_ref(), user_id).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn upsert_profile(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<ProfileRequest>,
) -> AppResult<Json<Profile>> {
    services::upsert_profile(state.store.as_ref(), user_id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn list_profiles(State(state): State<AppState>) -> AppResult<Json<Vec<ProfileView>>> {
    services::all_profiles(state.store.as_ref()).await.map(Json)
}

#[instrument(skip(state))]
pub async fn get_profile_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> AppResult<Json<ProfileView>> {
    services::profile_by_user(state.store.as_ref(), &user_id)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn delete_account(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<MessageResponse>> {
    services::delete_account(state.store.as_ref(), user_id).await?;
    Ok(Json(MessageResponse {
        msg: "User removed!".into(),
        profile: None,
    }))
}

#[instrument(skip(state, payload))]
pub async fn add_experience(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<ExperienceRequest>,
) -> AppResult<Json<Profile>> {
    services::add_experience(state.store.as_ref(), user_id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state, payload))]
pub async fn add_education(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<EducationRequest>,
) -> AppResult<Json<Profile>> {
    services::add_education(state.store.as_ref(), user_id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn remove_experience(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(exp_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    remove(&state, user_id, EntryKind::Experience, &exp_id).await
}

#[instrument(skip(state))]
pub async fn remove_education(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(edu_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    remove(&state, user_id, EntryKind::Education, &edu_id).await
}

/// A missing entry still answers 200, carrying only the message.
async fn remove(
    state: &AppState,
    user_id: uuid::Uuid,
    kind: EntryKind,
    raw_id: &str,
) -> AppResult<Json<MessageResponse>> {
    let res = match services::remove_entry(state.store.as_ref(), user_id, kind, raw_id).await? {
        Removal::Removed { profile, msg } => MessageResponse {
            msg: msg.into(),
            profile: Some(profile),
        },
        Removal::Missing { msg } => MessageResponse {
            msg: msg.into(),
            profile: None,
        },
    };
    Ok(Json(res))
}
