use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{LoginRequest, PublicUser, RegisterRequest, RegisterResponse, TokenResponse},
    jwt::AuthUser,
    services,
};
use crate::{
    error::AppResult,
    extract::JsonBody,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/user", post(register))
        .route("/auth", post(login).get(get_me))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<RegisterRequest>,
) -> AppResult<Json<RegisterResponse>> {
    services::register(state.store.as_ref(), &state.jwt, payload)
        .await
        .map(Json)
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(payload): JsonBody<LoginRequest>,
) -> AppResult<Json<TokenResponse>> {
    services::login(state.store.as_ref(), &state.jwt, payload)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> AppResult<Json<PublicUser>> {
    services::current_user(state.store.as_ref(), user_id)
        .await
        .map(Json)
}
