use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{MessageResponse, TextRequest},
    repo_types::{Like, Post},
    services,
};
use crate::{
    auth::jwt::AuthUser,
    error::AppResult,
    extract::JsonBody,
    state::AppState,
};

pub fn post_routes() -> Router<AppState> {
    Router::new()
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/:post_id", get(get_post).delete(delete_post))
        .route("/posts/like/:post_id", put(like_post))
        .route("/posts/unlike/:post_id", put(unlike_post))
        .route("/posts/comment/:post_id", post(add_comment))
        .route("/posts/comment/:post_id/:comment_id", delete(remove_comment))
}

#[instrument(skip(state, payload))]
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(payload): JsonBody<TextRequest>,
) -> AppResult<Json<Post>> {
    services::create_post(state.store.as_ref(), user_id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state, _user))]
pub async fn list_posts(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<Vec<Post>>> {
    services::list_posts(state.store.as_ref()).await.map(Json)
}

#[instrument(skip(state, _user))]
pub async fn get_post(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<Post>> {
    services::get_post(state.store.as_ref(), &post_id)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn delete_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    services::delete_post(state.store.as_ref(), &post_id, user_id).await?;
    Ok(Json(MessageResponse {
        msg: "Post removed!",
    }))
}

#[instrument(skip(state))]
pub async fn like_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<Like>>> {
    services::like_post(state.store.as_ref(), &post_id, user_id)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn unlike_post(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<Like>>> {
    services::unlike_post(state.store.as_ref(), &post_id, user_id)
        .await
        .map(Json)
}

#[instrument(skip(state, payload))]
pub async fn add_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(post_id): Path<String>,
    JsonBody(payload): JsonBody<TextRequest>,
) -> AppResult<Json<Post>> {
    services::add_comment(state.store.as_ref(), &post_id, user_id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn remove_comment(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<Post>> {
    services::remove_comment(state.store.as_ref(), &post_id, &comment_id, user_id)
        .await
        .map(Json)
}
