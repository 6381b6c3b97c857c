use crate::state::AppState;
use axum::Router;

mod avatar;
mod claims;
pub mod dto;
pub mod handlers;
pub mod jwt;
mod password;
pub mod repo_types;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
