//! Persistence adapter.
//!
//! Every document is read and written whole; concurrent read-modify-write
//! sequences on the same post or profile are last-writer-wins.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    posts::repo_types::Post,
    profiles::repo_types::{Owner, Profile},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The identifier is not a valid id; distinct from a well-formed id that matches nothing.
    #[error("malformed identifier {raw:?}")]
    MalformedId {
        raw: String,
        not_found: &'static str,
    },

    /// A write targeted a row that no longer exists.
    #[error("{0}")]
    NotFound(&'static str),

    #[error("duplicate key")]
    Duplicate,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Parses a path identifier. `not_found` is the message shown if the id is malformed.
pub fn parse_id(raw: &str, not_found: &'static str) -> StoreResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| StoreError::MalformedId {
        raw: raw.to_string(),
        not_found,
    })
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;
    /// Removes the user together with their profile and posts.
    async fn delete_user(&self, id: Uuid) -> StoreResult<()>;

    async fn find_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>>;
    /// Every profile joined with its owner's display fields, oldest first.
    async fn list_profiles(&self) -> StoreResult<Vec<(Profile, Option<Owner>)>>;
    /// Inserts the profile, or replaces the existing one for the same user.
    async fn upsert_profile(&self, profile: &Profile) -> StoreResult<Profile>;

    async fn find_post_by_id(&self, id: Uuid) -> StoreResult<Option<Post>>;
    /// Newest first.
    async fn list_posts_by_recency(&self) -> StoreResult<Vec<Post>>;
    async fn create_post(&self, post: &Post) -> StoreResult<()>;
    /// Fails with `NotFound` if the post was deleted since it was loaded.
    async fn save_post(&self, post: &Post) -> StoreResult<()>;
    async fn delete_post(&self, id: Uuid) -> StoreResult<()>;
}
