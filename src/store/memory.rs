//! In-memory `Store` used by tests.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::{
    auth::repo_types::{NewUser, User},
    posts::repo_types::Post,
    profiles::repo_types::{Owner, Profile},
};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    profiles: RwLock<HashMap<Uuid, Profile>>, // keyed by owner
    posts: RwLock<Vec<Post>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create_user(&self, new: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new.email) {
            return Err(StoreError::Duplicate);
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new.name,
            email: new.email,
            password_hash: new.password_hash,
            avatar: new.avatar,
            date: OffsetDateTime::now_utc(),
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.users.write().await.remove(&id);
        self.profiles.write().await.remove(&id);
        self.posts.write().await.retain(|p| p.user != id);
        Ok(())
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn list_profiles(&self) -> StoreResult<Vec<(Profile, Option<Owner>)>> {
        let users = self.users.read().await;
        let mut all: Vec<Profile> = self.profiles.read().await.values().cloned().collect();
        all.sort_by_key(|p| p.date);
        Ok(all
            .into_iter()
            .map(|p| {
                let owner = users.get(&p.user).map(|u| Owner {
                    name: u.name.clone(),
                    avatar: u.avatar.clone(),
                });
                (p, owner)
            })
            .collect())
    }

    async fn upsert_profile(&self, profile: &Profile) -> StoreResult<Profile> {
        let mut profiles = self.profiles.write().await;
        let stored = match profiles.get(&profile.user) {
            // keep the original identity and creation date on update
            Some(existing) => Profile {
                id: existing.id,
                date: existing.date,
                ..profile.clone()
            },
            None => profile.clone(),
        };
        profiles.insert(stored.user, stored.clone());
        Ok(stored)
    }

    async fn find_post_by_id(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let posts = self.posts.read().await;
        Ok(posts.iter().find(|p| p.id == id).cloned())
    }

    async fn list_posts_by_recency(&self) -> StoreResult<Vec<Post>> {
        let mut all = self.posts.read().await.clone();
        all.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(all)
    }

    async fn create_post(&self, post: &Post) -> StoreResult<()> {
        self.posts.write().await.push(post.clone());
        Ok(())
    }

    async fn save_post(&self, post: &Post) -> StoreResult<()> {
        let mut posts = self.posts.write().await;
        let slot = posts
            .iter_mut()
            .find(|p| p.id == post.id)
            .ok_or(StoreError::NotFound("Post not found!"))?;
        *slot = post.clone();
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        self.posts.write().await.retain(|p| p.id != id);
        Ok(())
    }
}
