use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use super::{
    dto::TextRequest,
    repo_types::{Comment, Like, Post},
};
use crate::{
    error::{AppError, AppResult},
    store::{parse_id, Store},
    validation::Violations,
};

const POST_NOT_FOUND: &str = "Post not found!";

fn require_text(req: TextRequest) -> AppResult<String> {
    let mut v = Violations::new();
    v.require(req.text.as_deref(), "text", "Text is required!");
    v.finish()?;
    Ok(req.text.unwrap_or_default())
}

// -- document operations --

/// Most recent like first. A user can like a post only once.
pub fn like(post: &mut Post, user: Uuid) -> AppResult<()> {
    if post.likes.iter().any(|l| l.user == user) {
        return Err(AppError::AlreadyLiked);
    }
    post.likes.insert(0, Like { user });
    Ok(())
}

pub fn unlike(post: &mut Post, user: Uuid) -> AppResult<()> {
    let index = post
        .likes
        .iter()
        .position(|l| l.user == user)
        .ok_or(AppError::NotLiked)?;
    post.likes.remove(index);
    Ok(())
}

/// Only the comment's author may remove it, whoever owns the post.
pub fn remove_comment_in(post: &mut Post, comment_id: Uuid, user: Uuid) -> AppResult<()> {
    let index = post
        .comments
        .iter()
        .position(|c| c.id == comment_id)
        .ok_or(AppError::NotFound("This comment is not exists!"))?;
    if post.comments[index].user != user {
        return Err(AppError::Forbidden);
    }
    post.comments.remove(index);
    Ok(())
}

// -- flows --

async fn load(store: &dyn Store, raw_post_id: &str) -> AppResult<Post> {
    let id = parse_id(raw_post_id, POST_NOT_FOUND)?;
    store
        .find_post_by_id(id)
        .await?
        .ok_or(AppError::NotFound(POST_NOT_FOUND))
}

pub async fn create_post(store: &dyn Store, user_id: Uuid, req: TextRequest) -> AppResult<Post> {
    let text = require_text(req)?;
    let author = store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found!"))?;

    let post = Post {
        id: Uuid::new_v4(),
        user: user_id,
        text,
        name: author.name,
        avatar: author.avatar,
        likes: Vec::new(),
        comments: Vec::new(),
        date: OffsetDateTime::now_utc(),
    };
    store.create_post(&post).await?;
    info!(post_id = %post.id, %user_id, "post created");
    Ok(post)
}

pub async fn list_posts(store: &dyn Store) -> AppResult<Vec<Post>> {
    Ok(store.list_posts_by_recency().await?)
}

pub async fn get_post(store: &dyn Store, raw_post_id: &str) -> AppResult<Post> {
    load(store, raw_post_id).await
}

pub async fn delete_post(store: &dyn Store, raw_post_id: &str, user_id: Uuid) -> AppResult<()> {
    let post = load(store, raw_post_id).await?;
    if post.user != user_id {
        return Err(AppError::Forbidden);
    }
    store.delete_post(post.id).await?;
    info!(post_id = %post.id, %user_id, "post removed");
    Ok(())
}

pub async fn like_post(store: &dyn Store, raw_post_id: &str, user_id: Uuid) -> AppResult<Vec<Like>> {
    let mut post = load(store, raw_post_id).await?;
    like(&mut post, user_id)?;
    store.save_post(&post).await?;
    Ok(post.likes)
}

pub async fn unlike_post(store: &dyn Store, raw_post_id: &str, user_id: Uuid) -> AppResult<Vec<Like>> {
    let mut post = load(store, raw_post_id).await?;
    unlike(&mut post, user_id)?;
    store.save_post(&post).await?;
    Ok(post.likes)
}

/// Appends; comments read oldest first.
pub async fn add_comment(
    store: &dyn Store,
    raw_post_id: &str,
    user_id: Uuid,
    req: TextRequest,
) -> AppResult<Post> {
    let text = require_text(req)?;
    let author = store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found!"))?;
    let mut post = load(store, raw_post_id).await?;

    post.comments.push(Comment {
        id: Uuid::new_v4(),
        user: user_id,
        text,
        avatar: author.avatar,
        date: OffsetDateTime::now_utc(),
    });
    store.save_post(&post).await?;
    Ok(post)
}

pub async fn remove_comment(
    store: &dyn Store,
    raw_post_id: &str,
    raw_comment_id: &str,
    user_id: Uuid,
) -> AppResult<Post> {
    let mut post = load(store, raw_post_id).await?;
    let comment_id = parse_id(raw_comment_id, "This comment is not exists!")?;
    remove_comment_in(&mut post, comment_id, user_id)?;
    store.save_post(&post).await?;
    Ok(post)
}
