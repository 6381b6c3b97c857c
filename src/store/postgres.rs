use async_trait::async_trait;
use sqlx::{types::Json, FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult};
use crate::{
    auth::repo_types::{NewUser, User},
    posts::repo_types::{Comment, Like, Post},
    profiles::repo_types::{Education, Experience, Owner, Profile, Social},
};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[derive(FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    company: Option<String>,
    website: Option<String>,
    location: Option<String>,
    bio: Option<String>,
    status: Option<String>,
    githubusername: Option<String>,
    skills: Vec<String>,
    social: Json<Social>,
    experience: Json<Vec<Experience>>,
    education: Json<Vec<Education>>,
    date: OffsetDateTime,
}

impl From<ProfileRow> for Profile {
    fn from(r: ProfileRow) -> Self {
        Self {
            id: r.id,
            user: r.user_id,
            company: r.company,
            website: r.website,
            location: r.location,
            bio: r.bio,
            status: r.status,
            githubusername: r.githubusername,
            skills: r.skills,
            social: r.social.0,
            experience: r.experience.0,
            education: r.education.0,
            date: r.date,
        }
    }
}

#[derive(FromRow)]
struct PostRow {
    id: Uuid,
    user_id: Uuid,
    text: String,
    name: String,
    avatar: String,
    likes: Json<Vec<Like>>,
    comments: Json<Vec<Comment>>,
    date: OffsetDateTime,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Self {
            id: r.id,
            user: r.user_id,
            text: r.text,
            name: r.name,
            avatar: r.avatar,
            likes: r.likes.0,
            comments: r.comments.0,
            date: r.date,
        }
    }
}

#[derive(FromRow)]
struct ProfileOwnerRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    owner_name: Option<String>,
    owner_avatar: Option<String>,
}

impl ProfileOwnerRow {
    fn into_parts(self) -> (Profile, Option<Owner>) {
        let owner = match (self.owner_name, self.owner_avatar) {
            (Some(name), Some(avatar)) => Some(Owner { name, avatar }),
            _ => None,
        };
        (self.profile.into(), owner)
    }
}

const PROFILE_COLUMNS: &str = "id, user_id, company, website, location, bio, status, \
    githubusername, skills, social, experience, education, date";

const POST_COLUMNS: &str = "id, user_id, text, name, avatar, likes, comments, date";

fn map_unique(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Database(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, avatar, date
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, password_hash, avatar, date
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, email, password_hash, avatar)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, avatar, date
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.avatar)
        .fetch_one(&self.db)
        .await
        .map_err(map_unique)?;
        Ok(user)
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        // profiles and posts go with it via ON DELETE CASCADE
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn find_profile_by_user(&self, user_id: Uuid) -> StoreResult<Option<Profile>> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE user_id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Profile::from))
    }

    async fn list_profiles(&self) -> StoreResult<Vec<(Profile, Option<Owner>)>> {
        let rows = sqlx::query_as::<_, ProfileOwnerRow>(
            r#"
            SELECT p.id, p.user_id, p.company, p.website, p.location, p.bio, p.status,
                   p.githubusername, p.skills, p.social, p.experience, p.education, p.date,
                   u.name AS owner_name, u.avatar AS owner_avatar
            FROM profiles p
            LEFT JOIN users u ON u.id = p.user_id
            ORDER BY p.date ASC
            "#,
        )
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(ProfileOwnerRow::into_parts).collect())
    }

    async fn upsert_profile(&self, p: &Profile) -> StoreResult<Profile> {
        let sql = format!(
            r#"
            INSERT INTO profiles ({PROFILE_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (user_id) DO UPDATE SET
                company = EXCLUDED.company,
                website = EXCLUDED.website,
                location = EXCLUDED.location,
                bio = EXCLUDED.bio,
                status = EXCLUDED.status,
                githubusername = EXCLUDED.githubusername,
                skills = EXCLUDED.skills,
                social = EXCLUDED.social,
                experience = EXCLUDED.experience,
                education = EXCLUDED.education
            RETURNING {PROFILE_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(p.id)
            .bind(p.user)
            .bind(&p.company)
            .bind(&p.website)
            .bind(&p.location)
            .bind(&p.bio)
            .bind(&p.status)
            .bind(&p.githubusername)
            .bind(&p.skills)
            .bind(Json(&p.social))
            .bind(Json(&p.experience))
            .bind(Json(&p.education))
            .bind(p.date)
            .fetch_one(&self.db)
            .await?;
        Ok(row.into())
    }

    async fn find_post_by_id(&self, id: Uuid) -> StoreResult<Option<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1");
        let row = sqlx::query_as::<_, PostRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.map(Post::from))
    }

    async fn list_posts_by_recency(&self) -> StoreResult<Vec<Post>> {
        let sql = format!("SELECT {POST_COLUMNS} FROM posts ORDER BY date DESC");
        let rows = sqlx::query_as::<_, PostRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Post::from).collect())
    }

    async fn create_post(&self, p: &Post) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO posts (id, user_id, text, name, avatar, likes, comments, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(p.id)
        .bind(p.user)
        .bind(&p.text)
        .bind(&p.name)
        .bind(&p.avatar)
        .bind(Json(&p.likes))
        .bind(Json(&p.comments))
        .bind(p.date)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn save_post(&self, p: &Post) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE posts
               SET text = $2, likes = $3, comments = $4
             WHERE id = $1
            "#,
        )
        .bind(p.id)
        .bind(&p.text)
        .bind(Json(&p.likes))
        .bind(Json(&p.comments))
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound("Post not found!"));
        }
        Ok(())
    }

    async fn delete_post(&self, id: Uuid) -> StoreResult<()> {
        sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}
