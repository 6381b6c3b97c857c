use tracing::{info, warn};
use uuid::Uuid;

use super::{
    avatar::gravatar_url,
    dto::{LoginRequest, PublicUser, RegisterRequest, RegisterResponse, TokenResponse},
    jwt::JwtKeys,
    password::{hash_password, verify_password},
    repo_types::NewUser,
};
use crate::{
    error::{AppError, AppResult},
    store::Store,
    validation::{is_valid_email, normalize_email, Violations},
};

pub const MIN_PASSWORD_LEN: usize = 6;

pub async fn register(
    store: &dyn Store,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> AppResult<RegisterResponse> {
    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();
    let password = req.password.unwrap_or_default();

    let mut v = Violations::new();
    v.require(req.name.as_deref(), "name", "Name is required!");
    v.check(is_valid_email(&email), "email", "Please include a valid email!");
    v.check(
        password.chars().count() >= MIN_PASSWORD_LEN,
        "password",
        "Password need to be at least 6 characters!",
    );
    v.finish()?;

    if store.find_user_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("User already exists!"));
    }

    let user = store
        .create_user(NewUser {
            name: req.name.unwrap_or_default(),
            avatar: gravatar_url(&email),
            password_hash: hash_password(&password)?,
            email,
        })
        .await?;

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user registered");
    Ok(RegisterResponse {
        token,
        user: user.into(),
    })
}

pub async fn login(store: &dyn Store, keys: &JwtKeys, req: LoginRequest) -> AppResult<TokenResponse> {
    let email = req.email.as_deref().map(normalize_email).unwrap_or_default();

    let mut v = Violations::new();
    v.check(is_valid_email(&email), "email", "Please include a valid email!");
    v.check(req.password.is_some(), "password", "Password is required!");
    v.finish()?;
    let password = req.password.unwrap_or_default();

    let Some(user) = store.find_user_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&password, &user.password_hash)? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = keys.sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok(TokenResponse { token })
}

pub async fn current_user(store: &dyn Store, user_id: Uuid) -> AppResult<PublicUser> {
    store
        .find_user_by_id(user_id)
        .await?
        .map(PublicUser::from)
        .ok_or(AppError::NotFound("User not found!"))
}
