use std::time::Duration;

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use super::claims::{Claims, ClaimsUser};
use crate::{config::JwtConfig, error::AppError, state::AppState};

pub const LEGACY_TOKEN_HEADER: &str = "x-auth-token";

/// Single outcome for every verification failure.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid token")]
pub struct InvalidToken;

/// Signing and verification keys, built once from config.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::from_secs(cfg.ttl_seconds.max(0) as u64),
        }
    }

    pub fn sign(&self, user_id: Uuid) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = Claims {
            user: ClaimsUser { id: user_id },
            iat: now as usize,
            exp: (now + self.ttl.as_secs() as i64) as usize,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    pub fn decode(&self, token: &str) -> Result<Claims, InvalidToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(reason = ?e.kind(), "jwt rejected");
            InvalidToken
        })?;
        Ok(data.claims)
    }

    pub fn verify(&self, token: &str) -> Result<Uuid, InvalidToken> {
        self.decode(token).map(|c| c.user.id)
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        state.jwt.clone()
    }
}

/// Reads the credential from `Authorization: Bearer` or `x-auth-token`.
/// A missing header and a badly formed one are both "no credential".
fn credential(headers: &HeaderMap) -> Option<&str> {
    let raw = match headers.get(AUTHORIZATION) {
        Some(v) => {
            let v = v.to_str().ok()?;
            v.strip_prefix("Bearer ").or_else(|| v.strip_prefix("bearer "))?
        }
        None => headers.get(LEGACY_TOKEN_HEADER)?.to_str().ok()?,
    };
    Some(raw.trim()).filter(|t| !t.is_empty())
}

/// Resolves the acting user from request headers. No I/O.
pub fn authenticate(headers: &HeaderMap, keys: &JwtKeys) -> Result<Uuid, AppError> {
    let token = credential(headers)
        .ok_or(AppError::Unauthorized("No token, authorization denied"))?;
    keys.verify(token).map_err(|_| {
        warn!("invalid or expired token");
        AppError::Unauthorized("Token is not valid")
    })
}

/// Authenticated user id, injected into handlers.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        authenticate(&parts.headers, &keys).map(AuthUser)
    }
}
