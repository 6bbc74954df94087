//! Bearer-token authentication.
//!
//! Tokens are opaque 48-character random strings handed to the client once;
//! only their SHA-256 hex digest is stored. Revoking a user's tokens is a
//! plain delete on the tokens table.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use chrono::Utc;
use rand::{distr::Alphanumeric, Rng};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use sha2::{Digest, Sha256};
use std::fmt::Write as _;
use uuid::Uuid;

use crate::common::AppState;
use crate::entity::{tokens, users};
use crate::error::{AppError, AppResult};

const TOKEN_LENGTH: usize = 48;

/// Hash a password with argon2id and a fresh salt.
///
/// # Errors
///
/// Returns `AppError::Internal` if hashing fails.
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {e}")))
}

/// Verify a password against a stored PHC hash string.
/// An unparseable stored hash counts as a mismatch.
#[must_use]
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Generate a fresh plaintext bearer token.
#[must_use]
pub fn mint_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// SHA-256 hex digest of a plaintext token — the only form ever persisted.
#[must_use]
pub fn token_digest(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{byte:02x}");
    }
    out
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
#[must_use]
pub fn parse_bearer(header_value: Option<&str>) -> Option<&str> {
    let value = header_value?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Mint a token for a user, persist its digest, and return the plaintext.
///
/// # Errors
///
/// Returns `AppError::Database` if the token row cannot be inserted.
pub async fn issue_token(
    db: &sea_orm::DatabaseConnection,
    user_id: Uuid,
    name: &str,
) -> AppResult<String> {
    let plaintext = mint_token();

    let token = tokens::ActiveModel {
        id: Set(Uuid::new_v4()),
        user_id: Set(user_id),
        name: Set(name.to_string()),
        token_hash: Set(token_digest(&plaintext)),
        created_at: Set(Some(Utc::now().into())),
    };
    token.insert(db).await?;

    Ok(plaintext)
}

/// The authenticated caller, resolved from the bearer token.
pub struct CurrentUser(pub users::Model);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = parse_bearer(header_value)
            .ok_or_else(|| AppError::Unauthorized("Unauthenticated".to_string()))?;

        let found = tokens::Entity::find()
            .filter(tokens::Column::TokenHash.eq(token_digest(token)))
            .find_also_related(users::Entity)
            .one(&state.db)
            .await?;

        match found {
            Some((_, Some(user))) => Ok(Self(user)),
            _ => Err(AppError::Unauthorized("Unauthenticated".to_string())),
        }
    }
}
