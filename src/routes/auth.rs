use axum::{extract::State, Json};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{self, CurrentUser};
use crate::common::AppState;
use crate::entity::{tokens, users};
use crate::error::{AppError, AppResult};
use crate::routes::MessageResponse;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

impl From<users::Model> for UserResponse {
    fn from(user: users::Model) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    /// Plaintext bearer token; shown only once.
    pub token: String,
}

fn validate_registration(req: &RegisterRequest) -> AppResult<()> {
    if req.name.trim().is_empty() || req.name.chars().count() > 255 {
        return Err(AppError::BadRequest(
            "Name is required and must be at most 255 characters".to_string(),
        ));
    }
    if !req.email.contains('@') {
        return Err(AppError::BadRequest(
            "A valid email address is required".to_string(),
        ));
    }
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }
    if req.password != req.password_confirmation {
        return Err(AppError::BadRequest(
            "Password confirmation does not match".to_string(),
        ));
    }
    Ok(())
}

/// Create an account and issue a bearer token
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Account created", body = AuthResponse),
        (status = 400, description = "Validation failed"),
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> AppResult<Json<AuthResponse>> {
    validate_registration(&req)?;

    let existing = users::Entity::find()
        .filter(users::Column::Email.eq(req.email.clone()))
        .one(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "Email is already registered".to_string(),
        ));
    }

    let user = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(req.name.clone()),
        email: Set(req.email.clone()),
        password_hash: Set(auth::hash_password(&req.password)?),
        created_at: Set(Some(Utc::now().into())),
    };
    let user = user.insert(&state.db).await?;

    tracing::info!(email = %user.email, "Registered new user");

    let token = auth::issue_token(&state.db, user.id, &user.name).await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// Authenticate and issue a bearer token
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let user = users::Entity::find()
        .filter(users::Column::Email.eq(req.email.clone()))
        .one(&state.db)
        .await?;

    // One rejection shape for unknown email and bad password
    let Some(user) = user else {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    };
    if !auth::verify_password(&req.password, &user.password_hash) {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = auth::issue_token(&state.db, user.id, &user.name).await?;

    Ok(Json(AuthResponse {
        user: user.into(),
        token,
    }))
}

/// Revoke all of the caller's tokens
#[utoipa::path(
    post,
    path = "/api/logout",
    responses(
        (status = 200, description = "Logged out", body = MessageResponse),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> AppResult<Json<MessageResponse>> {
    tokens::Entity::delete_many()
        .filter(tokens::Column::UserId.eq(user.id))
        .exec(&state.db)
        .await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// The authenticated caller
#[utoipa::path(
    get,
    path = "/api/user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthenticated"),
    ),
    security(("bearer_token" = [])),
    tag = "auth"
)]
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(user.into())
}
