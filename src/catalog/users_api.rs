//! User Administration Endpoints
//! Mission: Admin-only user management over the credential store

use crate::auth::{
    api::AuthState,
    models::{Claims, RegisterRequest, Role, UserResponse},
    user_store::{UserStoreError, UserUpdate},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Admin update payload; omitting `password` keeps the current one.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

fn require_admin(claims: &Claims) -> Result<(), UsersApiError> {
    if claims.role != Role::Admin {
        warn!(
            "User {} attempted an admin operation with role {}",
            claims.username,
            claims.role.as_str()
        );
        return Err(UsersApiError::Forbidden);
    }
    Ok(())
}

fn parse_user_id(raw: &str) -> Result<Uuid, UsersApiError> {
    Uuid::parse_str(raw).map_err(|_| UsersApiError::InvalidUserId)
}

/// List all users - GET /api/users (Admin only)
pub async fn list_users(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<UserResponse>>, UsersApiError> {
    require_admin(&claims)?;

    let users = state.user_store.list_users().map_err(|e| {
        error!("Failed to list users: {e}");
        UsersApiError::InternalError
    })?;

    let response: Vec<UserResponse> = users.iter().map(UserResponse::from_user).collect();
    Ok(Json(response))
}

/// Get one user - GET /api/users/:id (Admin only)
pub async fn get_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<Json<UserResponse>, UsersApiError> {
    require_admin(&claims)?;
    let uuid = parse_user_id(&user_id)?;

    let user = state
        .user_store
        .get_user_by_id(&uuid)
        .map_err(|e| {
            error!("Failed to fetch user {user_id}: {e}");
            UsersApiError::InternalError
        })?
        .ok_or(UsersApiError::NotFound)?;

    Ok(Json(UserResponse::from_user(&user)))
}

/// Create user - POST /api/users (Admin only)
pub async fn create_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), UsersApiError> {
    require_admin(&claims)?;

    let user = state
        .user_store
        .create_user(
            &payload.username,
            &payload.email,
            &payload.password,
            payload.role,
        )
        .map_err(|e| match e {
            UserStoreError::Duplicate(field) => {
                warn!("User create failed: duplicate {field}");
                UsersApiError::Conflict
            }
            other => {
                error!("User create failed: {other}");
                UsersApiError::InternalError
            }
        })?;

    info!("✅ User created by admin {}: {}", claims.username, user.username);

    Ok((StatusCode::CREATED, Json(UserResponse::from_user(&user))))
}

/// Update user - PUT /api/users/:id (Admin only)
pub async fn update_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<StatusCode, UsersApiError> {
    require_admin(&claims)?;
    let uuid = parse_user_id(&user_id)?;

    state
        .user_store
        .update_user(
            &uuid,
            UserUpdate {
                username: payload.username,
                email: payload.email,
                password: payload.password,
                role: payload.role,
                is_active: payload.is_active,
            },
        )
        .map_err(|e| match e {
            UserStoreError::NotFound => {
                warn!("User with id {user_id} not found for update");
                UsersApiError::NotFound
            }
            UserStoreError::Duplicate(_) => UsersApiError::Conflict,
            other => {
                error!("User update failed: {other}");
                UsersApiError::InternalError
            }
        })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Delete user - DELETE /api/users/:id (Admin only)
pub async fn delete_user(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, UsersApiError> {
    require_admin(&claims)?;
    let uuid = parse_user_id(&user_id)?;

    // Don't allow deleting yourself
    if uuid.to_string() == claims.sub {
        return Err(UsersApiError::CannotDeleteSelf);
    }

    state.user_store.delete_user(&uuid).map_err(|e| match e {
        UserStoreError::NotFound => UsersApiError::NotFound,
        other => {
            error!("User delete failed: {other}");
            UsersApiError::InternalError
        }
    })?;

    Ok(StatusCode::NO_CONTENT)
}

/// Users API errors
#[derive(Debug)]
pub enum UsersApiError {
    Forbidden,
    InvalidUserId,
    NotFound,
    Conflict,
    CannotDeleteSelf,
    InternalError,
}

impl IntoResponse for UsersApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            UsersApiError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient permissions"),
            UsersApiError::InvalidUserId => (StatusCode::BAD_REQUEST, "Invalid user ID format"),
            UsersApiError::NotFound => (StatusCode::NOT_FOUND, "User not found"),
            UsersApiError::Conflict => (StatusCode::CONFLICT, "Username or email already exists"),
            UsersApiError::CannotDeleteSelf => {
                (StatusCode::BAD_REQUEST, "Cannot delete your own account")
            }
            UsersApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
