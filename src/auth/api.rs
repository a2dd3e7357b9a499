//! Authentication API Endpoints
//! Mission: Provide login, registration, and logout endpoints

use crate::auth::{
    jwt::JwtHandler,
    middleware::extract_claims,
    models::{Claims, LoginRequest, RegisterRequest, TokenResponse, UserResponse},
    password::verify_password,
    revocation::RevocationStore,
    user_store::{UserStore, UserStoreError},
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Marker value written for a blacklisted token id
const REVOKED_MARKER: &str = "canceled";

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub user_store: Arc<UserStore>,
    pub jwt_handler: Arc<JwtHandler>,
    pub revocations: Arc<dyn RevocationStore>,
}

impl AuthState {
    pub fn new(
        user_store: Arc<UserStore>,
        jwt_handler: Arc<JwtHandler>,
        revocations: Arc<dyn RevocationStore>,
    ) -> Self {
        Self {
            user_store,
            jwt_handler,
            revocations,
        }
    }
}

/// Login endpoint - POST /api/auth/login
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AuthApiError> {
    info!("🔐 Login attempt: {}", payload.username);

    let user = state
        .user_store
        .get_user_by_username(&payload.username)
        .map_err(|e| {
            error!("User lookup failed during login: {e}");
            AuthApiError::InternalError
        })?;

    let Some(user) = user else {
        warn!(
            "Login attempt failed for non-existent username: {}",
            payload.username
        );
        return Err(AuthApiError::InvalidCredentials);
    };

    if !user.is_active {
        warn!("Login attempt for inactive user: {}", payload.username);
        return Err(AuthApiError::InactiveAccount);
    }

    if !verify_password(&payload.password, &user.password_hash) {
        warn!(
            "Login attempt failed. Invalid password for username: {}",
            payload.username
        );
        return Err(AuthApiError::InvalidCredentials);
    }

    let (token, _expires_in) = state.jwt_handler.generate_token(&user).map_err(|e| {
        error!("Token generation failed: {e}");
        AuthApiError::InternalError
    })?;

    info!("✅ Login successful: {} ({})", user.username, user.role.as_str());

    Ok(Json(TokenResponse { token }))
}

/// Register endpoint - POST /api/auth/register
pub async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<TokenResponse>, AuthApiError> {
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
                warn!("Registration attempt failed: duplicate {field}");
                AuthApiError::Conflict
            }
            other => {
                error!("An unexpected error occurred during user registration: {other}");
                AuthApiError::InternalError
            }
        })?;

    info!("User {} registered successfully", user.username);

    let (token, _expires_in) = state.jwt_handler.generate_token(&user).map_err(|e| {
        error!("Token generation failed for new user: {e}");
        AuthApiError::InternalError
    })?;

    Ok(Json(TokenResponse { token }))
}

/// Blacklist an accepted token's claims until its natural expiry.
///
/// Returns whether a store write happened. The already-expired case is the
/// one intentional no-op success in this module.
pub async fn blacklist_claims(
    claims: &Claims,
    revocations: &dyn RevocationStore,
) -> Result<bool, AuthApiError> {
    if claims.jti.trim().is_empty() {
        warn!("Logout attempt with a token missing JTI claim");
        return Err(AuthApiError::MissingJti);
    }

    // The claim is typed numeric, so an absent exp already failed decoding;
    // a non-positive value can only come from a forged-but-signed token.
    if claims.exp <= 0 {
        warn!(
            "Logout attempt for token JTI {} with non-positive exp claim: {}",
            claims.jti, claims.exp
        );
        return Err(AuthApiError::InvalidExpiry);
    }

    let remaining = claims.exp - Utc::now().timestamp();

    if remaining > 0 {
        revocations
            .put(
                &claims.jti,
                REVOKED_MARKER,
                Duration::from_secs(remaining as u64),
            )
            .await
            .map_err(|e| {
                // Fail closed: skipping the write would leave a logged-out
                // token valid until expiry
                error!("Failed to blacklist token JTI {}: {e}", claims.jti);
                AuthApiError::InternalError
            })?;
        info!(
            "Token with JTI {} blacklisted. Expires in {remaining} seconds",
            claims.jti
        );
        Ok(true)
    } else {
        info!(
            "Token with JTI {} has already expired. No need to blacklist",
            claims.jti
        );
        Ok(false)
    }
}

/// Logout endpoint - POST /api/auth/logout
///
/// Requires an already-accepted token; the gate has run before this handler.
pub async fn logout(
    State(state): State<AuthState>,
    req: Request,
) -> Result<Json<serde_json::Value>, AuthApiError> {
    let claims = extract_claims(&req).ok_or(AuthApiError::Unauthorized)?;

    blacklist_claims(claims, state.revocations.as_ref()).await?;

    Ok(Json(json!({ "message": "Successfully logged out." })))
}

/// Get current user info - GET /api/auth/me
///
/// Built entirely from the JWT claims, no database lookup.
pub async fn get_current_user(req: Request) -> Result<Json<UserResponse>, AuthApiError> {
    let claims = extract_claims(&req).ok_or(AuthApiError::Unauthorized)?;

    Ok(Json(UserResponse {
        id: claims.sub.clone(),
        username: claims.username.clone(),
        email: claims.email.clone(),
        role: claims.role.clone(),
        is_active: true,
        created_at: String::new(),
    }))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    InvalidCredentials,
    InactiveAccount,
    Unauthorized,
    MissingJti,
    InvalidExpiry,
    Conflict,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthApiError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthApiError::InactiveAccount => (StatusCode::UNAUTHORIZED, "User account is inactive"),
            AuthApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthApiError::MissingJti => {
                (StatusCode::BAD_REQUEST, "Token ID (JTI) not found in token")
            }
            AuthApiError::InvalidExpiry => {
                (StatusCode::BAD_REQUEST, "Invalid token expiration claim")
            }
            AuthApiError::Conflict => (StatusCode::CONFLICT, "Username or email already exists"),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}
