//! Authentication Middleware
//! Mission: Protect API endpoints with JWT validation and blacklist checks

use crate::auth::{jwt::JwtHandler, models::Claims, revocation::RevocationStore};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// The authentication gate: token validation plus revocation lookup.
///
/// Kept as one unit of state so every protected route runs the same checks
/// in the same order.
#[derive(Clone)]
pub struct AuthGate {
    pub jwt_handler: Arc<JwtHandler>,
    pub revocations: Arc<dyn RevocationStore>,
}

impl AuthGate {
    pub fn new(jwt_handler: Arc<JwtHandler>, revocations: Arc<dyn RevocationStore>) -> Self {
        Self {
            jwt_handler,
            revocations,
        }
    }

    /// Run the full gate for one presented token.
    ///
    /// Order matters: cryptographic validation first, then the `jti` claim
    /// must be present (a token that cannot be revoked is never acceptable),
    /// then the blacklist lookup. An unreachable revocation store rejects
    /// the token (fail-closed).
    pub async fn authenticate(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self
            .jwt_handler
            .validate_token(token)
            .map_err(|_| AuthError::InvalidToken)?;

        if claims.jti.trim().is_empty() {
            warn!(
                "Token for user {} has no JTI claim, rejecting",
                claims.username
            );
            return Err(AuthError::MissingJti);
        }

        match self.revocations.get(&claims.jti).await {
            Ok(Some(marker)) => {
                warn!(
                    "Access denied for blacklisted token with JTI {}: marked '{}'",
                    claims.jti, marker
                );
                Err(AuthError::TokenRevoked)
            }
            Ok(None) => {
                debug!("Token with JTI {} passed blacklist check", claims.jti);
                Ok(claims)
            }
            Err(e) => {
                error!("Revocation store unreachable during validation: {e}");
                Err(AuthError::StoreUnavailable)
            }
        }
    }
}

/// Auth middleware that validates JWT tokens and consults the blacklist
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string())
        .ok_or(AuthError::MissingToken)?;

    let claims = gate.authenticate(&token).await?;

    // Add claims to request extensions so handlers can access them
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Extract claims from request (use after auth middleware)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

/// Auth error types
#[derive(Debug)]
pub enum AuthError {
    MissingToken,
    InvalidToken,
    MissingJti,
    TokenRevoked,
    StoreUnavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing authorization token"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid or expired token"),
            AuthError::MissingJti => (StatusCode::UNAUTHORIZED, "Token has no usable token id"),
            AuthError::TokenRevoked => (StatusCode::UNAUTHORIZED, "This token has been revoked"),
            AuthError::StoreUnavailable => {
                (StatusCode::UNAUTHORIZED, "Token could not be verified")
            }
        };

        (status, message).into_response()
    }
}
