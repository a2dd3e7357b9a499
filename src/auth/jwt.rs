//! JWT Token Handler
//! Mission: Generate and validate JWT tokens securely

use crate::auth::models::{Claims, User};
use crate::config::JwtConfig;
use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use tracing::debug;
use uuid::Uuid;

/// JWT Handler for token operations
pub struct JwtHandler {
    config: JwtConfig,
    expiration_hours: i64,
}

impl JwtHandler {
    /// Create a new JWT handler. Missing signing material is a configuration
    /// error, not something to discover on the first login.
    pub fn new(config: JwtConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            expiration_hours: 1, // 1-hour tokens
        })
    }

    /// Generate a JWT token for a user
    ///
    /// Every call mints a fresh `jti`, so repeated logins by the same user
    /// produce independently revocable tokens.
    pub fn generate_token(&self, user: &User) -> Result<(String, i64)> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(chrono::Duration::hours(self.expiration_hours))
            .context("Invalid timestamp")?
            .timestamp();

        let expires_in = self.expiration_hours * 3600;

        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: expiration,
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        debug!(
            "Generating JWT for user {} ({}), expires in {}h",
            user.username, user.id, self.expiration_hours
        );

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.config.secret.as_bytes()),
        )
        .context("Failed to generate JWT")?;

        Ok((token, expires_in))
    }

    /// Validate a JWT token and extract claims
    ///
    /// Checks signature, issuer, audience, and lifetime with zero leeway.
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_audience(&[&self.config.audience]);

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.config.secret.as_bytes()),
            &validation,
        )
        .context("Invalid or expired token")?;

        debug!("Validated JWT for user {}", decoded.claims.username);

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Role;

    fn test_config() -> JwtConfig {
        JwtConfig {
            secret: "test-secret-key-12345".to_string(),
            issuer: "cinema-api".to_string(),
            audience: "cinema-clients".to_string(),
        }
    }

    fn create_test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            email: "testuser@example.com".to_string(),
            password_hash: "hash".to_string(),
            role: Role::User,
            is_active: true,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let handler = JwtHandler::new(test_config()).unwrap();
        let user = create_test_user();

        // Generate token
        let (token, expires_in) = handler.generate_token(&user).unwrap();
        assert!(!token.is_empty());
        assert_eq!(expires_in, 3600); // 1 hour in seconds

        // Compact three-part wire format
        assert_eq!(token.split('.').count(), 3);

        // Validate token
        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.username, user.username);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, user.role);
        assert_eq!(claims.iss, "cinema-api");
        assert_eq!(claims.aud, "cinema-clients");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_jti_unique_across_issues() {
        let handler = JwtHandler::new(test_config()).unwrap();
        let user = create_test_user();

        let (token1, _) = handler.generate_token(&user).unwrap();
        let (token2, _) = handler.generate_token(&user).unwrap();

        let jti1 = handler.validate_token(&token1).unwrap().jti;
        let jti2 = handler.validate_token(&token2).unwrap().jti;

        assert!(!jti1.is_empty());
        assert_ne!(jti1, jti2);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let handler = JwtHandler::new(test_config()).unwrap();

        let result = handler.validate_token("invalid.token.here");
        assert!(result.is_err());
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = JwtHandler::new(test_config()).unwrap();
        let handler2 = JwtHandler::new(JwtConfig {
            secret: "another-secret-entirely".to_string(),
            ..test_config()
        })
        .unwrap();
        let user = create_test_user();

        let (token, _) = handler1.generate_token(&user).unwrap();

        let result = handler2.validate_token(&token);
        assert!(result.is_err());
    }

    #[test]
    fn test_wrong_issuer_or_audience_rejected() {
        let issuer_a = JwtHandler::new(test_config()).unwrap();
        let issuer_b = JwtHandler::new(JwtConfig {
            issuer: "someone-else".to_string(),
            ..test_config()
        })
        .unwrap();
        let wrong_audience = JwtHandler::new(JwtConfig {
            audience: "other-clients".to_string(),
            ..test_config()
        })
        .unwrap();
        let user = create_test_user();

        // Same secret, so the signature is valid either way
        let (token, _) = issuer_a.generate_token(&user).unwrap();

        assert!(issuer_b.validate_token(&token).is_err());
        assert!(wrong_audience.validate_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let handler = JwtHandler::new(test_config()).unwrap();
        let user = create_test_user();

        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role.clone(),
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp() - 7200,
            exp: now.timestamp() - 3600, // expired an hour ago
            iss: "cinema-api".to_string(),
            aud: "cinema-clients".to_string(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-secret-key-12345".as_bytes()),
        )
        .unwrap();

        assert!(handler.validate_token(&token).is_err());
    }

    #[test]
    fn test_missing_config_is_fatal() {
        let result = JwtHandler::new(JwtConfig {
            secret: String::new(),
            issuer: "cinema-api".to_string(),
            audience: "cinema-clients".to_string(),
        });
        assert!(result.is_err());
    }
}
