//! Application Configuration
//! Mission: Read all runtime settings once at startup, never from ambient globals

use anyhow::{bail, Result};
use tracing::error;

/// JWT signing configuration. All fields are required; the token issuer
/// refuses to start without them.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

impl JwtConfig {
    /// Validate that no signing material is missing.
    pub fn validate(&self) -> Result<()> {
        if self.secret.trim().is_empty()
            || self.issuer.trim().is_empty()
            || self.audience.trim().is_empty()
        {
            error!("JWT configuration (secret, issuer, or audience) is missing or empty");
            bail!("JWT configuration is not properly set");
        }
        Ok(())
    }
}

/// Process-wide configuration, constructed once in main and injected into
/// the components that need it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub revocation_db_path: String,
    pub jwt: JwtConfig,
    pub port: u16,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let database_path =
            std::env::var("DATABASE_PATH").unwrap_or_else(|_| "./cinema.db".to_string());

        let revocation_db_path = std::env::var("REVOCATION_DB_PATH")
            .unwrap_or_else(|_| "./cinema_revocations.db".to_string());

        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").unwrap_or_default(),
            issuer: std::env::var("JWT_ISSUER").unwrap_or_default(),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_default(),
        };
        jwt.validate()?;

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);

        Ok(Self {
            database_path,
            revocation_db_path,
            jwt,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_complete_jwt_config_validates() {
        let jwt = JwtConfig {
            secret: "test-secret-key-12345".to_string(),
            issuer: "cinema-api".to_string(),
            audience: "cinema-clients".to_string(),
        };
        assert!(jwt.validate().is_ok());
    }

    #[test]
    fn test_missing_jwt_settings_rejected() {
        let missing_secret = JwtConfig {
            secret: String::new(),
            issuer: "cinema-api".to_string(),
            audience: "cinema-clients".to_string(),
        };
        assert!(missing_secret.validate().is_err());

        let blank_issuer = JwtConfig {
            secret: "test-secret-key-12345".to_string(),
            issuer: "   ".to_string(),
            audience: "cinema-clients".to_string(),
        };
        assert!(blank_issuer.validate().is_err());

        let missing_audience = JwtConfig {
            secret: "test-secret-key-12345".to_string(),
            issuer: "cinema-api".to_string(),
            audience: String::new(),
        };
        assert!(missing_audience.validate().is_err());
    }
}
