//! User Storage
//! Mission: Securely store and manage user accounts with SQLite

use crate::auth::models::{Role, User};
use crate::auth::password::hash_password;
use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode};
use tracing::{info, warn};
use uuid::Uuid;

/// Distinct failure kinds for user persistence. Conflicts and not-found are
/// domain rules with their own HTTP mappings; everything else is a generic
/// storage failure.
#[derive(Debug)]
pub enum UserStoreError {
    Duplicate(String),
    NotFound,
    Storage(anyhow::Error),
}

impl std::fmt::Display for UserStoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserStoreError::Duplicate(field) => write!(f, "Duplicate value for {field}"),
            UserStoreError::NotFound => write!(f, "User not found"),
            UserStoreError::Storage(e) => write!(f, "User storage error: {e}"),
        }
    }
}

impl std::error::Error for UserStoreError {}

impl From<rusqlite::Error> for UserStoreError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, ref msg) = e {
            if inner.code == ErrorCode::ConstraintViolation {
                let field = match msg.as_deref() {
                    Some(m) if m.contains("username") => "username",
                    Some(m) if m.contains("email") => "email",
                    _ => "unique field",
                };
                return UserStoreError::Duplicate(field.to_string());
            }
        }
        UserStoreError::Storage(e.into())
    }
}

/// Fields applied by an admin update; a missing password keeps the stored hash.
#[derive(Debug)]
pub struct UserUpdate {
    pub username: String,
    pub email: String,
    pub password: Option<String>,
    pub role: Role,
    pub is_active: bool,
}

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
}

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'User',
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL
            )",
            [],
        )?;

        // Create default admin user if none exists
        self.create_default_admin(&conn)?;

        Ok(())
    }

    /// Create default admin user for initial setup
    fn create_default_admin(&self, conn: &Connection) -> Result<()> {
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM users WHERE role = 'Admin'",
                [],
                |row| row.get(0),
            )
            .context("Failed to check for admin users")?;

        if count == 0 {
            let password_hash = hash_password("admin123")?;

            let admin = User {
                id: Uuid::new_v4(),
                username: "admin".to_string(),
                email: "admin@localhost".to_string(),
                password_hash,
                role: Role::Admin,
                is_active: true,
                created_at: Utc::now().to_rfc3339(),
            };

            conn.execute(
                "INSERT INTO users (id, username, email, password_hash, role, is_active, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    admin.id.to_string(),
                    admin.username,
                    admin.email,
                    admin.password_hash,
                    admin.role.as_str(),
                    admin.is_active,
                    admin.created_at,
                ],
            )
            .context("Failed to insert admin user")?;

            info!("🔐 Default admin user created (username: admin, password: admin123)");
            warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
        }

        Ok(())
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        let role_str: String = row.get(4)?;
        Ok(User {
            id: Uuid::parse_str(&row.get::<_, String>(0)?).unwrap(),
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            role: Role::from_str(&role_str).unwrap_or(Role::User),
            is_active: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    /// Get user by username
    pub fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, role, is_active, created_at
             FROM users WHERE username = ?1",
        )?;

        match stmt.query_row(params![username], Self::map_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Get user by id
    pub fn get_user_by_id(&self, user_id: &Uuid) -> Result<Option<User>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, role, is_active, created_at
             FROM users WHERE id = ?1",
        )?;

        match stmt.query_row(params![user_id.to_string()], Self::map_row) {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a new user. Username and email collisions surface as
    /// `UserStoreError::Duplicate`.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<User, UserStoreError> {
        let password_hash = hash_password(password).map_err(UserStoreError::Storage)?;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            role,
            is_active: true,
            created_at: Utc::now().to_rfc3339(),
        };

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash, role, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user.id.to_string(),
                user.username,
                user.email,
                user.password_hash,
                user.role.as_str(),
                user.is_active,
                user.created_at,
            ],
        )?;

        info!("✅ Created user: {} ({})", user.username, user.role.as_str());

        Ok(user)
    }

    /// List all users (admin only)
    pub fn list_users(&self) -> Result<Vec<User>> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare(
            "SELECT id, username, email, password_hash, role, is_active, created_at FROM users",
        )?;

        let users = stmt
            .query_map([], Self::map_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    /// Replace a user's fields (admin only). Not-found is distinct from
    /// storage failure; a None password keeps the existing hash.
    pub fn update_user(&self, user_id: &Uuid, update: UserUpdate) -> Result<User, UserStoreError> {
        let existing = self
            .get_user_by_id(user_id)
            .map_err(UserStoreError::Storage)?
            .ok_or(UserStoreError::NotFound)?;

        let password_hash = match update.password.as_deref() {
            Some(p) => hash_password(p).map_err(UserStoreError::Storage)?,
            None => existing.password_hash,
        };

        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "UPDATE users
             SET username = ?1, email = ?2, password_hash = ?3, role = ?4, is_active = ?5
             WHERE id = ?6",
            params![
                update.username,
                update.email,
                password_hash,
                update.role.as_str(),
                update.is_active,
                user_id.to_string(),
            ],
        )?;

        Ok(User {
            id: *user_id,
            username: update.username,
            email: update.email,
            password_hash,
            role: update.role,
            is_active: update.is_active,
            created_at: existing.created_at,
        })
    }

    /// Delete a user by ID (admin only)
    pub fn delete_user(&self, user_id: &Uuid) -> Result<(), UserStoreError> {
        let conn = Connection::open(&self.db_path)?;

        let rows_affected = conn.execute(
            "DELETE FROM users WHERE id = ?1",
            params![user_id.to_string()],
        )?;

        if rows_affected == 0 {
            return Err(UserStoreError::NotFound);
        }

        info!("🗑️  Deleted user: {}", user_id);
        Ok(())
    }
}
