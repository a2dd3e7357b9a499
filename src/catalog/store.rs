//! Catalog Storage
//! Mission: Persist directors and movies with SQLite

use crate::catalog::models::{Director, Movie};
use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{params, Connection, ErrorCode};
use tracing::{info, warn};

/// Distinct failure kinds for catalog persistence
#[derive(Debug)]
pub enum CatalogError {
    NotFound,
    InvalidDirector(i64),
    Storage(anyhow::Error),
}

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogError::NotFound => write!(f, "Entity not found"),
            CatalogError::InvalidDirector(id) => {
                write!(f, "Director with id {id} does not exist")
            }
            CatalogError::Storage(e) => write!(f, "Catalog storage error: {e}"),
        }
    }
}

impl std::error::Error for CatalogError {}

impl From<rusqlite::Error> for CatalogError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(inner, _) = e {
            if inner.code == ErrorCode::ConstraintViolation {
                // Only movies.director_id carries a foreign key
                return CatalogError::InvalidDirector(0);
            }
        }
        CatalogError::Storage(e.into())
    }
}

/// Catalog storage with SQLite backend
pub struct CatalogStore {
    db_path: String,
}

impl CatalogStore {
    /// Create a new catalog store and initialize database
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.db_path)?;
        // SQLite leaves FK enforcement off per connection
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }

    fn init_db(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS directors (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                surname TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS movies (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                description TEXT,
                release_date INTEGER NOT NULL,
                genre TEXT,
                director_id INTEGER REFERENCES directors(id) ON DELETE SET NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn map_director(row: &rusqlite::Row<'_>) -> rusqlite::Result<Director> {
        Ok(Director {
            id: row.get(0)?,
            name: row.get(1)?,
            surname: row.get(2)?,
        })
    }

    fn map_movie(row: &rusqlite::Row<'_>) -> rusqlite::Result<Movie> {
        let ts: i64 = row.get(3)?;
        Ok(Movie {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            release_date: Utc.timestamp_opt(ts, 0).single().unwrap(),
            genre: row.get(4)?,
            director_id: row.get(5)?,
        })
    }

    fn director_exists(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM directors WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // ---- directors ----

    pub fn create_director(&self, name: &str, surname: &str) -> Result<Director, CatalogError> {
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO directors (name, surname) VALUES (?1, ?2)",
            params![name, surname],
        )?;
        let id = conn.last_insert_rowid();

        info!("✅ Created director {id}: {name} {surname}");

        Ok(Director {
            id,
            name: name.to_string(),
            surname: surname.to_string(),
        })
    }

    pub fn list_directors(&self) -> Result<Vec<Director>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT id, name, surname FROM directors")?;
        let directors = stmt
            .query_map([], Self::map_director)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(directors)
    }

    pub fn get_director(&self, id: i64) -> Result<Option<Director>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare("SELECT id, name, surname FROM directors WHERE id = ?1")?;
        match stmt.query_row(params![id], Self::map_director) {
            Ok(director) => Ok(Some(director)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn update_director(
        &self,
        id: i64,
        name: &str,
        surname: &str,
    ) -> Result<Director, CatalogError> {
        let conn = self.open()?;
        let rows_affected = conn.execute(
            "UPDATE directors SET name = ?1, surname = ?2 WHERE id = ?3",
            params![name, surname, id],
        )?;

        if rows_affected == 0 {
            warn!("Director with id {id} not found for update");
            return Err(CatalogError::NotFound);
        }

        Ok(Director {
            id,
            name: name.to_string(),
            surname: surname.to_string(),
        })
    }

    /// Delete a director. Movies keep their rows; their `director_id` is
    /// cleared by the foreign key's ON DELETE SET NULL.
    pub fn delete_director(&self, id: i64) -> Result<(), CatalogError> {
        let conn = self.open()?;
        let rows_affected = conn.execute("DELETE FROM directors WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            warn!("Director with id {id} not found for deletion");
            return Err(CatalogError::NotFound);
        }

        info!("🗑️  Deleted director: {id}");
        Ok(())
    }

    // ---- movies ----

    pub fn create_movie(
        &self,
        title: &str,
        description: Option<&str>,
        release_date: DateTime<Utc>,
        genre: Option<&str>,
        director_id: Option<i64>,
    ) -> Result<Movie, CatalogError> {
        let conn = self.open()?;

        // Checked up front so no row is written on a dangling reference
        if let Some(did) = director_id {
            if !Self::director_exists(&conn, did)? {
                warn!("Movie create rejected: director {did} does not exist");
                return Err(CatalogError::InvalidDirector(did));
            }
        }

        conn.execute(
            "INSERT INTO movies (title, description, release_date, genre, director_id)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                title,
                description,
                release_date.timestamp(),
                genre,
                director_id
            ],
        )?;
        let id = conn.last_insert_rowid();

        info!("✅ Created movie {id}: {title}");

        Ok(Movie {
            id,
            title: title.to_string(),
            description: description.map(|s| s.to_string()),
            release_date,
            genre: genre.map(|s| s.to_string()),
            director_id,
        })
    }

    pub fn list_movies(&self) -> Result<Vec<Movie>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, description, release_date, genre, director_id FROM movies",
        )?;
        let movies = stmt
            .query_map([], Self::map_movie)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(movies)
    }

    pub fn get_movie(&self, id: i64) -> Result<Option<Movie>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, description, release_date, genre, director_id
             FROM movies WHERE id = ?1",
        )?;
        match stmt.query_row(params![id], Self::map_movie) {
            Ok(movie) => Ok(Some(movie)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn update_movie(
        &self,
        id: i64,
        title: &str,
        description: Option<&str>,
        release_date: DateTime<Utc>,
        genre: Option<&str>,
        director_id: Option<i64>,
    ) -> Result<Movie, CatalogError> {
        let conn = self.open()?;

        if let Some(did) = director_id {
            if !Self::director_exists(&conn, did)? {
                warn!("Movie update rejected: director {did} does not exist");
                return Err(CatalogError::InvalidDirector(did));
            }
        }

        let rows_affected = conn.execute(
            "UPDATE movies
             SET title = ?1, description = ?2, release_date = ?3, genre = ?4, director_id = ?5
             WHERE id = ?6",
            params![
                title,
                description,
                release_date.timestamp(),
                genre,
                director_id,
                id
            ],
        )?;

        if rows_affected == 0 {
            warn!("Movie with id {id} not found for update");
            return Err(CatalogError::NotFound);
        }

        Ok(Movie {
            id,
            title: title.to_string(),
            description: description.map(|s| s.to_string()),
            release_date,
            genre: genre.map(|s| s.to_string()),
            director_id,
        })
    }

    pub fn delete_movie(&self, id: i64) -> Result<(), CatalogError> {
        let conn = self.open()?;
        let rows_affected = conn.execute("DELETE FROM movies WHERE id = ?1", params![id])?;

        if rows_affected == 0 {
            warn!("Movie with id {id} not found for deletion");
            return Err(CatalogError::NotFound);
        }

        info!("🗑️  Deleted movie: {id}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn create_test_store() -> (CatalogStore, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let db_path = temp_file.path().to_str().unwrap();
        let store = CatalogStore::new(db_path).unwrap();
        (store, temp_file)
    }

    fn sample_date() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(1995, 12, 15, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_director_crud() {
        let (store, _temp) = create_test_store();

        let director = store.create_director("Michael", "Mann").unwrap();
        assert!(director.id > 0);

        let fetched = store.get_director(director.id).unwrap().unwrap();
        assert_eq!(fetched.name, "Michael");

        store
            .update_director(director.id, "Michael", "Mann Jr.")
            .unwrap();
        let updated = store.get_director(director.id).unwrap().unwrap();
        assert_eq!(updated.surname, "Mann Jr.");

        assert_eq!(store.list_directors().unwrap().len(), 1);

        store.delete_director(director.id).unwrap();
        assert!(store.get_director(director.id).unwrap().is_none());
    }

    #[test]
    fn test_update_missing_director_is_not_found() {
        let (store, _temp) = create_test_store();
        let result = store.update_director(999, "Nobody", "Nowhere");
        assert!(matches!(result, Err(CatalogError::NotFound)));
    }

    #[test]
    fn test_movie_crud_roundtrip() {
        let (store, _temp) = create_test_store();

        let director = store.create_director("Michael", "Mann").unwrap();
        let movie = store
            .create_movie(
                "Heat",
                Some("Cat and mouse in LA"),
                sample_date(),
                Some("Crime"),
                Some(director.id),
            )
            .unwrap();

        let fetched = store.get_movie(movie.id).unwrap().unwrap();
        assert_eq!(fetched.title, "Heat");
        assert_eq!(fetched.release_date, sample_date());
        assert_eq!(fetched.director_id, Some(director.id));

        store
            .update_movie(
                movie.id,
                "Heat",
                Some("Cat and mouse in LA"),
                sample_date(),
                Some("Thriller"),
                Some(director.id),
            )
            .unwrap();
        assert_eq!(
            store.get_movie(movie.id).unwrap().unwrap().genre.as_deref(),
            Some("Thriller")
        );

        store.delete_movie(movie.id).unwrap();
        assert!(store.get_movie(movie.id).unwrap().is_none());
    }

    #[test]
    fn test_movie_with_unknown_director_rejected() {
        let (store, _temp) = create_test_store();

        let result = store.create_movie("Heat", None, sample_date(), None, Some(42));
        assert!(matches!(result, Err(CatalogError::InvalidDirector(42))));

        // No row was inserted
        assert!(store.list_movies().unwrap().is_empty());
    }

    #[test]
    fn test_director_delete_clears_movie_reference() {
        let (store, _temp) = create_test_store();

        let director = store.create_director("Michael", "Mann").unwrap();
        let movie = store
            .create_movie("Heat", None, sample_date(), None, Some(director.id))
            .unwrap();

        store.delete_director(director.id).unwrap();

        let orphaned = store.get_movie(movie.id).unwrap().unwrap();
        assert_eq!(orphaned.director_id, None);
    }

    #[test]
    fn test_delete_missing_movie_is_not_found() {
        let (store, _temp) = create_test_store();
        assert!(matches!(
            store.delete_movie(123),
            Err(CatalogError::NotFound)
        ));
    }
}
