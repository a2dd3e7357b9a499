//! Catalog API Endpoints
//! Mission: REST CRUD for directors and movies

use crate::catalog::{
    models::{Director, DirectorPayload, Movie, MoviePayload},
    store::{CatalogError, CatalogStore},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::error;

/// Catalog API errors
#[derive(Debug)]
pub enum CatalogApiError {
    InvalidId,
    IdSetOnCreate,
    IdMismatch,
    UnknownDirector,
    NotFound,
    InternalError,
}

impl From<CatalogError> for CatalogApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound => CatalogApiError::NotFound,
            CatalogError::InvalidDirector(_) => CatalogApiError::UnknownDirector,
            CatalogError::Storage(err) => {
                error!("Catalog storage failure: {err}");
                CatalogApiError::InternalError
            }
        }
    }
}

impl IntoResponse for CatalogApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            CatalogApiError::InvalidId => (StatusCode::BAD_REQUEST, "Invalid id"),
            CatalogApiError::IdSetOnCreate => (
                StatusCode::BAD_REQUEST,
                "Id should not be set when creating a new entity",
            ),
            CatalogApiError::IdMismatch => (
                StatusCode::BAD_REQUEST,
                "The id in the URL does not match the id in the request body",
            ),
            CatalogApiError::UnknownDirector => {
                (StatusCode::BAD_REQUEST, "Referenced director does not exist")
            }
            CatalogApiError::NotFound => (StatusCode::NOT_FOUND, "Entity not found"),
            CatalogApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, message).into_response()
    }
}

fn internal(e: anyhow::Error) -> CatalogApiError {
    error!("Catalog storage failure: {e}");
    CatalogApiError::InternalError
}

// ---- directors ----

/// GET /api/directors
pub async fn list_directors(
    State(store): State<Arc<CatalogStore>>,
) -> Result<Json<Vec<Director>>, CatalogApiError> {
    let directors = store.list_directors().map_err(internal)?;
    Ok(Json(directors))
}

/// GET /api/directors/:id
pub async fn get_director(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<i64>,
) -> Result<Json<Director>, CatalogApiError> {
    if id <= 0 {
        return Err(CatalogApiError::InvalidId);
    }
    let director = store
        .get_director(id)
        .map_err(internal)?
        .ok_or(CatalogApiError::NotFound)?;
    Ok(Json(director))
}

/// POST /api/directors
pub async fn create_director(
    State(store): State<Arc<CatalogStore>>,
    Json(payload): Json<DirectorPayload>,
) -> Result<(StatusCode, Json<Director>), CatalogApiError> {
    if payload.id != 0 {
        return Err(CatalogApiError::IdSetOnCreate);
    }
    let director = store.create_director(&payload.name, &payload.surname)?;
    Ok((StatusCode::CREATED, Json(director)))
}

/// PUT /api/directors/:id
pub async fn update_director(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<i64>,
    Json(payload): Json<DirectorPayload>,
) -> Result<StatusCode, CatalogApiError> {
    if id <= 0 {
        return Err(CatalogApiError::InvalidId);
    }
    if id != payload.id {
        return Err(CatalogApiError::IdMismatch);
    }
    store.update_director(id, &payload.name, &payload.surname)?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/directors/:id
pub async fn delete_director(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, CatalogApiError> {
    if id <= 0 {
        return Err(CatalogApiError::InvalidId);
    }
    store.delete_director(id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ---- movies ----

/// GET /api/movies
pub async fn list_movies(
    State(store): State<Arc<CatalogStore>>,
) -> Result<Json<Vec<Movie>>, CatalogApiError> {
    let movies = store.list_movies().map_err(internal)?;
    Ok(Json(movies))
}

/// GET /api/movies/:id
pub async fn get_movie(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<i64>,
) -> Result<Json<Movie>, CatalogApiError> {
    if id <= 0 {
        return Err(CatalogApiError::InvalidId);
    }
    let movie = store
        .get_movie(id)
        .map_err(internal)?
        .ok_or(CatalogApiError::NotFound)?;
    Ok(Json(movie))
}

/// POST /api/movies
pub async fn create_movie(
    State(store): State<Arc<CatalogStore>>,
    Json(payload): Json<MoviePayload>,
) -> Result<(StatusCode, Json<Movie>), CatalogApiError> {
    if payload.id != 0 {
        return Err(CatalogApiError::IdSetOnCreate);
    }
    let movie = store.create_movie(
        &payload.title,
        payload.description.as_deref(),
        payload.release_date,
        payload.genre.as_deref(),
        payload.director_id,
    )?;
    Ok((StatusCode::CREATED, Json(movie)))
}

/// PUT /api/movies/:id
pub async fn update_movie(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<i64>,
    Json(payload): Json<MoviePayload>,
) -> Result<StatusCode, CatalogApiError> {
    if id <= 0 {
        return Err(CatalogApiError::InvalidId);
    }
    if id != payload.id {
        return Err(CatalogApiError::IdMismatch);
    }
    store.update_movie(
        id,
        &payload.title,
        payload.description.as_deref(),
        payload.release_date,
        payload.genre.as_deref(),
        payload.director_id,
    )?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/movies/:id
pub async fn delete_movie(
    State(store): State<Arc<CatalogStore>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, CatalogApiError> {
    if id <= 0 {
        return Err(CatalogApiError::InvalidId);
    }
    store.delete_movie(id)?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tempfile::NamedTempFile;

    fn test_store() -> (Arc<CatalogStore>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = CatalogStore::new(temp_file.path().to_str().unwrap()).unwrap();
        (Arc::new(store), temp_file)
    }

    #[tokio::test]
    async fn test_create_then_get_director() {
        let (store, _temp) = test_store();

        let (status, Json(created)) = create_director(
            State(store.clone()),
            Json(DirectorPayload {
                id: 0,
                name: "Michael".to_string(),
                surname: "Mann".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);

        let Json(fetched) = get_director(State(store), Path(created.id)).await.unwrap();
        assert_eq!(fetched.name, "Michael");
    }

    #[tokio::test]
    async fn test_create_with_preset_id_rejected() {
        let (store, _temp) = test_store();

        let result = create_director(
            State(store),
            Json(DirectorPayload {
                id: 7,
                name: "Michael".to_string(),
                surname: "Mann".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(CatalogApiError::IdSetOnCreate)));
    }

    #[tokio::test]
    async fn test_update_id_mismatch_rejected() {
        let (store, _temp) = test_store();

        let result = update_director(
            State(store),
            Path(1),
            Json(DirectorPayload {
                id: 2,
                name: "Michael".to_string(),
                surname: "Mann".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(CatalogApiError::IdMismatch)));
    }

    #[tokio::test]
    async fn test_get_missing_movie_is_404() {
        let (store, _temp) = test_store();
        let result = get_movie(State(store), Path(55)).await;
        assert!(matches!(result, Err(CatalogApiError::NotFound)));
    }

    #[tokio::test]
    async fn test_non_positive_id_rejected() {
        let (store, _temp) = test_store();
        let result = get_movie(State(store.clone()), Path(0)).await;
        assert!(matches!(result, Err(CatalogApiError::InvalidId)));

        let result = delete_director(State(store), Path(-3)).await;
        assert!(matches!(result, Err(CatalogApiError::InvalidId)));
    }

    #[tokio::test]
    async fn test_create_movie_with_unknown_director_is_400() {
        let (store, _temp) = test_store();

        let result = create_movie(
            State(store),
            Json(MoviePayload {
                id: 0,
                title: "Heat".to_string(),
                description: None,
                release_date: Utc.with_ymd_and_hms(1995, 12, 15, 0, 0, 0).unwrap(),
                genre: None,
                director_id: Some(42),
            }),
        )
        .await;

        match result {
            Err(e) => assert_eq!(
                e.into_response().status(),
                StatusCode::BAD_REQUEST
            ),
            Ok(_) => panic!("expected rejection for unknown director"),
        }
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            CatalogApiError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CatalogApiError::IdMismatch.into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CatalogApiError::InternalError.into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
