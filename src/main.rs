//! Cinema API - Movie Catalog Backend
//! Mission: CRUD for directors, movies, and users behind JWT auth with logout blacklisting

use anyhow::{Context, Result};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use cinema_backend::{
    auth::{
        api as auth_api, auth_middleware, AuthGate, AuthState, JwtHandler, SqliteRevocationStore,
        UserStore,
    },
    catalog::{api as catalog_api, users_api, CatalogStore},
    config::AppConfig,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    info!("🎬 Cinema API Starting");

    let config = match AppConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Fatal configuration error: {e}");
            return Err(e);
        }
    };

    // Stores and signing material
    let user_store = Arc::new(UserStore::new(&config.database_path)?);
    let catalog_store = Arc::new(CatalogStore::new(&config.database_path)?);
    let revocations = Arc::new(SqliteRevocationStore::new(&config.revocation_db_path)?);
    let jwt_handler = Arc::new(JwtHandler::new(config.jwt.clone())?);

    info!("🔐 Authentication database at: {}", config.database_path);
    info!("🗑️  Revocation store at: {}", config.revocation_db_path);

    let gate = AuthGate::new(jwt_handler.clone(), revocations.clone());
    let auth_state = AuthState::new(user_store, jwt_handler, revocations);

    // Public auth routes (no token required)
    let auth_router = Router::new()
        .route("/api/auth/login", post(auth_api::login))
        .route("/api/auth/register", post(auth_api::register))
        .with_state(auth_state.clone());

    // Routes behind the authentication gate
    let session_routes = Router::new()
        .route("/api/auth/logout", post(auth_api::logout))
        .route("/api/auth/me", get(auth_api::get_current_user))
        .with_state(auth_state.clone());

    let catalog_routes = Router::new()
        .route(
            "/api/directors",
            get(catalog_api::list_directors).post(catalog_api::create_director),
        )
        .route(
            "/api/directors/:id",
            get(catalog_api::get_director)
                .put(catalog_api::update_director)
                .delete(catalog_api::delete_director),
        )
        .route(
            "/api/movies",
            get(catalog_api::list_movies).post(catalog_api::create_movie),
        )
        .route(
            "/api/movies/:id",
            get(catalog_api::get_movie)
                .put(catalog_api::update_movie)
                .delete(catalog_api::delete_movie),
        )
        .with_state(catalog_store);

    // Admin role is checked inside the handlers, after the gate
    let users_routes = Router::new()
        .route(
            "/api/users",
            get(users_api::list_users).post(users_api::create_user),
        )
        .route(
            "/api/users/:id",
            get(users_api::get_user)
                .put(users_api::update_user)
                .delete(users_api::delete_user),
        )
        .with_state(auth_state);

    let protected_routes = Router::new()
        .merge(session_routes)
        .merge(catalog_routes)
        .merge(users_routes)
        .route_layer(middleware::from_fn_with_state(gate, auth_middleware));

    // Public routes (health check)
    let public_routes = Router::new().route("/health", get(health_check));

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(auth_router)
        .layer(CorsLayer::permissive());

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

/// Initialize tracing with env-driven filtering
fn init_tracing() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cinema_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
