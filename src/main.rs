//! Wardrobe Catalog Backend
//!
//! Local service owning the clothing catalog: a JSON collection kept in a
//! SQLite key-value table, plus the image files the records point at.

mod api;
mod auth;
mod config;
mod db;
mod errors;
mod images;
mod models;
mod search;

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::Config;
use db::{CatalogStore, KeyValueStore};
use images::ImageStore;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub images: Arc<ImageStore>,
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;

    init_logging(&config);

    tracing::info!("Starting Wardrobe Catalog Backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);

    if config.api_psk.is_none() {
        tracing::warn!("No API PSK configured (WARDROBE_API_PSK). Authentication is disabled!");
    }

    let pool = db::init_database(&config.db_path).await?;
    let catalog = Arc::new(CatalogStore::new(KeyValueStore::new(pool)));
    let images = ImageStore::open(&config.image_dir)
        .await?
        .protect(&config.db_path)
        .await;
    let images = Arc::new(images);
    tracing::info!("Image directory: {:?}", images.root());

    let item_count = catalog.load_all().await?.len();
    tracing::info!("Catalog loaded with {} items", item_count);

    let state = AppState {
        catalog,
        images,
        config: Arc::new(config.clone()),
    };

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Create the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let psk = state.config.api_psk.clone();
    let max_image_bytes = state.config.max_image_bytes;

    let api_routes = Router::new()
        // Whole catalog
        .route(
            "/wardrobe",
            get(api::get_wardrobe).put(api::replace_wardrobe),
        )
        .route("/wardrobe/revision", get(api::get_revision))
        // Clothing items
        .route("/clothes", get(api::list_clothes).post(api::create_clothing))
        .route(
            "/clothes/{id}",
            get(api::get_clothing)
                .put(api::update_clothing)
                .delete(api::delete_clothing),
        )
        // Search
        .route("/search", get(api::search_clothes))
        // Images
        .route(
            "/images",
            post(api::upload_image).layer(DefaultBodyLimit::max(max_image_bytes)),
        )
        .layer(middleware::from_fn(move |req, next| {
            auth::psk_auth_layer(psk.clone(), req, next)
        }));

    // Health check (no auth required)
    let health_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "OK"
}
