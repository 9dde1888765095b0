//! steamstats server
//!
//! Provides:
//! - Steam API proxy endpoints returning flattened views (most played, rare
//!   achievements, library value, ...)
//! - A registry of known Steam accounts in PostgreSQL

mod aggregator;
mod config;
mod db;
mod error;
mod routes;
mod steam_api;

#[cfg(test)]
mod testing;

use axum::{
    routing::{get, post},
    Router,
};
use deadpool_postgres::Runtime;
use std::sync::Arc;
use tokio_postgres::NoTls;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::aggregator::StatsService;
use crate::config::Config;
use crate::db::{PgRegistry, Registry};
use crate::steam_api::SteamClient;

pub struct AppState {
    pub stats: StatsService,
    pub registry: Arc<dyn Registry>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Registry
        .route("/add_user/{steam_id}", post(routes::add_user))
        .route("/users", get(routes::list_users))
        // Steam proxy
        .route("/steam/api/user", get(routes::get_user))
        .route("/steam/api/friends", get(routes::get_friends))
        .route("/steam/api/most-played", get(routes::get_most_played))
        .route("/steam/api/top_categories", get(routes::get_top_categories))
        .route("/steam/api/rare-achievements", get(routes::get_rare_achievements))
        .route("/steam/api/total-hours", get(routes::get_total_hours))
        .route("/steam/api/average-hours-per-week", get(routes::get_average_hours_per_week))
        .route("/steam/api/library-value", get(routes::get_library_value))
        .route("/steam/api/game-details", get(routes::get_game_details))
        .route("/steam/api/featured-games", get(routes::get_featured_games))
        .route("/steam/api/featured-games/", get(routes::get_featured_games))
        .route("/steam/api/apps-in-genre", get(routes::get_apps_in_genre))
        .with_state(state)
        .layer(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "steamstats_backend=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    tracing::debug!(?config, "Loaded configuration");

    // Database connection pool
    let db_pool = config.db.create_pool(Some(Runtime::Tokio1), NoTls)
        .expect("Failed to create database pool");

    db::init_schema(&db_pool).await
        .expect("Failed to initialize database schema");
    tracing::info!("Connected to database");

    let steam = SteamClient::new(&config)
        .expect("Failed to build Steam client");

    let state = Arc::new(AppState {
        stats: StatsService::new(Arc::new(steam), config.fanout_concurrency),
        registry: Arc::new(PgRegistry::new(db_pool)),
    });

    let app = router(state);

    tracing::info!("Starting server on {}", config.bind_address);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await
        .expect("Server error");
}
