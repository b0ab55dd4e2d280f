pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod services;
pub mod store;

use axum::{
    Json, Router,
    http::{
        HeaderValue, Method,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{config::Config, store::JokeStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn JokeStore>,
    pub config: Arc<Config>,
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(
            state
                .config
                .allowed_origins
                .iter()
                .filter_map(|origin| match origin.parse::<HeaderValue>() {
                    Ok(value) => Some(value),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid allowed origin: {}", origin);
                        None
                    }
                })
                .collect::<Vec<_>>(),
        )
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE]);

    // Open to anonymous callers
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/jokes/random", get(handlers::jokes::get_random_joke))
        .route("/api/jokes/categories", get(handlers::jokes::get_categories));

    // Reads are public, writes require a bearer token (enforced by AuthUser)
    let joke_routes = Router::new()
        .route(
            "/api/jokes",
            get(handlers::jokes::list_jokes).post(handlers::jokes::create_joke),
        )
        .route(
            "/api/jokes/{joke_id}",
            get(handlers::jokes::get_joke)
                .put(handlers::jokes::update_joke)
                .delete(handlers::jokes::delete_joke),
        )
        .route("/api/jokes/{joke_id}/like", post(handlers::votes::like_joke))
        .route("/api/jokes/{joke_id}/dislike", post(handlers::votes::dislike_joke))
        .route("/api/jokes/{joke_id}/rate", post(handlers::votes::rate_joke));

    Router::new()
        .merge(public_routes)
        .merge(joke_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
