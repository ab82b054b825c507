use axum::{Router, middleware as axum_middleware, routing::get};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tera::Tera;
use tower_http::trace::TraceLayer;

use crate::server::config::ServerConfig;
use crate::web::{middleware::auth, routes::*};

pub use crate::web::error::AppError;

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod templates;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: DatabaseConnection,
    pub templates: Arc<Tera>,
    pub config: Arc<ServerConfig>,
}

async fn not_found_handler() -> AppError {
    AppError::NotFound("No route matches the given path.".to_string())
}

pub fn create_axum_router(
    db_pool: DatabaseConnection,
    templates: Arc<Tera>,
    config: Arc<ServerConfig>,
) -> Router {
    let app_state = Arc::new(AppState {
        db_pool,
        templates,
        config,
    });

    let protected = task_routes::create_tasks_router()
        .merge(tag_routes::create_tags_router())
        .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth));

    Router::new()
        .route(
            "/",
            get(task_routes::home_handler)
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::optional_auth)),
        )
        .merge(auth_routes::create_auth_router())
        .merge(protected)
        .fallback(not_found_handler)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
}
