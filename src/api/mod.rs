//! API layer - HTTP handlers and routing
//!
//! - Rendered pages (home, blog posts, 404)
//! - Public section, visibility and health endpoints
//! - Token-protected admin endpoints (collections, visibility, upload)
//! - Static serving of locally stored uploads

pub mod admin;
pub mod middleware;
pub mod pages;
pub mod sections;
pub mod upload;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::config::{Config, StorageDriver};

pub use middleware::{ApiError, AppState};

/// Build the `/api/v1` router
pub fn build_api_router(state: AppState, max_file_size: u64) -> Router<AppState> {
    let admin_routes = admin::router()
        .merge(upload::router(max_file_size))
        .route_layer(axum_middleware::from_fn_with_state(
            state,
            middleware::require_admin,
        ));

    Router::new()
        .merge(sections::router())
        .nest("/admin", admin_routes)
}

fn cors_layer(cors_origin: &str) -> CorsLayer {
    let origin = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) if cors_origin != "*" => AllowOrigin::exact(origin),
        Ok(_) => AllowOrigin::any(),
        Err(e) => {
            tracing::warn!("Invalid CORS origin {:?} ({}), allowing any origin", cors_origin, e);
            AllowOrigin::any()
        }
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, config: &Config) -> Router {
    let mut router = Router::new()
        .merge(pages::router())
        .nest("/api/v1", build_api_router(state.clone(), config.storage.max_file_size));

    let uploads_route = config.storage.public_base_url.trim_end_matches('/');
    if config.storage.driver == StorageDriver::Local && uploads_route.starts_with('/') {
        router = router.nest_service(uploads_route, ServeDir::new(&config.storage.path));
    }

    router
        .fallback(pages::not_found)
        .layer(cors_layer(&config.server.cors_origin))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
