//! Rendered HTML pages

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};

use crate::api::middleware::AppState;
use crate::render::{session::session_id, templates::error_page, TemplateError};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/blog/{slug}", get(blog_post))
}

type HtmlResponse = (StatusCode, Html<String>);

fn rendered(status: StatusCode, result: Result<String, TemplateError>) -> HtmlResponse {
    match result {
        Ok(html) => (status, Html(html)),
        Err(e) => {
            tracing::error!("{}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(error_page("The page could not be rendered.")),
            )
        }
    }
}

/// GET / - Home page
async fn home(State(state): State<AppState>) -> HtmlResponse {
    let page = state.page_service.load_home().await;
    rendered(StatusCode::OK, state.templates.render_home(&page))
}

/// GET /blog/{slug} - Single blog post
async fn blog_post(State(state): State<AppState>, Path(slug): Path<String>) -> HtmlResponse {
    match state.page_service.load_post(&slug).await {
        Ok(Some(post)) => rendered(StatusCode::OK, state.templates.render_post(&post)),
        Ok(None) => not_found_page(&state),
        Err(e) => {
            tracing::warn!(slug = %slug, error = %e, "Blog post failed to load");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Html(error_page("This post could not be loaded. Please try again shortly.")),
            )
        }
    }
}

fn not_found_page(state: &AppState) -> HtmlResponse {
    rendered(
        StatusCode::NOT_FOUND,
        state
            .templates
            .render_not_found(state.page_service.site_title(), session_id()),
    )
}

/// Fallback for unknown routes
pub async fn not_found(State(state): State<AppState>) -> HtmlResponse {
    not_found_page(&state)
}
