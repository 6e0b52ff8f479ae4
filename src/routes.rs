// src/routes.rs
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
    Router,
};
use http::{header::CONTENT_TYPE, Method};
use sqlx::PgPool;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{error::ApiError, handlers, AppState};

pub fn create_routes(pool: PgPool) -> Router {
    let state = Arc::new(AppState { pool });

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/health", get(handlers::health))
        .route("/categories", get(handlers::list_categories))
        .route("/categories/", get(handlers::list_categories))
        .route("/categories/create", post(handlers::create_category))
        .route(
            "/categories/{id}/update",
            put(handlers::update_category).patch(handlers::update_category),
        )
        .route("/questions", get(handlers::list_polls))
        .route("/questions/", get(handlers::list_polls))
        .route("/questions/create", post(handlers::create_poll))
        .route("/questions/{id}", get(handlers::get_poll))
        .route(
            "/questions/{id}/update",
            put(handlers::update_poll).patch(handlers::update_poll),
        )
        .route("/questions/{id}/delete", delete(handlers::delete_poll))
        .fallback(handlers::not_found)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "handler panicked".to_string());

    ApiError::Unexpected(detail).into_response()
}
