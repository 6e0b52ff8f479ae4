// src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::extractors::{CategoryId, PollId, Validated};
use crate::schemas::{
    CategoryCreateUpdateDto, CategoryResponse, PollCreateRequest, PollResponse, PollUpdateRequest,
};
use crate::{category, db, poll, AppState};

/// Liveness check that also does a database round trip
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    db::ping(&state.pool).await?;

    Ok(Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") })))
}

/// Fetch all categories from the database
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let categories = category::list_categories(&state.pool).await?;
    Ok(Json(categories.into_iter().map(CategoryResponse::from).collect()))
}

pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Validated(payload): Validated<CategoryCreateUpdateDto>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let created = category::create_category(&state.pool, &payload.name).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn update_category(
    State(state): State<Arc<AppState>>,
    CategoryId(id): CategoryId,
    Validated(payload): Validated<CategoryCreateUpdateDto>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let updated = category::update_category(&state.pool, id, &payload.name).await?;
    Ok(Json(updated.into()))
}

/// Fetch every poll with its options and category
pub async fn list_polls(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PollResponse>>, ApiError> {
    let polls = poll::list_polls(&state.pool).await?;
    Ok(Json(polls.into_iter().map(PollResponse::from).collect()))
}

/// Create a poll and its options in one transaction
pub async fn create_poll(
    State(state): State<Arc<AppState>>,
    Validated(payload): Validated<PollCreateRequest>,
) -> Result<(StatusCode, Json<PollResponse>), ApiError> {
    let created = poll::create_poll(&state.pool, &payload).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

pub async fn get_poll(
    State(state): State<Arc<AppState>>,
    PollId(id): PollId,
) -> Result<Json<PollResponse>, ApiError> {
    let found = poll::get_poll(&state.pool, id).await?;
    Ok(Json(found.into()))
}

/// Apply a partial update; fields missing from the body stay as they are
pub async fn update_poll(
    State(state): State<Arc<AppState>>,
    PollId(id): PollId,
    Validated(changes): Validated<PollUpdateRequest>,
) -> Result<Json<PollResponse>, ApiError> {
    let updated = poll::update_poll(&state.pool, id, &changes).await?;
    Ok(Json(updated.into()))
}

pub async fn delete_poll(
    State(state): State<Arc<AppState>>,
    PollId(id): PollId,
) -> Result<Json<Value>, ApiError> {
    poll::delete_poll(&state.pool, id).await?;
    Ok(Json(json!({
        "message": format!("Poll with ID {id} was deleted successfully")
    })))
}

/// Fallback for paths no route matches
pub async fn not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Not found", "message": "The requested URL was not found" })),
    )
}
