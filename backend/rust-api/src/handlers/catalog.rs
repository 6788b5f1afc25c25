use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::ApiError;
use crate::services::AppState;

/// GET /api/v1/catalog/levels
pub async fn list_levels(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.levels())
}

/// GET /api/v1/catalog/levels/{id}
pub async fn get_level(
    State(state): State<Arc<AppState>>,
    Path(level_id): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = state.catalog.level_detail(level_id)?;
    Ok(Json(detail))
}

/// GET /api/v1/catalog/exercises
pub async fn list_exercises(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.catalog.exercises())
}

/// GET /api/v1/catalog/exercises/{id}
pub async fn get_exercise(
    State(state): State<Arc<AppState>>,
    Path(exercise_id): Path<u32>,
) -> Result<impl IntoResponse, ApiError> {
    let exercise = state.catalog.exercise(exercise_id)?;
    Ok(Json(exercise))
}
