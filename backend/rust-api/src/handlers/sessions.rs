use axum::{extract::State, response::IntoResponse, Json};
use std::sync::Arc;

use super::ApiError;
use crate::{
    extractors::ValidatedJson,
    models::{
        DispatchResponse, EnterExerciseRequest, EnterLevelRequest, SessionEvent,
        SubmitAnswerRequest,
    },
    services::{navigator::Navigation, AppState},
};

/// GET /api/v1/session
pub async fn get_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.session.snapshot())
}

/// POST /api/v1/session/level
pub async fn enter_level(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<EnterLevelRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Entering level: {}", req.level_id);
    dispatch(
        &state,
        SessionEvent::EnterLevel {
            level_id: req.level_id,
        },
    )
    .await
}

/// DELETE /api/v1/session/level
pub async fn exit_level(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Exiting level");
    dispatch(&state, SessionEvent::ExitLevel).await
}

/// POST /api/v1/session/exercise
pub async fn enter_exercise(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<EnterExerciseRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Entering exercise: {}", req.exercise_id);
    dispatch(
        &state,
        SessionEvent::EnterExercise {
            exercise_id: req.exercise_id,
        },
    )
    .await
}

/// POST /api/v1/session/exercise/answers
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::debug!("Submitting answer: correct={}", req.correct);
    dispatch(
        &state,
        SessionEvent::Answer {
            correct: req.correct,
        },
    )
    .await
}

/// POST /api/v1/session/exercise/exit
pub async fn exit_exercise(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Exiting exercise");
    dispatch(&state, SessionEvent::ExitExercise).await
}

async fn dispatch(
    state: &AppState,
    event: SessionEvent,
) -> Result<Json<DispatchResponse>, ApiError> {
    let outcome = state.session.dispatch(event).await?;

    let completed_session_id = match outcome.navigation {
        Navigation::Completed { session_id } => Some(session_id),
        _ => None,
    };

    Ok(Json(DispatchResponse {
        accepted: outcome.navigation.is_accepted(),
        completed_session_id,
        state: outcome.state,
    }))
}
