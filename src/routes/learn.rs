use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::auth::AuthUser;
use crate::db::operations::progress::{self, LearnStats};
use crate::exercises::Exercise;
use crate::lesson::complete::{self, CompleteLessonResponse, ExerciseOutcome};
use crate::lesson::{self, LessonError, LessonMode};
use crate::response::AppError;
use crate::state::AppState;

pub async fn stats(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<LearnStats>, AppError> {
    let Some(db) = state.db() else {
        return Err(AppError::service_unavailable("Service unavailable"));
    };

    let stats = progress::learn_stats(db.pool(), auth_user.id)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "learn stats failed");
            AppError::internal(err.to_string())
        })?;

    Ok(Json(stats))
}

#[derive(Debug, Deserialize)]
struct StartLessonRequest {
    mode: LessonMode,
}

#[derive(Debug, Serialize)]
pub struct StartLessonResponse {
    exercises: Vec<Exercise>,
}

pub async fn start_lesson(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<StartLessonResponse>, AppError> {
    let payload: StartLessonRequest =
        serde_json::from_slice(&body).map_err(|_| AppError::validation("Invalid request"))?;

    let Some(db) = state.db() else {
        return Err(AppError::service_unavailable("Service unavailable"));
    };

    match lesson::build_lesson(&db, auth_user.id, payload.mode).await {
        Ok(exercises) => Ok(Json(StartLessonResponse { exercises })),
        Err(LessonError::NoWords) => {
            Err(AppError::no_words("No words available for selected mode"))
        }
        Err(LessonError::UserNotFound) => Err(AppError::not_found("User not found")),
        Err(err) => {
            tracing::warn!(error = %err, mode = payload.mode.as_str(), "lesson build failed");
            Err(AppError::internal(err.to_string()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompleteLessonRequest {
    results: Vec<ExerciseOutcome>,
}

pub async fn complete_lesson(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<CompleteLessonResponse>, AppError> {
    let payload: CompleteLessonRequest =
        serde_json::from_slice(&body).map_err(|_| AppError::validation("Invalid request body"))?;

    if payload.results.is_empty() {
        return Err(AppError::validation("results must not be empty"));
    }

    let Some(db) = state.db() else {
        return Err(AppError::service_unavailable("Service unavailable"));
    };

    let response = complete::apply_results(&db, auth_user.id, &payload.results)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "lesson completion failed");
            AppError::internal(err.to_string())
        })?;

    Ok(Json(response))
}
