use axum::body::Bytes;
use axum::extract::State;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::operations::user::{
    self, SettingsUpdate, UpsertUser, UserRecord, SUPPORTED_LANGUAGES,
};
use crate::response::AppError;
use crate::state::AppState;

const MAX_WORDS_PER_LESSON: i32 = 20;

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserRecord>, AppError> {
    let Some(db) = state.db() else {
        return Err(AppError::service_unavailable("Service unavailable"));
    };

    let record = user::get_user(db.pool(), auth_user.id)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "get user failed");
            AppError::internal(err.to_string())
        })?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct UpdateSettingsRequest {
    display_language: Option<String>,
    words_per_lesson: Option<i32>,
}

pub async fn update_settings(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    body: Bytes,
) -> Result<Json<UserRecord>, AppError> {
    let payload: UpdateSettingsRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::validation("Invalid settings values"))?;

    if payload.display_language.is_none() && payload.words_per_lesson.is_none() {
        return Err(AppError::validation("At least one field must be provided"));
    }

    if let Some(lang) = payload.display_language.as_deref() {
        if !SUPPORTED_LANGUAGES.contains(&lang) {
            return Err(AppError::validation(format!(
                "display_language must be one of {}",
                SUPPORTED_LANGUAGES.join("/")
            )));
        }
    }

    if let Some(count) = payload.words_per_lesson {
        if count < 1 || count > MAX_WORDS_PER_LESSON {
            return Err(AppError::validation(format!(
                "words_per_lesson must be between 1 and {MAX_WORDS_PER_LESSON}"
            )));
        }
    }

    let Some(db) = state.db() else {
        return Err(AppError::service_unavailable("Service unavailable"));
    };

    let update = SettingsUpdate {
        display_language: payload.display_language,
        words_per_lesson: payload.words_per_lesson,
    };

    let record = user::update_settings(db.pool(), auth_user.id, &update)
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "settings update failed");
            AppError::internal(err.to_string())
        })?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
struct InternalUpsertRequest {
    telegram_id: i64,
    first_name: String,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    language_code: Option<String>,
}

/// Unauthenticated upsert used by the bot process when a chat starts.
pub async fn internal_upsert(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<UserRecord>, AppError> {
    let payload: InternalUpsertRequest =
        serde_json::from_slice(&body).map_err(|_| AppError::validation("Invalid request body"))?;

    if payload.first_name.is_empty() {
        return Err(AppError::validation("first_name must not be empty"));
    }

    let Some(db) = state.db() else {
        return Err(AppError::service_unavailable("Service unavailable"));
    };

    let record = user::upsert_user(
        db.pool(),
        &UpsertUser {
            telegram_id: payload.telegram_id,
            first_name: payload.first_name,
            last_name: payload.last_name,
            username: payload.username,
            language_code: payload.language_code,
        },
    )
    .await
    .map_err(|err| {
        tracing::warn!(error = %err, "internal user upsert failed");
        AppError::internal(err.to_string())
    })?;

    Ok(Json(record))
}
