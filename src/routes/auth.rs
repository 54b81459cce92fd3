use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::operations::user::{self, UpsertUser, UserRecord};
use crate::response::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct AuthValidateRequest {
    init_data: String,
}

#[derive(Debug, Serialize)]
pub struct AuthValidateResponse {
    token: String,
    user: UserRecord,
}

/// Validates Telegram WebApp initData, upserts the user by telegram id and
/// issues a 24h bearer token.
pub async fn validate(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<AuthValidateResponse>, AppError> {
    let payload: AuthValidateRequest = serde_json::from_slice(&body)
        .map_err(|_| AppError::validation("Missing or malformed init_data field"))?;
    if payload.init_data.is_empty() {
        return Err(AppError::validation("Missing or malformed init_data field"));
    }

    let bot_token = &state.config().bot_token;
    let telegram_user = crate::auth::validate_init_data(&payload.init_data, bot_token)
        .map_err(|err| {
            tracing::debug!(error = %err, "initData validation failed");
            AppError::unauthorized("Invalid initData signature")
        })?;

    let Some(db) = state.db() else {
        return Err(AppError::service_unavailable("Service unavailable"));
    };

    let record = user::upsert_user(
        db.pool(),
        &UpsertUser {
            telegram_id: telegram_user.id,
            first_name: telegram_user.first_name,
            last_name: telegram_user.last_name,
            username: telegram_user.username,
            language_code: telegram_user.language_code,
        },
    )
    .await
    .map_err(|err| {
        tracing::warn!(error = %err, "user upsert failed");
        AppError::internal(err.to_string())
    })?;

    let token = crate::auth::sign_token(record.id, record.telegram_id, bot_token)
        .map_err(|err| AppError::internal(err.to_string()))?;

    Ok(Json(AuthValidateResponse {
        token,
        user: record,
    }))
}
