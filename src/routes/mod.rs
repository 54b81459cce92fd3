mod auth;
mod health;
mod learn;
mod users;

use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::Router;

use crate::middleware::auth::require_auth;
use crate::response::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/auth/validate", post(auth::validate))
        .route("/internal/users/upsert", post(users::internal_upsert));

    let protected = Router::new()
        .route("/users/me", get(users::me))
        .route("/users/me/settings", patch(users::update_settings))
        .route("/learn/stats", get(learn::stats))
        .route("/learn/lesson", post(learn::start_lesson))
        .route("/learn/complete", post(learn::complete_lesson))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    public
        .merge(protected)
        .fallback(fallback_handler)
        .with_state(state)
}

async fn fallback_handler() -> Response {
    AppError::not_found("Route not found").into_response()
}
