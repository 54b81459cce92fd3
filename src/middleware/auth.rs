use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::response::AppError;
use crate::state::AppState;

/// Requires a valid bearer JWT and stores the authenticated user as a
/// request extension. Token verification is stateless: the signature and
/// expiry are checked against the bot token, no session lookup.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = crate::auth::extract_token(req.headers()) else {
        return AppError::unauthorized("Missing or invalid token").into_response();
    };

    match crate::auth::verify_token(&token, &state.config().bot_token) {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Err(err) => {
            tracing::debug!(error = %err, "token verification failed");
            AppError::unauthorized("Invalid or expired token").into_response()
        }
    }
}
