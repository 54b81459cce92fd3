use axum::http::{header, HeaderMap};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

const TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Authenticated request context, inserted as a request extension by the
/// auth middleware.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i32,
    pub telegram_id: i64,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token")]
    InvalidToken,
    #[error("missing BOT_TOKEN")]
    MissingBotToken,
    #[error("missing hash in initData")]
    MissingHash,
    #[error("invalid initData signature")]
    InvalidSignature,
    #[error("malformed initData user payload")]
    MalformedUser,
}

/// User fields Telegram embeds in the WebApp initData `user` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())?;

    auth_header
        .strip_prefix("Bearer ")
        .map(|value| value.to_string())
}

/// Validates Telegram WebApp initData: the `hash` entry must equal the
/// HMAC-SHA256 of the sorted `key=value` data-check string, keyed with
/// `HMAC("WebAppData", bot_token)`. Returns the embedded user on success.
pub fn validate_init_data(init_data: &str, bot_token: &str) -> Result<TelegramUser, AuthError> {
    if bot_token.is_empty() {
        return Err(AuthError::MissingBotToken);
    }

    let mut entries: Vec<(String, String)> = Vec::new();
    let mut provided_hash: Option<String> = None;

    for pair in init_data.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        // Query encoding may use '+' for space; percent-decoding alone
        // leaves it as a literal plus.
        let key = urlencoding::decode(&key.replace('+', " "))
            .map_err(|_| AuthError::InvalidSignature)?
            .into_owned();
        let value = urlencoding::decode(&value.replace('+', " "))
            .map_err(|_| AuthError::InvalidSignature)?
            .into_owned();
        if key == "hash" {
            provided_hash = Some(value);
        } else {
            entries.push((key, value));
        }
    }

    let provided_hash = provided_hash.ok_or(AuthError::MissingHash)?;
    let provided = hex::decode(&provided_hash).map_err(|_| AuthError::InvalidSignature)?;

    entries.sort_by(|a, b| a.0.cmp(&b.0));
    let data_check_string = entries
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut secret_mac =
        HmacSha256::new_from_slice(b"WebAppData").map_err(|_| AuthError::InvalidSignature)?;
    secret_mac.update(bot_token.as_bytes());
    let secret_key = secret_mac.finalize().into_bytes();

    let mut mac =
        HmacSha256::new_from_slice(&secret_key).map_err(|_| AuthError::InvalidSignature)?;
    mac.update(data_check_string.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| AuthError::InvalidSignature)?;

    let user_json = entries
        .iter()
        .find(|(k, _)| k == "user")
        .map(|(_, v)| v.as_str())
        .ok_or(AuthError::MalformedUser)?;

    serde_json::from_str(user_json).map_err(|_| AuthError::MalformedUser)
}

/// Signs a 24h HS256 JWT for the user, keyed with the bot token.
pub fn sign_token(user_id: i32, telegram_id: i64, bot_token: &str) -> Result<String, AuthError> {
    if bot_token.is_empty() {
        return Err(AuthError::MissingBotToken);
    }

    let issued_at = Utc::now().timestamp();
    sign_token_with_claims(
        user_id,
        telegram_id,
        bot_token,
        issued_at,
        issued_at + TOKEN_TTL_SECONDS,
    )
}

fn sign_token_with_claims(
    user_id: i32,
    telegram_id: i64,
    bot_token: &str,
    iat: i64,
    exp: i64,
) -> Result<String, AuthError> {
    let header_json = serde_json::json!({ "alg": "HS256", "typ": "JWT" });
    let payload_json = serde_json::json!({
        "sub": user_id.to_string(),
        "tid": telegram_id,
        "iat": iat,
        "exp": exp,
    });

    let header_b64 = URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(&header_json).map_err(|_| AuthError::InvalidToken)?);
    let payload_b64 = URL_SAFE_NO_PAD
        .encode(serde_json::to_vec(&payload_json).map_err(|_| AuthError::InvalidToken)?);
    let signing_input = format!("{header_b64}.{payload_b64}");

    let mut mac =
        HmacSha256::new_from_slice(bot_token.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(signing_input.as_bytes());
    let sig_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{signing_input}.{sig_b64}"))
}

/// Verifies an HS256 JWT statelessly and returns the authenticated user.
pub fn verify_token(token: &str, bot_token: &str) -> Result<AuthUser, AuthError> {
    if bot_token.is_empty() {
        return Err(AuthError::MissingBotToken);
    }

    let mut parts = token.split('.');
    let header_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let payload_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    let sig_b64 = parts.next().ok_or(AuthError::InvalidToken)?;
    if parts.next().is_some() {
        return Err(AuthError::InvalidToken);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(header_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let payload_bytes = URL_SAFE_NO_PAD
        .decode(payload_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;
    let sig_bytes = URL_SAFE_NO_PAD
        .decode(sig_b64.as_bytes())
        .map_err(|_| AuthError::InvalidToken)?;

    let header_json: serde_json::Value =
        serde_json::from_slice(&header_bytes).map_err(|_| AuthError::InvalidToken)?;
    if header_json.get("alg").and_then(|v| v.as_str()) != Some("HS256") {
        return Err(AuthError::InvalidToken);
    }

    let mut mac =
        HmacSha256::new_from_slice(bot_token.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(format!("{header_b64}.{payload_b64}").as_bytes());
    mac.verify_slice(&sig_bytes)
        .map_err(|_| AuthError::InvalidToken)?;

    let payload_json: serde_json::Value =
        serde_json::from_slice(&payload_bytes).map_err(|_| AuthError::InvalidToken)?;

    let now = Utc::now().timestamp();
    if let Some(exp) = payload_json.get("exp").and_then(|v| v.as_i64()) {
        if now >= exp {
            return Err(AuthError::InvalidToken);
        }
    }
    if let Some(nbf) = payload_json.get("nbf").and_then(|v| v.as_i64()) {
        if now < nbf {
            return Err(AuthError::InvalidToken);
        }
    }

    let user_id = payload_json
        .get("sub")
        .and_then(|v| v.as_str())
        .and_then(|v| v.parse::<i32>().ok())
        .ok_or(AuthError::InvalidToken)?;
    let telegram_id = payload_json
        .get("tid")
        .and_then(|v| v.as_i64())
        .ok_or(AuthError::InvalidToken)?;

    Ok(AuthUser {
        id: user_id,
        telegram_id,
    })
}
