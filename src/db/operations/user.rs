use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

/// User profile as exposed to the client.
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: i32,
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub display_language: String,
    pub words_per_lesson: i32,
}

pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "ru"];

#[derive(Debug, Clone)]
pub struct UpsertUser {
    pub telegram_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub display_language: Option<String>,
    pub words_per_lesson: Option<i32>,
}

fn map_user(row: &PgRow) -> Result<UserRecord, sqlx::Error> {
    Ok(UserRecord {
        id: row.try_get("id")?,
        telegram_id: row.try_get("telegram_id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        username: row.try_get("username")?,
        display_language: row.try_get("display_language")?,
        words_per_lesson: row.try_get("words_per_lesson")?,
    })
}

/// Creates the user on first sighting, otherwise refreshes the profile
/// fields Telegram sent. The display language is only derived from the
/// Telegram language code at creation time; later changes go through
/// settings.
pub async fn upsert_user(pool: &PgPool, data: &UpsertUser) -> Result<UserRecord, sqlx::Error> {
    let display_language = data
        .language_code
        .as_deref()
        .filter(|code| SUPPORTED_LANGUAGES.contains(code))
        .unwrap_or("en");

    let row = sqlx::query(
        r#"
        INSERT INTO users
            (telegram_id, first_name, last_name, username, language_code, display_language)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (telegram_id) DO UPDATE
        SET first_name = EXCLUDED.first_name,
            last_name = EXCLUDED.last_name,
            username = EXCLUDED.username,
            language_code = EXCLUDED.language_code,
            updated_at = NOW()
        RETURNING id, telegram_id, first_name, last_name, username,
                  display_language, words_per_lesson
        "#,
    )
    .bind(data.telegram_id)
    .bind(&data.first_name)
    .bind(data.last_name.as_deref())
    .bind(data.username.as_deref())
    .bind(data.language_code.as_deref())
    .bind(display_language)
    .fetch_one(pool)
    .await?;

    map_user(&row)
}

pub async fn get_user(pool: &PgPool, user_id: i32) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, telegram_id, first_name, last_name, username,
               display_language, words_per_lesson
        FROM users
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_user).transpose()
}

/// Partial settings update; `None` fields keep their current value. Returns
/// `None` when the user does not exist.
pub async fn update_settings(
    pool: &PgPool,
    user_id: i32,
    update: &SettingsUpdate,
) -> Result<Option<UserRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        UPDATE users
        SET display_language = COALESCE($2, display_language),
            words_per_lesson = COALESCE($3, words_per_lesson),
            updated_at = NOW()
        WHERE id = $1
        RETURNING id, telegram_id, first_name, last_name, username,
                  display_language, words_per_lesson
        "#,
    )
    .bind(user_id)
    .bind(update.display_language.as_deref())
    .bind(update.words_per_lesson)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(map_user).transpose()
}
