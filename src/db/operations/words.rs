use std::collections::HashMap;

use sqlx::postgres::PgRow;
use sqlx::{PgConnection, PgPool, Row};

/// Immutable vocabulary item. Created by content ingestion, never mutated by
/// the lesson engine.
#[derive(Debug, Clone)]
pub struct Word {
    pub id: i32,
    pub original: String,
    pub transcription: Option<String>,
    pub translations: HashMap<String, String>,
    pub notes: Option<String>,
}

impl Word {
    /// Translation in the requested display language, falling back to the
    /// default `en` entry, then to an empty string.
    pub fn translation(&self, lang: &str) -> String {
        self.translations
            .get(lang)
            .or_else(|| self.translations.get("en"))
            .cloned()
            .unwrap_or_default()
    }
}

fn map_word(row: &PgRow) -> Result<Word, sqlx::Error> {
    let translations_json: serde_json::Value = row.try_get("translations")?;
    let translations: HashMap<String, String> = serde_json::from_value(translations_json)
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

    Ok(Word {
        id: row.try_get("id")?,
        original: row.try_get("original")?,
        transcription: row.try_get("transcription")?,
        translations,
        notes: row.try_get("notes")?,
    })
}

/// Full word pool, used for distractor sourcing. Read-only within a
/// lesson-build call.
pub async fn all_words(pool: &PgPool) -> Result<Vec<Word>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT id, original, transcription, translations, notes
        FROM words
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_word).collect()
}

/// Words the user has never been presented: no progress row exists. Order is
/// uniformly random, capped at the per-lesson limit.
pub async fn words_without_progress(
    pool: &PgPool,
    user_id: i32,
    limit: i64,
) -> Result<Vec<Word>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT w.id, w.original, w.transcription, w.translations, w.notes
        FROM words w
        LEFT JOIN user_progress up ON up.word_id = w.id AND up.user_id = $1
        WHERE up.id IS NULL
        ORDER BY RANDOM()
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(map_word).collect()
}

/// Original surface forms for the given word ids, keyed by id. Runs inside
/// the completion transaction.
pub async fn originals_by_ids(
    conn: &mut PgConnection,
    word_ids: &[i32],
) -> Result<HashMap<i32, String>, sqlx::Error> {
    let rows = sqlx::query("SELECT id, original FROM words WHERE id = ANY($1)")
        .bind(word_ids)
        .fetch_all(conn)
        .await?;

    let mut map = HashMap::with_capacity(rows.len());
    for row in &rows {
        map.insert(row.try_get("id")?, row.try_get("original")?);
    }
    Ok(map)
}

/// Inserts a word if its surface form is not already present. Used by the
/// seeding path only; ingestion proper is an external concern.
pub async fn insert_word_if_absent(
    pool: &PgPool,
    original: &str,
    transcription: Option<&str>,
    translations: &HashMap<String, String>,
    notes: Option<&str>,
) -> Result<bool, sqlx::Error> {
    let translations_json =
        serde_json::to_value(translations).map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let result = sqlx::query(
        r#"
        INSERT INTO words (original, transcription, translations, notes)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (original) DO NOTHING
        "#,
    )
    .bind(original)
    .bind(transcription)
    .bind(translations_json)
    .bind(notes)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
