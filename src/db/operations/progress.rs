use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool, Row};

use crate::db::operations::words::Word;
use crate::lesson::complete::ExerciseOutcome;
use crate::srs::Stage;

/// A candidate word for a lesson, paired with its current mastery stage.
#[derive(Debug, Clone)]
pub struct CandidateWord {
    pub word: Word,
    pub stage: Stage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFilter {
    NotLearned,
    Learned,
}

fn parse_stage(value: &str) -> Result<Stage, sqlx::Error> {
    Stage::parse(value)
        .ok_or_else(|| sqlx::Error::Decode(format!("unknown srs_stage value: {value}").into()))
}

/// Words with a progress row that is due at `as_of`, filtered by whether the
/// word has reached `learned`. Order is uniformly random, capped at the
/// per-lesson limit.
pub async fn due_words(
    pool: &PgPool,
    user_id: i32,
    filter: StageFilter,
    as_of: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<CandidateWord>, sqlx::Error> {
    let query = match filter {
        StageFilter::NotLearned => {
            r#"
            SELECT w.id, w.original, w.transcription, w.translations, w.notes, up.srs_stage
            FROM user_progress up
            JOIN words w ON w.id = up.word_id
            WHERE up.user_id = $1
              AND up.srs_stage != 'learned'
              AND up.next_review_at <= $2
            ORDER BY RANDOM()
            LIMIT $3
            "#
        }
        StageFilter::Learned => {
            r#"
            SELECT w.id, w.original, w.transcription, w.translations, w.notes, up.srs_stage
            FROM user_progress up
            JOIN words w ON w.id = up.word_id
            WHERE up.user_id = $1
              AND up.srs_stage = 'learned'
              AND up.next_review_at <= $2
            ORDER BY RANDOM()
            LIMIT $3
            "#
        }
    };

    let rows = sqlx::query(query)
        .bind(user_id)
        .bind(as_of)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    let mut candidates = Vec::with_capacity(rows.len());
    for row in &rows {
        let translations_json: serde_json::Value = row.try_get("translations")?;
        let translations: HashMap<String, String> = serde_json::from_value(translations_json)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        let stage_text: String = row.try_get("srs_stage")?;

        candidates.push(CandidateWord {
            word: Word {
                id: row.try_get("id")?,
                original: row.try_get("original")?,
                transcription: row.try_get("transcription")?,
                translations,
                notes: row.try_get("notes")?,
            },
            stage: parse_stage(&stage_text)?,
        });
    }

    Ok(candidates)
}

/// Current stages for the given word ids. Absent entries mean the word has
/// never been presented to this user. Runs inside the completion transaction.
pub async fn progress_stages(
    conn: &mut PgConnection,
    user_id: i32,
    word_ids: &[i32],
) -> Result<HashMap<i32, Stage>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT word_id, srs_stage
        FROM user_progress
        WHERE user_id = $1 AND word_id = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(word_ids)
    .fetch_all(conn)
    .await?;

    let mut map = HashMap::with_capacity(rows.len());
    for row in &rows {
        let word_id: i32 = row.try_get("word_id")?;
        let stage_text: String = row.try_get("srs_stage")?;
        map.insert(word_id, parse_stage(&stage_text)?);
    }
    Ok(map)
}

/// Creates or replaces the single progress row for (user, word). Part of the
/// atomic completion unit; the caller owns the transaction.
pub async fn upsert_progress(
    conn: &mut PgConnection,
    user_id: i32,
    word_id: i32,
    stage: Stage,
    next_review_at: DateTime<Utc>,
    last_reviewed_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_progress (user_id, word_id, srs_stage, next_review_at, last_reviewed_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, word_id) DO UPDATE
        SET srs_stage = EXCLUDED.srs_stage,
            next_review_at = EXCLUDED.next_review_at,
            last_reviewed_at = EXCLUDED.last_reviewed_at
        "#,
    )
    .bind(user_id)
    .bind(word_id)
    .bind(stage.as_str())
    .bind(next_review_at)
    .bind(last_reviewed_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Appends every outcome verbatim as audit history. Part of the atomic
/// completion unit; the caller owns the transaction.
pub async fn insert_results(
    conn: &mut PgConnection,
    user_id: i32,
    outcomes: &[ExerciseOutcome],
) -> Result<(), sqlx::Error> {
    for outcome in outcomes {
        sqlx::query(
            r#"
            INSERT INTO exercise_results
                (user_id, word_id, exercise_type, is_correct, answer_given, time_spent_ms)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(user_id)
        .bind(outcome.word_id)
        .bind(outcome.exercise_type.as_str())
        .bind(outcome.is_correct)
        .bind(outcome.answer_given.as_deref())
        .bind(outcome.time_spent_ms)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize)]
pub struct LearnStats {
    pub new_available: i64,
    pub continue_available: i64,
    pub review_available: i64,
    pub total_words: i64,
    pub learned_words: i64,
}

/// Per-mode availability counts plus totals, computed from the same
/// predicates as candidate selection without consuming anything.
pub async fn learn_stats(pool: &PgPool, user_id: i32) -> Result<LearnStats, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT
          (SELECT COUNT(*) FROM words w
           LEFT JOIN user_progress up ON up.word_id = w.id AND up.user_id = $1
           WHERE up.id IS NULL
          ) AS new_available,
          (SELECT COUNT(*) FROM user_progress up
           WHERE up.user_id = $1
             AND up.srs_stage != 'learned'
             AND up.next_review_at <= NOW()
          ) AS continue_available,
          (SELECT COUNT(*) FROM user_progress up
           WHERE up.user_id = $1
             AND up.srs_stage = 'learned'
             AND up.next_review_at <= NOW()
          ) AS review_available,
          (SELECT COUNT(*) FROM words) AS total_words,
          (SELECT COUNT(*) FROM user_progress up
           WHERE up.user_id = $1
             AND up.srs_stage = 'learned'
          ) AS learned_words
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(LearnStats {
        new_available: row.try_get("new_available")?,
        continue_available: row.try_get("continue_available")?,
        review_available: row.try_get("review_available")?,
        total_words: row.try_get("total_words")?,
        learned_words: row.try_get("learned_words")?,
    })
}
