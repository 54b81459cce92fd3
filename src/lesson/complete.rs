use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::operations::{progress, words};
use crate::db::Database;
use crate::srs::eligibility::ExerciseKind;
use crate::srs::{advance, Stage};

/// One submitted exercise outcome, persisted verbatim as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExerciseOutcome {
    pub word_id: i32,
    pub exercise_type: ExerciseKind,
    pub is_correct: bool,
    pub answer_given: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_spent_ms: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct WordResult {
    pub word_id: i32,
    pub original: String,
    pub errors: u32,
    pub previous_stage: Option<Stage>,
    pub new_stage: Stage,
}

#[derive(Debug, Clone, Serialize)]
pub struct LessonSummary {
    pub total_exercises: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub words_advanced: usize,
    pub words_stayed: usize,
    pub words_rolled_back: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct CompleteLessonResponse {
    pub words: Vec<WordResult>,
    pub summary: LessonSummary,
}

/// One pending progress upsert computed by the planner.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub word_id: i32,
    pub new_stage: Stage,
    pub next_review_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CompletionPlan {
    pub updates: Vec<ProgressUpdate>,
    pub response: CompleteLessonResponse,
}

#[derive(Debug, Error)]
pub enum CompleteError {
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Pure progression math over an outcome batch: aggregates errors per word,
/// runs the stage model and classifies each word into exactly one summary
/// bucket. Words appear in first-occurrence order of the batch. `existing`
/// holds the pre-read stages; absent words are treated as `new` with a null
/// previous stage in the report.
pub fn plan_completion(
    outcomes: &[ExerciseOutcome],
    existing: &HashMap<i32, Stage>,
    originals: &HashMap<i32, String>,
    now: DateTime<Utc>,
) -> CompletionPlan {
    // Error count per word, explicitly initialized to 0 so "seen but
    // perfect" is distinguishable from "not in this batch".
    let mut word_order: Vec<i32> = Vec::new();
    let mut errors_by_word: HashMap<i32, u32> = HashMap::new();
    for outcome in outcomes {
        let entry = errors_by_word.entry(outcome.word_id).or_insert_with(|| {
            word_order.push(outcome.word_id);
            0
        });
        if !outcome.is_correct {
            *entry += 1;
        }
    }

    let mut updates = Vec::with_capacity(word_order.len());
    let mut word_results = Vec::with_capacity(word_order.len());
    let mut advanced = 0;
    let mut stayed = 0;
    let mut rolled_back = 0;

    for word_id in word_order {
        let errors = errors_by_word[&word_id];
        let previous_stage = existing.get(&word_id).copied();
        let current_stage = previous_stage.unwrap_or(Stage::New);

        let progression = advance(current_stage, errors);
        let next_review_at = now + Duration::minutes(progression.interval_minutes);

        updates.push(ProgressUpdate {
            word_id,
            new_stage: progression.new_stage,
            next_review_at,
        });

        word_results.push(WordResult {
            word_id,
            original: originals.get(&word_id).cloned().unwrap_or_default(),
            errors,
            previous_stage,
            new_stage: progression.new_stage,
        });

        match errors {
            0 => advanced += 1,
            1 => stayed += 1,
            _ => rolled_back += 1,
        }
    }

    let correct = outcomes.iter().filter(|o| o.is_correct).count();

    CompletionPlan {
        updates,
        response: CompleteLessonResponse {
            words: word_results,
            summary: LessonSummary {
                total_exercises: outcomes.len(),
                correct,
                incorrect: outcomes.len() - correct,
                words_advanced: advanced,
                words_stayed: stayed,
                words_rolled_back: rolled_back,
            },
        },
    }
}

/// Applies a lesson's outcomes as one atomic unit: history insert, progress
/// reads, stage transitions and upserts all commit together or not at all.
pub async fn apply_results(
    db: &Database,
    user_id: i32,
    outcomes: &[ExerciseOutcome],
) -> Result<CompleteLessonResponse, CompleteError> {
    let mut tx = db.pool().begin().await?;

    progress::insert_results(&mut tx, user_id, outcomes).await?;

    let mut word_ids: Vec<i32> = Vec::new();
    for outcome in outcomes {
        if !word_ids.contains(&outcome.word_id) {
            word_ids.push(outcome.word_id);
        }
    }

    let existing = progress::progress_stages(&mut tx, user_id, &word_ids).await?;
    let originals = words::originals_by_ids(&mut tx, &word_ids).await?;

    let now = Utc::now();
    let plan = plan_completion(outcomes, &existing, &originals, now);

    for update in &plan.updates {
        progress::upsert_progress(
            &mut tx,
            user_id,
            update.word_id,
            update.new_stage,
            update.next_review_at,
            now,
        )
        .await?;
    }

    tx.commit().await?;

    tracing::debug!(
        user_id,
        words = plan.response.words.len(),
        exercises = outcomes.len(),
        "lesson results applied"
    );

    Ok(plan.response)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(word_id: i32, kind: ExerciseKind, correct: bool) -> ExerciseOutcome {
        ExerciseOutcome {
            word_id,
            exercise_type: kind,
            is_correct: correct,
            answer_given: None,
            time_spent_ms: None,
        }
    }

    fn originals(ids: &[(i32, &str)]) -> HashMap<i32, String> {
        ids.iter().map(|(id, s)| (*id, s.to_string())).collect()
    }

    #[test]
    fn single_error_holds_stage_and_schedules_now() {
        let outcomes = vec![
            outcome(1, ExerciseKind::MultipleChoice, true),
            outcome(1, ExerciseKind::MultipleChoiceReverse, false),
            outcome(1, ExerciseKind::FillBlank, true),
        ];
        let existing = HashMap::from([(1, Stage::Stage2)]);
        let now = Utc::now();

        let plan = plan_completion(&outcomes, &existing, &originals(&[(1, "νερό")]), now);

        assert_eq!(plan.response.words.len(), 1);
        let word = &plan.response.words[0];
        assert_eq!(word.errors, 1);
        assert_eq!(word.previous_stage, Some(Stage::Stage2));
        assert_eq!(word.new_stage, Stage::Stage2);
        assert_eq!(plan.updates[0].next_review_at, now);
        assert_eq!(plan.response.summary.words_stayed, 1);
        assert_eq!(plan.response.summary.words_advanced, 0);
        assert_eq!(plan.response.summary.words_rolled_back, 0);
    }

    #[test]
    fn unseen_word_with_perfect_outcomes_advances_from_new() {
        let outcomes = vec![
            outcome(7, ExerciseKind::Flashcard, true),
            outcome(7, ExerciseKind::MultipleChoice, true),
        ];
        let now = Utc::now();

        let plan = plan_completion(&outcomes, &HashMap::new(), &originals(&[(7, "ψωμί")]), now);

        let word = &plan.response.words[0];
        assert_eq!(word.previous_stage, None);
        assert_eq!(word.new_stage, Stage::Stage1);
        // stage_1 carries a 0-minute interval: due immediately.
        assert_eq!(plan.updates[0].next_review_at, now);
        assert_eq!(plan.response.summary.words_advanced, 1);
    }

    #[test]
    fn advancing_to_stage_3_rests_for_a_day() {
        let outcomes = vec![outcome(2, ExerciseKind::FillBlank, true)];
        let existing = HashMap::from([(2, Stage::Stage2)]);
        let now = Utc::now();

        let plan = plan_completion(&outcomes, &existing, &originals(&[(2, "γάλα")]), now);

        assert_eq!(plan.updates[0].new_stage, Stage::Stage3);
        assert_eq!(plan.updates[0].next_review_at, now + Duration::minutes(1440));
    }

    #[test]
    fn repeated_errors_roll_back_one_stage() {
        let outcomes = vec![
            outcome(3, ExerciseKind::Scramble, false),
            outcome(3, ExerciseKind::FillBlank, false),
        ];
        let existing = HashMap::from([(3, Stage::Learned)]);
        let now = Utc::now();

        let plan = plan_completion(&outcomes, &existing, &originals(&[(3, "κρασί")]), now);

        assert_eq!(plan.response.words[0].new_stage, Stage::Stage4);
        assert_eq!(plan.response.summary.words_rolled_back, 1);
        assert_eq!(plan.updates[0].next_review_at, now);
    }

    #[test]
    fn summary_counts_cover_every_bucket_exactly_once() {
        let outcomes = vec![
            // word 1: perfect
            outcome(1, ExerciseKind::Flashcard, true),
            outcome(1, ExerciseKind::MultipleChoice, true),
            // word 2: one miss
            outcome(2, ExerciseKind::MultipleChoice, false),
            outcome(2, ExerciseKind::FillBlank, true),
            // word 3: two misses
            outcome(3, ExerciseKind::Scramble, false),
            outcome(3, ExerciseKind::FillBlank, false),
        ];
        let existing = HashMap::from([
            (1, Stage::Stage1),
            (2, Stage::Stage2),
            (3, Stage::Stage3),
        ]);
        let now = Utc::now();

        let plan = plan_completion(
            &outcomes,
            &existing,
            &originals(&[(1, "α"), (2, "β"), (3, "γ")]),
            now,
        );

        let summary = &plan.response.summary;
        assert_eq!(summary.total_exercises, 6);
        assert_eq!(summary.correct, 3);
        assert_eq!(summary.incorrect, 3);
        assert_eq!(summary.words_advanced, 1);
        assert_eq!(summary.words_stayed, 1);
        assert_eq!(summary.words_rolled_back, 1);
        assert_eq!(
            summary.words_advanced + summary.words_stayed + summary.words_rolled_back,
            plan.response.words.len()
        );
    }

    #[test]
    fn words_report_in_first_occurrence_order() {
        let outcomes = vec![
            outcome(5, ExerciseKind::Flashcard, true),
            outcome(2, ExerciseKind::Flashcard, true),
            outcome(5, ExerciseKind::MultipleChoice, true),
            outcome(9, ExerciseKind::Flashcard, true),
        ];
        let now = Utc::now();

        let plan = plan_completion(&outcomes, &HashMap::new(), &HashMap::new(), now);

        let ids: Vec<i32> = plan.response.words.iter().map(|w| w.word_id).collect();
        assert_eq!(ids, vec![5, 2, 9]);
    }

    #[test]
    fn stage_names_serialize_in_wire_format() {
        let result = WordResult {
            word_id: 1,
            original: "νερό".to_string(),
            errors: 0,
            previous_stage: None,
            new_stage: Stage::Stage1,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["previous_stage"], serde_json::Value::Null);
        assert_eq!(json["new_stage"], "stage_1");
    }
}
