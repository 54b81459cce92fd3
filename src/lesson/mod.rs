pub mod complete;

use chrono::Utc;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::operations::progress::{self, CandidateWord, StageFilter};
use crate::db::operations::user;
use crate::db::operations::words::{self, Word};
use crate::db::Database;
use crate::exercises::{synthesize, Exercise, SynthesisError};
use crate::srs::eligibility::exercises_for_stage;
use crate::srs::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonMode {
    New,
    Continue,
    Review,
}

impl LessonMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LessonMode::New => "new",
            LessonMode::Continue => "continue",
            LessonMode::Review => "review",
        }
    }
}

#[derive(Debug, Error)]
pub enum LessonError {
    #[error("no words available for selected mode")]
    NoWords,
    #[error("user not found")]
    UserNotFound,
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}

/// Builds one lesson for the user: selects candidates for `mode`, synthesizes
/// every eligible exercise per word and interleaves the result.
pub async fn build_lesson(
    db: &Database,
    user_id: i32,
    mode: LessonMode,
) -> Result<Vec<Exercise>, LessonError> {
    let user = user::get_user(db.pool(), user_id)
        .await?
        .ok_or(LessonError::UserNotFound)?;
    let limit = i64::from(user.words_per_lesson);

    let candidates = match mode {
        LessonMode::New => words::words_without_progress(db.pool(), user_id, limit)
            .await?
            .into_iter()
            // Unseen words are drilled as stage `new`.
            .map(|word| CandidateWord {
                word,
                stage: Stage::New,
            })
            .collect(),
        LessonMode::Continue => {
            progress::due_words(db.pool(), user_id, StageFilter::NotLearned, Utc::now(), limit)
                .await?
        }
        LessonMode::Review => {
            progress::due_words(db.pool(), user_id, StageFilter::Learned, Utc::now(), limit)
                .await?
        }
    };

    if candidates.is_empty() {
        return Err(LessonError::NoWords);
    }

    let pool_words = words::all_words(db.pool()).await?;
    let mut rng = rand::rng();
    let exercises = assemble(&mut rng, &candidates, &pool_words, &user.display_language)?;

    tracing::debug!(
        user_id,
        mode = mode.as_str(),
        words = candidates.len(),
        exercises = exercises.len(),
        "lesson assembled"
    );

    Ok(exercises)
}

/// Synthesizes every eligible kind per candidate word (in the eligibility
/// table's order) and interleaves the per-word lists into delivery order.
pub fn assemble<R: Rng + ?Sized>(
    rng: &mut R,
    selected: &[CandidateWord],
    pool: &[Word],
    display_lang: &str,
) -> Result<Vec<Exercise>, SynthesisError> {
    let mut per_word = Vec::with_capacity(selected.len());
    for candidate in selected {
        let kinds = exercises_for_stage(candidate.stage);
        let mut list = Vec::with_capacity(kinds.len());
        for kind in kinds {
            list.push(synthesize(rng, &candidate.word, display_lang, pool, *kind)?);
        }
        per_word.push(list);
    }
    Ok(interleave(rng, per_word))
}

/// Round-based interleaving: round n collects each word's nth exercise,
/// shuffles that round independently, and rounds are concatenated in order.
/// Every word's own exercises keep their relative order, and earlier-indexed
/// kinds are always delivered before later-indexed ones.
pub fn interleave<R: Rng + ?Sized>(rng: &mut R, per_word: Vec<Vec<Exercise>>) -> Vec<Exercise> {
    let max_len = per_word.iter().map(Vec::len).max().unwrap_or(0);
    let mut ordered = Vec::with_capacity(per_word.iter().map(Vec::len).sum());

    for round in 0..max_len {
        let mut round_exercises: Vec<Exercise> = per_word
            .iter()
            .filter_map(|list| list.get(round).cloned())
            .collect();
        round_exercises.shuffle(rng);
        ordered.extend(round_exercises);
    }

    ordered
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::srs::eligibility::ExerciseKind;

    fn word(id: i32, original: &str, translation: &str) -> Word {
        let mut translations = HashMap::new();
        translations.insert("en".to_string(), translation.to_string());
        Word {
            id,
            original: original.to_string(),
            transcription: None,
            translations,
            notes: None,
        }
    }

    fn pool() -> Vec<Word> {
        vec![
            word(1, "νερό", "water"),
            word(2, "ψωμί", "bread"),
            word(3, "γάλα", "milk"),
            word(4, "κρασί", "wine"),
            word(5, "τυρί", "cheese"),
            word(6, "μήλο", "apple"),
            word(7, "ψάρι", "fish"),
        ]
    }

    fn candidates(pool: &[Word], stage: Stage, count: usize) -> Vec<CandidateWord> {
        pool.iter()
            .take(count)
            .map(|w| CandidateWord {
                word: w.clone(),
                stage,
            })
            .collect()
    }

    #[test]
    fn new_mode_lesson_is_flashcards_then_multiple_choice() {
        let pool = pool();
        let selected = candidates(&pool, Stage::New, 5);
        let mut rng = StdRng::seed_from_u64(21);

        let exercises = assemble(&mut rng, &selected, &pool, "en").unwrap();

        assert_eq!(exercises.len(), 10);
        assert!(exercises[..5]
            .iter()
            .all(|e| e.kind() == ExerciseKind::Flashcard));
        assert!(exercises[5..]
            .iter()
            .all(|e| e.kind() == ExerciseKind::MultipleChoice));
    }

    #[test]
    fn exercise_count_is_sum_of_eligible_kinds() {
        let pool = pool();
        let mut selected = candidates(&pool, Stage::Stage2, 3); // 3 kinds each
        selected.push(CandidateWord {
            word: pool[5].clone(),
            stage: Stage::Stage4, // 2 kinds
        });
        let mut rng = StdRng::seed_from_u64(4);

        let exercises = assemble(&mut rng, &selected, &pool, "en").unwrap();
        assert_eq!(exercises.len(), 3 * 3 + 2);
    }

    #[test]
    fn interleaving_preserves_each_words_own_order() {
        let pool = pool();
        let selected = candidates(&pool, Stage::Stage2, 4);
        let mut rng = StdRng::seed_from_u64(99);

        let exercises = assemble(&mut rng, &selected, &pool, "en").unwrap();

        let expected = [
            ExerciseKind::MultipleChoice,
            ExerciseKind::MultipleChoiceReverse,
            ExerciseKind::FillBlank,
        ];
        for candidate in &selected {
            let kinds: Vec<ExerciseKind> = exercises
                .iter()
                .filter(|e| e.word_id() == candidate.word.id)
                .map(|e| e.kind())
                .collect();
            assert_eq!(kinds, expected);
        }
    }

    #[test]
    fn rounds_do_not_mix() {
        let pool = pool();
        let selected = candidates(&pool, Stage::Stage1, 5);
        let mut rng = StdRng::seed_from_u64(13);

        let exercises = assemble(&mut rng, &selected, &pool, "en").unwrap();

        // Round 0 is everyone's first kind, round 1 everyone's second.
        assert!(exercises[..5]
            .iter()
            .all(|e| e.kind() == ExerciseKind::MultipleChoice));
        assert!(exercises[5..]
            .iter()
            .all(|e| e.kind() == ExerciseKind::MultipleChoiceReverse));
    }

    #[test]
    fn ragged_word_lists_interleave_by_available_rounds() {
        let mut rng = StdRng::seed_from_u64(2);
        let pool = pool();

        // One stage_2 word (3 exercises) alongside one stage_4 word (2).
        let selected = vec![
            CandidateWord {
                word: pool[0].clone(),
                stage: Stage::Stage2,
            },
            CandidateWord {
                word: pool[1].clone(),
                stage: Stage::Stage4,
            },
        ];
        let exercises = assemble(&mut rng, &selected, &pool, "en").unwrap();

        assert_eq!(exercises.len(), 5);
        // The final round contains only the stage_2 word's third kind.
        assert_eq!(exercises[4].word_id(), 1);
        assert_eq!(exercises[4].kind(), ExerciseKind::FillBlank);
    }

    #[test]
    fn interleave_of_nothing_is_empty() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(interleave(&mut rng, Vec::new()).is_empty());
    }
}
