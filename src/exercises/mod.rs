use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::operations::words::Word;
use crate::srs::eligibility::ExerciseKind;

/// Fixed cardinality of multiple-choice option lists: 1 correct + 3
/// distractors.
pub const OPTION_COUNT: usize = 4;
const DISTRACTOR_COUNT: usize = OPTION_COUNT - 1;

/// The correct option is always constructed first; presentation shuffling is
/// the delivery surface's concern, which is why `correct_index` is 0 in
/// every instance this module emits.
pub const CORRECT_INDEX: usize = 0;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordPrompt {
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationPrompt {
    pub translation: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScramblePrompt {
    pub translation: String,
    pub scrambled: Vec<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub original: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslationAnswer {
    pub translation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OriginalAnswer {
    pub original: String,
}

/// One concrete exercise instance. Ephemeral: delivered to the client,
/// discarded once answered; only the outcome persists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "exercise_type", rename_all = "snake_case")]
pub enum Exercise {
    Flashcard {
        word_id: i32,
        prompt: WordPrompt,
        answer: TranslationAnswer,
    },
    MultipleChoice {
        word_id: i32,
        prompt: WordPrompt,
        options: Vec<String>,
        correct_index: usize,
    },
    MultipleChoiceReverse {
        word_id: i32,
        prompt: TranslationPrompt,
        options: Vec<ChoiceOption>,
        correct_index: usize,
    },
    FillBlank {
        word_id: i32,
        prompt: TranslationPrompt,
        answer: OriginalAnswer,
    },
    Scramble {
        word_id: i32,
        prompt: ScramblePrompt,
        answer: OriginalAnswer,
    },
}

impl Exercise {
    pub fn word_id(&self) -> i32 {
        match self {
            Exercise::Flashcard { word_id, .. }
            | Exercise::MultipleChoice { word_id, .. }
            | Exercise::MultipleChoiceReverse { word_id, .. }
            | Exercise::FillBlank { word_id, .. }
            | Exercise::Scramble { word_id, .. } => *word_id,
        }
    }

    pub fn kind(&self) -> ExerciseKind {
        match self {
            Exercise::Flashcard { .. } => ExerciseKind::Flashcard,
            Exercise::MultipleChoice { .. } => ExerciseKind::MultipleChoice,
            Exercise::MultipleChoiceReverse { .. } => ExerciseKind::MultipleChoiceReverse,
            Exercise::FillBlank { .. } => ExerciseKind::FillBlank,
            Exercise::Scramble { .. } => ExerciseKind::Scramble,
        }
    }
}

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("need at least {DISTRACTOR_COUNT} distractor words, pool has {0}")]
    NotEnoughDistractors(usize),
}

/// Builds one exercise instance of `kind` for `word`, sourcing distractors
/// from `pool` (minus the target). All randomness comes from the injected
/// `rng` so callers can pin a seeded generator.
pub fn synthesize<R: Rng + ?Sized>(
    rng: &mut R,
    word: &Word,
    display_lang: &str,
    pool: &[Word],
    kind: ExerciseKind,
) -> Result<Exercise, SynthesisError> {
    let translation = word.translation(display_lang);

    match kind {
        ExerciseKind::Flashcard => Ok(Exercise::Flashcard {
            word_id: word.id,
            prompt: word_prompt(word),
            answer: TranslationAnswer { translation },
        }),
        ExerciseKind::MultipleChoice => {
            let distractors = draw_distractors(rng, word, pool)?;
            let mut options = Vec::with_capacity(OPTION_COUNT);
            options.push(translation);
            options.extend(distractors.iter().map(|d| d.translation(display_lang)));
            Ok(Exercise::MultipleChoice {
                word_id: word.id,
                prompt: word_prompt(word),
                options,
                correct_index: CORRECT_INDEX,
            })
        }
        ExerciseKind::MultipleChoiceReverse => {
            let distractors = draw_distractors(rng, word, pool)?;
            let mut options = Vec::with_capacity(OPTION_COUNT);
            options.push(ChoiceOption {
                original: word.original.clone(),
                transcription: word.transcription.clone(),
            });
            options.extend(distractors.iter().map(|d| ChoiceOption {
                original: d.original.clone(),
                transcription: d.transcription.clone(),
            }));
            Ok(Exercise::MultipleChoiceReverse {
                word_id: word.id,
                prompt: TranslationPrompt {
                    translation,
                    notes: word.notes.clone(),
                },
                options,
                correct_index: CORRECT_INDEX,
            })
        }
        ExerciseKind::FillBlank => Ok(Exercise::FillBlank {
            word_id: word.id,
            prompt: TranslationPrompt {
                translation,
                notes: word.notes.clone(),
            },
            answer: OriginalAnswer {
                original: word.original.clone(),
            },
        }),
        ExerciseKind::Scramble => Ok(Exercise::Scramble {
            word_id: word.id,
            prompt: ScramblePrompt {
                translation,
                scrambled: scramble_word(rng, &word.original),
                notes: word.notes.clone(),
            },
            answer: OriginalAnswer {
                original: word.original.clone(),
            },
        }),
    }
}

fn word_prompt(word: &Word) -> WordPrompt {
    WordPrompt {
        original: word.original.clone(),
        transcription: word.transcription.clone(),
        notes: word.notes.clone(),
    }
}

/// Draws 3 distinct distractor words uniformly at random from the pool,
/// excluding the target. Pools smaller than that are a synthesis error, not
/// a degraded option list.
fn draw_distractors<'a, R: Rng + ?Sized>(
    rng: &mut R,
    target: &Word,
    pool: &'a [Word],
) -> Result<Vec<&'a Word>, SynthesisError> {
    let candidates: Vec<&Word> = pool.iter().filter(|w| w.id != target.id).collect();
    if candidates.len() < DISTRACTOR_COUNT {
        return Err(SynthesisError::NotEnoughDistractors(candidates.len()));
    }

    Ok(candidates
        .choose_multiple(rng, DISTRACTOR_COUNT)
        .copied()
        .collect())
}

/// Splits the original form on whitespace into word-groups and permutes the
/// characters within each group independently. Letters never migrate across
/// a group boundary.
pub fn scramble_word<R: Rng + ?Sized>(rng: &mut R, original: &str) -> Vec<Vec<String>> {
    original
        .split_whitespace()
        .map(|group| {
            let mut chars: Vec<String> = group.chars().map(|c| c.to_string()).collect();
            chars.shuffle(rng);
            chars
        })
        .collect()
}
