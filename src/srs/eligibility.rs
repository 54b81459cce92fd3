use serde::{Deserialize, Serialize};

use super::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    Flashcard,
    MultipleChoice,
    MultipleChoiceReverse,
    FillBlank,
    Scramble,
}

impl ExerciseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Flashcard => "flashcard",
            ExerciseKind::MultipleChoice => "multiple_choice",
            ExerciseKind::MultipleChoiceReverse => "multiple_choice_reverse",
            ExerciseKind::FillBlank => "fill_blank",
            ExerciseKind::Scramble => "scramble",
        }
    }
}

/// Exercise kinds a word is drilled with at each stage. The list order is
/// policy: it fixes which interleaving round each kind lands in, moving from
/// recognition toward recall as the stage rises.
pub fn exercises_for_stage(stage: Stage) -> &'static [ExerciseKind] {
    match stage {
        Stage::New => &[ExerciseKind::Flashcard, ExerciseKind::MultipleChoice],
        Stage::Stage1 => &[
            ExerciseKind::MultipleChoice,
            ExerciseKind::MultipleChoiceReverse,
        ],
        Stage::Stage2 => &[
            ExerciseKind::MultipleChoice,
            ExerciseKind::MultipleChoiceReverse,
            ExerciseKind::FillBlank,
        ],
        Stage::Stage3 | Stage::Stage4 | Stage::Learned => {
            &[ExerciseKind::Scramble, ExerciseKind::FillBlank]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::srs::STAGES;

    #[test]
    fn every_stage_has_exercises() {
        for stage in STAGES {
            assert!(!exercises_for_stage(stage).is_empty());
        }
    }

    #[test]
    fn new_words_start_with_a_flashcard() {
        assert_eq!(
            exercises_for_stage(Stage::New),
            &[ExerciseKind::Flashcard, ExerciseKind::MultipleChoice]
        );
    }

    #[test]
    fn stage_2_is_the_widest_drill() {
        assert_eq!(exercises_for_stage(Stage::Stage2).len(), 3);
    }

    #[test]
    fn kind_names_match_wire_format() {
        assert_eq!(
            serde_json::to_string(&ExerciseKind::MultipleChoiceReverse).unwrap(),
            "\"multiple_choice_reverse\""
        );
        assert_eq!(ExerciseKind::FillBlank.as_str(), "fill_blank");
    }
}
