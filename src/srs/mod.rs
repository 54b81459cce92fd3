pub mod eligibility;

use serde::{Deserialize, Serialize};

/// Mastery stages in progression order. `New` is the floor, `Learned` the
/// ceiling; both are valid steady states.
pub const STAGES: [Stage; 6] = [
    Stage::New,
    Stage::Stage1,
    Stage::Stage2,
    Stage::Stage3,
    Stage::Stage4,
    Stage::Learned,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    #[serde(rename = "new")]
    New,
    #[serde(rename = "stage_1")]
    Stage1,
    #[serde(rename = "stage_2")]
    Stage2,
    #[serde(rename = "stage_3")]
    Stage3,
    #[serde(rename = "stage_4")]
    Stage4,
    #[serde(rename = "learned")]
    Learned,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::New => "new",
            Stage::Stage1 => "stage_1",
            Stage::Stage2 => "stage_2",
            Stage::Stage3 => "stage_3",
            Stage::Stage4 => "stage_4",
            Stage::Learned => "learned",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(Stage::New),
            "stage_1" => Some(Stage::Stage1),
            "stage_2" => Some(Stage::Stage2),
            "stage_3" => Some(Stage::Stage3),
            "stage_4" => Some(Stage::Stage4),
            "learned" => Some(Stage::Learned),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        STAGES.iter().position(|s| s == self).unwrap_or(0)
    }

    /// Next stage in the ordering, clamped at `Learned`.
    pub fn next(&self) -> Stage {
        let idx = (self.index() + 1).min(STAGES.len() - 1);
        STAGES[idx]
    }

    /// Previous stage in the ordering, clamped at `New`.
    pub fn prev(&self) -> Stage {
        let idx = self.index().saturating_sub(1);
        STAGES[idx]
    }
}

/// Re-exposure interval in minutes applied when advancing TO `stage`.
/// Early stages re-surface within the same session; from `stage_3` on the
/// word rests for a day.
fn interval_for(stage: Stage) -> i64 {
    match stage {
        Stage::Stage3 | Stage::Stage4 | Stage::Learned => 1440,
        _ => 0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progression {
    pub new_stage: Stage,
    pub interval_minutes: i64,
}

/// Stage transition after a lesson: 0 errors advance one stage, exactly 1
/// error holds the stage, more than 1 rolls back one stage. Intervals are
/// taken from the per-destination table; hold and rollback always make the
/// word immediately due again.
pub fn advance(current: Stage, error_count: u32) -> Progression {
    if error_count == 0 {
        let new_stage = current.next();
        return Progression {
            new_stage,
            interval_minutes: interval_for(new_stage),
        };
    }

    if error_count == 1 {
        return Progression {
            new_stage: current,
            interval_minutes: 0,
        };
    }

    Progression {
        new_stage: current.prev(),
        interval_minutes: 0,
    }
}
