use std::collections::HashMap;

use crate::db::operations::words::insert_word_if_absent;
use crate::db::Database;

struct SeedWord {
    original: &'static str,
    transcription: &'static str,
    en: &'static str,
    ru: &'static str,
}

const STARTER_WORDS: &[SeedWord] = &[
    SeedWord {
        original: "καλημέρα",
        transcription: "kaliméra",
        en: "good morning",
        ru: "доброе утро",
    },
    SeedWord {
        original: "ευχαριστώ",
        transcription: "efcharistó",
        en: "thank you",
        ru: "спасибо",
    },
    SeedWord {
        original: "παρακαλώ",
        transcription: "parakaló",
        en: "please",
        ru: "пожалуйста",
    },
    SeedWord {
        original: "νερό",
        transcription: "neró",
        en: "water",
        ru: "вода",
    },
    SeedWord {
        original: "ψωμί",
        transcription: "psomí",
        en: "bread",
        ru: "хлеб",
    },
    SeedWord {
        original: "σπίτι",
        transcription: "spíti",
        en: "house",
        ru: "дом",
    },
    SeedWord {
        original: "φίλος",
        transcription: "fílos",
        en: "friend",
        ru: "друг",
    },
    SeedWord {
        original: "θάλασσα",
        transcription: "thálassa",
        en: "sea",
        ru: "море",
    },
];

/// Inserts the starter vocabulary when SEED_WORDS=true. Existing entries are
/// left untouched, so re-running on every boot is safe.
pub async fn seed_starter_words(db: &Database) {
    let enabled = std::env::var("SEED_WORDS").unwrap_or_default();
    if enabled != "true" && enabled != "1" {
        return;
    }

    let mut inserted = 0usize;
    for word in STARTER_WORDS {
        let translations: HashMap<String, String> = HashMap::from([
            ("en".to_string(), word.en.to_string()),
            ("ru".to_string(), word.ru.to_string()),
        ]);

        match insert_word_if_absent(
            db.pool(),
            word.original,
            Some(word.transcription),
            &translations,
            None,
        )
        .await
        {
            Ok(true) => inserted += 1,
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(error = %err, original = word.original, "failed to seed word");
            }
        }
    }

    if inserted > 0 {
        tracing::info!(inserted, "seeded starter words");
    } else {
        tracing::debug!("starter words already present");
    }
}
