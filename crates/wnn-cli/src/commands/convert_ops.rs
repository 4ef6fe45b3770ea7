use std::fs;
use std::path::Path;
use std::process;
use std::sync::{Arc, RwLock};

use wnn_core::composing::StrSegment;
use wnn_core::dict::{DictionaryStore, DictionaryTarget, FixedDictionary};
use wnn_core::search::SearchCoordinator;
use wnn_core::settings::{Language, Settings};

use super::store_ops;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn parse_language(lang: &str) -> Language {
    match lang {
        "jp" | "ja" => Language::Jp,
        "en" => Language::En,
        other => {
            eprintln!("Error: unknown language {other:?} (expected jp or en)");
            process::exit(1);
        }
    }
}

/// Fixed dictionary with `tsv` loaded as the table for `language`.
pub fn load_fixed(tsv: &str, language: Language, settings: &Settings) -> FixedDictionary {
    let content = die!(fs::read_to_string(tsv), "Error reading {tsv}: {}");
    let target = match language {
        Language::Jp => DictionaryTarget::Jp,
        Language::En => DictionaryTarget::En,
    };
    let mut fixed = FixedDictionary::new(&settings.query);
    let loaded = die!(fixed.load_tsv(target, &content), "Error loading {tsv}: {}");
    eprintln!("Loaded {loaded} entries from {tsv}");
    fixed
}

/// Coordinator over a fixed dictionary and, when given, a persistent store.
pub fn coordinator(
    tsv: &str,
    mut settings: Settings,
    language: Language,
    store: Option<&Path>,
) -> SearchCoordinator {
    settings.engine.default_language = language;
    let fixed = load_fixed(tsv, language, &settings);
    let store = match store {
        Some(path) => store_ops::open_store(path, &settings),
        None => DictionaryStore::new(settings.store_limits()),
    };
    SearchCoordinator::new(Box::new(fixed), Arc::new(RwLock::new(store)), &settings)
}

pub fn predict_cmd(mut coordinator: SearchCoordinator, key: &str, n: usize) {
    let found = coordinator.predict(key, 0, None);
    if found == 0 {
        println!("(no candidates)");
        return;
    }
    for (i, w) in coordinator.drain_candidates().iter().take(n).enumerate() {
        println!("#{:>2}: {}\t{}\t{}", i + 1, w.candidate, w.stroke, w.frequency);
    }
}

pub fn convert_cmd(mut coordinator: SearchCoordinator, reading: &str, n: usize) {
    let segments: Vec<StrSegment> = reading.chars().map(|c| StrSegment::new(c.to_string())).collect();
    let clauses = coordinator.convert(&segments);
    let segs: Vec<String> = clauses
        .iter()
        .map(|c| format!("{}({})", c.word.candidate, c.reading))
        .collect();
    println!("{}", segs.join(" | "));
    if n <= 1 {
        return;
    }
    for clause in &clauses {
        coordinator.make_candidate_list_of(clause);
        let alternatives: Vec<String> = coordinator
            .drain_candidates()
            .into_iter()
            .take(n)
            .map(|w| w.candidate)
            .collect();
        println!("  {}: {}", clause.reading, alternatives.join(" "));
    }
}
