use std::fs;
use std::path::Path;
use std::process;

use serde::{Deserialize, Serialize};

use wnn_core::dict::{AddStatus, DictionaryStore};
use wnn_core::settings::Settings;
use wnn_core::word::{PartOfSpeech, WnnWord, WordKind};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

pub fn default_store_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    format!("{home}/.local/share/wnn/words.wnds")
}

pub fn open_store(path: &Path, settings: &Settings) -> DictionaryStore {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        die!(fs::create_dir_all(dir), "Error creating {}: {}", dir.display());
    }
    die!(
        DictionaryStore::open(path, settings.store_limits()),
        "Error opening word store: {}"
    )
}

/// One exported word with its connection attributes.
#[derive(Debug, Serialize, Deserialize)]
struct ExportedWord {
    stroke: String,
    candidate: String,
    #[serde(default)]
    left: i32,
    #[serde(default)]
    right: i32,
}

impl ExportedWord {
    fn new(stroke: &str, candidate: &str, pos: PartOfSpeech) -> Self {
        Self {
            stroke: stroke.to_string(),
            candidate: candidate.to_string(),
            left: pos.left,
            right: pos.right,
        }
    }

    fn to_word(&self) -> WnnWord {
        WnnWord::new(self.candidate.as_str(), self.stroke.as_str())
            .with_part_of_speech(PartOfSpeech::new(self.left, self.right))
    }
}

/// A learned row and the word it followed, oldest first.
#[derive(Debug, Serialize, Deserialize)]
struct ExportedLearned {
    #[serde(flatten)]
    word: ExportedWord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prev: Option<ExportedWord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ExportFile {
    #[serde(default)]
    user: Vec<ExportedWord>,
    #[serde(default)]
    learned: Vec<ExportedLearned>,
}

fn exported(words: Vec<WnnWord>) -> Vec<ExportedWord> {
    words
        .iter()
        .map(|w| ExportedWord::new(&w.stroke, &w.candidate, w.part_of_speech))
        .collect()
}

fn exported_learned(store: &DictionaryStore) -> Vec<ExportedLearned> {
    store
        .rows()
        .iter()
        .filter(|r| r.kind == WordKind::Learned)
        .map(|r| ExportedLearned {
            word: ExportedWord::new(&r.stroke, &r.candidate, r.part_of_speech),
            prev: r
                .prev
                .as_ref()
                .map(|p| ExportedWord::new(&p.stroke, &p.candidate, p.part_of_speech)),
        })
        .collect()
}

fn print_words(words: &[WnnWord]) {
    if words.is_empty() {
        println!("(empty)");
        return;
    }
    for w in words {
        println!("{}\t{}", w.stroke, w.candidate);
    }
    println!("---");
    println!("{} entries", words.len());
}

pub fn user_add(path: &Path, settings: &Settings, stroke: &str, candidate: &str) {
    let mut store = open_store(path, settings);
    let report = die!(
        store.add_words(&[WnnWord::new(candidate, stroke)]),
        "Error adding word: {}"
    );
    match report.statuses.first() {
        Some(AddStatus::Added) => println!("Added: {stroke} → {candidate}"),
        _ => println!("Already exists: {stroke} → {candidate}"),
    }
}

pub fn user_remove(path: &Path, settings: &Settings, stroke: &str, candidate: &str) {
    let mut store = open_store(path, settings);
    let removed = die!(
        store.remove_words(&[WnnWord::new(candidate, stroke)]),
        "Error removing word: {}"
    );
    if removed > 0 {
        println!("Removed: {stroke} → {candidate}");
    } else {
        println!("Not found: {stroke} → {candidate}");
    }
}

pub fn user_list(path: &Path, settings: &Settings) {
    print_words(&open_store(path, settings).user_words());
}

pub fn user_clear(path: &Path, settings: &Settings) {
    let mut store = open_store(path, settings);
    die!(store.clear_user(), "Error clearing user words: {}");
    println!("User words cleared");
}

pub fn learned_list(path: &Path, settings: &Settings) {
    print_words(&open_store(path, settings).learned_words());
}

pub fn learned_clear(path: &Path, settings: &Settings) {
    let mut store = open_store(path, settings);
    die!(store.clear_learned(), "Error clearing learned words: {}");
    println!("Learned words cleared");
}

pub fn export(path: &Path, settings: &Settings, output: Option<&str>) {
    let store = open_store(path, settings);
    let file = ExportFile {
        user: exported(store.user_words()),
        learned: exported_learned(&store),
    };
    let json = die!(serde_json::to_string_pretty(&file), "Error encoding JSON: {}");
    match output {
        Some(out) => {
            die!(fs::write(out, json + "\n"), "Error writing {out}: {}");
            eprintln!(
                "Exported {} user and {} learned words to {out}",
                file.user.len(),
                file.learned.len()
            );
        }
        None => println!("{json}"),
    }
}

pub fn import(path: &Path, settings: &Settings, input: &str) {
    let content = die!(fs::read_to_string(input), "Error reading {input}: {}");
    let file: ExportFile = die!(serde_json::from_str(&content), "Error parsing {input}: {}");
    let mut store = open_store(path, settings);

    let user: Vec<WnnWord> = file.user.iter().map(ExportedWord::to_word).collect();
    let report = die!(store.add_words(&user), "Error importing user words: {}");

    for entry in &file.learned {
        let prev = entry.prev.as_ref().map(ExportedWord::to_word);
        die!(
            store.learn(&entry.word.to_word(), prev.as_ref()),
            "Error importing learned word: {}"
        );
    }
    println!(
        "Imported: {} user words added, {} duplicates, {} learned words",
        report.added(),
        report.duplicates(),
        store.learned_words().len()
    );
}

pub fn checkpoint(path: &Path, settings: &Settings) {
    let mut store = open_store(path, settings);
    die!(store.checkpoint(), "Error writing checkpoint: {}");
    println!(
        "Checkpoint written: {} rows → {}",
        store.rows().len(),
        path.display()
    );
}
