use std::fs;
use std::path::Path;
use std::process;

use wnn_core::settings::Settings;

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

/// Settings from `file`, or the embedded defaults.
pub fn load_settings(file: Option<&Path>) -> Settings {
    match file {
        Some(path) => {
            let content = die!(
                fs::read_to_string(path),
                "Error reading {}: {}",
                path.display()
            );
            die!(wnn_core::settings::parse_settings_toml(&content), "Error: {}")
        }
        None => Settings::default(),
    }
}

pub fn settings_export() {
    print!("{}", wnn_core::settings::default_toml());
}

pub fn settings_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let s = die!(
        wnn_core::settings::parse_settings_toml(&content),
        "Error: {}"
    );
    println!(
        "OK: composing.max_segments={}, user_dictionary.max_words={}, learning_dictionary.max_words={}, candidates.max_results={}",
        s.composing.max_segments,
        s.user_dictionary.max_words,
        s.learning_dictionary.max_words,
        s.candidates.max_results
    );
}

pub fn table_validate(file: &str) {
    let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
    let map = die!(wnn_core::letter::parse_table_toml(&content), "Error: {}");
    println!("OK: {} mappings", map.len());
}
