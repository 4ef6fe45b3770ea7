use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};

use wnn_cli::commands::{config_ops, convert_ops, session_ops, store_ops};

#[derive(Parser)]
#[command(name = "wnntool", about = "Word store maintenance and conversion diagnostics")]
struct Cli {
    /// Word store file (default: ~/.local/share/wnn/words.wnds)
    #[arg(long, global = true)]
    store: Option<String>,
    /// Settings TOML replacing the built-in defaults
    #[arg(long, global = true)]
    settings: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Manage user-registered words
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Inspect or reset learned words
    Learned {
        #[command(subcommand)]
        action: LearnedAction,
    },
    /// Export user and learned words as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Import words from a JSON export
    Import {
        /// JSON file written by `export`
        input: String,
    },
    /// Write a checkpoint and truncate the write-ahead log
    Checkpoint,
    /// Predict candidates for a key
    Predict {
        /// Fixed dictionary TSV (stroke, candidate, frequency)
        #[arg(long)]
        fixed: String,
        /// Dictionary language: jp or en
        #[arg(long, default_value = "jp")]
        lang: String,
        /// Search without the word store
        #[arg(long)]
        no_store: bool,
        /// Number of candidates
        #[arg(short, long, default_value = "10")]
        n: usize,
        /// Key (reading) to predict from
        key: String,
    },
    /// Consecutive-clause conversion of a reading
    Convert {
        /// Fixed dictionary TSV (stroke, candidate, frequency)
        #[arg(long)]
        fixed: String,
        /// Search without the word store
        #[arg(long)]
        no_store: bool,
        /// Alternatives listed per clause
        #[arg(short, long, default_value = "1")]
        n: usize,
        /// Reading to convert
        reading: String,
    },
    /// Replay a key script through a conversion session
    Session {
        /// Fixed dictionary TSV (stroke, candidate, frequency)
        #[arg(long)]
        fixed: String,
        /// Dictionary language: jp or en
        #[arg(long, default_value = "jp")]
        lang: String,
        /// Letter conversion table TOML with a [mappings] section
        #[arg(long)]
        table: Option<String>,
        /// Search without the word store
        #[arg(long)]
        no_store: bool,
        /// Print state after every key
        #[arg(short, long)]
        verbose: bool,
        /// Keys to type; `{convert}`, `{enter}`, `{select:N}` ... press special keys
        script: String,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
    /// Validate a letter conversion table
    TableValidate {
        /// Path to the TOML file
        file: String,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Register a word
    Add {
        /// Reading
        stroke: String,
        /// Surface form
        candidate: String,
    },
    /// Remove a word
    Remove {
        /// Reading
        stroke: String,
        /// Surface form
        candidate: String,
    },
    /// List all registered words
    List,
    /// Remove every registered word
    Clear,
}

#[derive(Subcommand)]
enum LearnedAction {
    /// List learned words
    List,
    /// Forget every learned word
    Clear,
}

fn main() {
    wnn_cli::trace_init::init_tracing();
    let cli = Cli::parse();

    let store_path = PathBuf::from(cli.store.unwrap_or_else(store_ops::default_store_path));
    let path = store_path.as_path();
    let settings = config_ops::load_settings(cli.settings.as_deref().map(Path::new));
    let store_for = |no_store: bool| (!no_store).then_some(path);

    match cli.command {
        Command::User { action } => match action {
            UserAction::Add { stroke, candidate } => {
                store_ops::user_add(path, &settings, &stroke, &candidate)
            }
            UserAction::Remove { stroke, candidate } => {
                store_ops::user_remove(path, &settings, &stroke, &candidate)
            }
            UserAction::List => store_ops::user_list(path, &settings),
            UserAction::Clear => store_ops::user_clear(path, &settings),
        },
        Command::Learned { action } => match action {
            LearnedAction::List => store_ops::learned_list(path, &settings),
            LearnedAction::Clear => store_ops::learned_clear(path, &settings),
        },
        Command::Export { output } => store_ops::export(path, &settings, output.as_deref()),
        Command::Import { input } => store_ops::import(path, &settings, &input),
        Command::Checkpoint => store_ops::checkpoint(path, &settings),
        Command::Predict {
            fixed,
            lang,
            no_store,
            n,
            key,
        } => {
            let language = convert_ops::parse_language(&lang);
            let coordinator = convert_ops::coordinator(&fixed, settings, language, store_for(no_store));
            convert_ops::predict_cmd(coordinator, &key, n);
        }
        Command::Convert {
            fixed,
            no_store,
            n,
            reading,
        } => {
            let language = wnn_core::settings::Language::Jp;
            let coordinator = convert_ops::coordinator(&fixed, settings, language, store_for(no_store));
            convert_ops::convert_cmd(coordinator, &reading, n);
        }
        Command::Session {
            fixed,
            lang,
            table,
            no_store,
            verbose,
            script,
        } => {
            let language = convert_ops::parse_language(&lang);
            let mut settings = settings;
            settings.engine.default_language = language;
            let coordinator =
                convert_ops::coordinator(&fixed, settings.clone(), language, store_for(no_store));
            let converter = session_ops::converter(table.as_deref());
            session_ops::session_cmd(settings, coordinator, converter, &script, verbose);
        }
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
        Command::TableValidate { file } => config_ops::table_validate(&file),
    }
}
