//! Drive a conversion session from a key script.
//!
//! Plain characters are typed as-is; `{name}` tokens press special keys:
//! `{convert}`, `{enter}`, `{cancel}`, `{bs}`, `{left}`, `{right}`,
//! `{next}`, `{symbol}`, `{select:N}`, `{jp}`, `{en}`, `{learn:on}`,
//! `{learn:off}`, `{{` for a literal brace.

use std::fs;
use std::process;
use std::time::Instant;

use wnn_core::letter::{LetterConverter, PassThrough, TableConverter};
use wnn_core::search::SearchCoordinator;
use wnn_core::settings::Settings;
use wnn_session::{
    ConversionController, DictionarySet, InputEvent, ListView, MemoryBuffer, SessionContext,
    Transition,
};

macro_rules! die {
    ($result:expr, $($arg:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!($($arg)*, e);
            process::exit(1);
        })
    };
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("unterminated token starting at {0}")]
    Unterminated(usize),
    #[error("unknown token: {{{0}}}")]
    Unknown(String),
}

fn token_event(name: &str) -> Option<InputEvent> {
    let event = match name {
        "convert" => InputEvent::Convert,
        "enter" => InputEvent::Enter,
        "cancel" => InputEvent::Cancel,
        "bs" => InputEvent::Backspace,
        "left" => InputEvent::CursorLeft,
        "right" => InputEvent::CursorRight,
        "next" => InputEvent::FocusNext,
        "symbol" => InputEvent::SymbolKey,
        "jp" => InputEvent::ChangeState(Transition::DictionarySet(DictionarySet::Jp)),
        "en" => InputEvent::ChangeState(Transition::DictionarySet(DictionarySet::En)),
        "learn:on" => InputEvent::SetLearning(true),
        "learn:off" => InputEvent::SetLearning(false),
        _ => {
            let index = name.strip_prefix("select:")?.parse().ok()?;
            InputEvent::SelectCandidate(index)
        }
    };
    Some(event)
}

pub fn parse_script(script: &str) -> Result<Vec<InputEvent>, ScriptError> {
    let mut events = Vec::new();
    let mut chars = script.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        if c != '{' {
            events.push(InputEvent::Char(c));
            continue;
        }
        if chars.next_if(|(_, c)| *c == '{').is_some() {
            events.push(InputEvent::Char('{'));
            continue;
        }
        let mut name = String::new();
        loop {
            match chars.next() {
                Some((_, '}')) => break,
                Some((_, c)) => name.push(c),
                None => return Err(ScriptError::Unterminated(pos)),
            }
        }
        events.push(token_event(&name).ok_or(ScriptError::Unknown(name))?);
    }
    Ok(events)
}

pub fn converter(table: Option<&str>) -> Box<dyn LetterConverter> {
    match table {
        Some(file) => {
            let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
            Box::new(die!(TableConverter::from_toml(&content), "Error in {file}: {}"))
        }
        None => Box::new(PassThrough),
    }
}

pub fn session_cmd(
    settings: Settings,
    coordinator: SearchCoordinator,
    converter: Box<dyn LetterConverter>,
    script: &str,
    verbose: bool,
) {
    let events = die!(parse_script(script), "Error: {}");
    let mut ctl = ConversionController::new(SessionContext {
        settings,
        coordinator,
        converter,
        view: Box::new(ListView::new()),
    });
    let mut buf = MemoryBuffer::new();
    let mut now = Instant::now();

    for event in events {
        let label = format!("{event:?}");
        let resp = ctl.handle_event(event, &mut buf, now);
        // Let the debounce delay elapse before the next key.
        if let Some(deadline) = ctl.next_deadline() {
            now = deadline;
            ctl.tick(now);
        }
        if verbose {
            let candidates: Vec<&str> = ctl.candidates().iter().map(|w| w.candidate.as_str()).collect();
            println!(
                "{label:<24} text={:?} composing={:?} commit={:?} candidates=[{}]",
                buf.text(),
                buf.composing_text().unwrap_or_default(),
                resp.commit.unwrap_or_default(),
                candidates.join(" ")
            );
        }
    }
    println!("{}", buf.text());
}
