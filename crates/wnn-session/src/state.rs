//! Conversion-mode state machine.
//!
//! `EngineState` is a product of five small axes. `apply` changes one axis
//! and returns the side effects the caller must perform; it never touches a
//! dictionary itself. Requesting the current value of an axis is a no-op.

use wnn_core::dict::{DictionaryTarget, SymbolList};
use wnn_core::settings::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DictionarySet {
    Jp,
    En,
}

impl From<Language> for DictionarySet {
    fn from(lang: Language) -> Self {
        match lang {
            Language::Jp => DictionarySet::Jp,
            Language::En => DictionarySet::En,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConvertType {
    /// Prediction only.
    None,
    ConsecutiveClause,
    ReadingToKanji,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporaryMode {
    None,
    Symbol,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreferenceDictionary {
    None,
    PersonName,
    PostalAddress,
    EmailOrUri,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyboard {
    Qwerty,
    TwelveKey,
}

/// A request to change one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    DictionarySet(DictionarySet),
    ConvertType(ConvertType),
    TemporaryMode(TemporaryMode),
    PreferenceDictionary(PreferenceDictionary),
    Keyboard(Keyboard),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateEffect {
    SelectDictionary(DictionaryTarget),
    /// Forget the previously committed word.
    BreakSequence,
    SelectKeyboard(Keyboard),
    EnterSymbolList(SymbolList),
    /// Return to the letter converter in use before a temporary mode.
    RestoreConverter,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateChange {
    pub effects: Vec<StateEffect>,
}

impl StateChange {
    pub fn is_noop(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn contains(&self, effect: StateEffect) -> bool {
        self.effects.contains(&effect)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineState {
    pub dictionary_set: DictionarySet,
    pub convert_type: ConvertType,
    pub temporary_mode: TemporaryMode,
    pub preference: PreferenceDictionary,
    pub keyboard: Keyboard,
    /// Symbol list shown while in symbol mode.
    symbol_list: Option<SymbolList>,
}

impl Default for EngineState {
    fn default() -> Self {
        Self::new(DictionarySet::Jp)
    }
}

impl EngineState {
    pub fn new(dictionary_set: DictionarySet) -> Self {
        Self {
            dictionary_set,
            convert_type: ConvertType::None,
            temporary_mode: TemporaryMode::None,
            preference: PreferenceDictionary::None,
            keyboard: Keyboard::Qwerty,
            symbol_list: None,
        }
    }

    pub fn symbol_list(&self) -> Option<SymbolList> {
        self.symbol_list
    }

    pub fn is_symbol_mode(&self) -> bool {
        self.temporary_mode == TemporaryMode::Symbol
    }

    pub fn is_converting(&self) -> bool {
        self.convert_type != ConvertType::None
    }

    pub fn is_english(&self) -> bool {
        self.dictionary_set == DictionarySet::En
    }

    /// Dictionary the current axes select.
    pub fn active_target(&self) -> DictionaryTarget {
        match self.temporary_mode {
            TemporaryMode::Symbol => {
                return DictionaryTarget::Symbol(self.symbol_list.unwrap_or(SymbolList::ALL[0]))
            }
            TemporaryMode::User => return DictionaryTarget::UserWords,
            TemporaryMode::None => {}
        }
        match (self.dictionary_set, self.preference) {
            (DictionarySet::Jp, PreferenceDictionary::PersonName) => DictionaryTarget::JpPersonName,
            (DictionarySet::Jp, PreferenceDictionary::PostalAddress) => {
                DictionaryTarget::JpPostalAddress
            }
            (DictionarySet::Jp, _) if self.convert_type == ConvertType::ReadingToKanji => {
                DictionaryTarget::JpReadingToKanji
            }
            (DictionarySet::Jp, _) => DictionaryTarget::Jp,
            (DictionarySet::En, PreferenceDictionary::EmailOrUri) => DictionaryTarget::EnEmailOrUri,
            (DictionarySet::En, _) => DictionaryTarget::En,
        }
    }

    pub fn apply(&mut self, transition: Transition) -> StateChange {
        let mut effects = Vec::new();
        match transition {
            Transition::DictionarySet(set) => {
                if set != self.dictionary_set {
                    self.dictionary_set = set;
                    effects.push(StateEffect::SelectDictionary(self.active_target()));
                    effects.push(StateEffect::BreakSequence);
                }
            }
            Transition::ConvertType(ty) => {
                if ty != self.convert_type {
                    let before = self.active_target();
                    self.convert_type = ty;
                    let after = self.active_target();
                    if after != before {
                        effects.push(StateEffect::SelectDictionary(after));
                    }
                }
            }
            Transition::TemporaryMode(mode) => {
                if mode != self.temporary_mode {
                    let was_temporary = self.temporary_mode != TemporaryMode::None;
                    self.temporary_mode = mode;
                    self.symbol_list = None;
                    match mode {
                        TemporaryMode::Symbol => {
                            let list = self.advance_symbol_list();
                            effects.push(StateEffect::BreakSequence);
                            effects.push(StateEffect::EnterSymbolList(list));
                        }
                        TemporaryMode::User => {}
                        TemporaryMode::None => {
                            if was_temporary {
                                effects.push(StateEffect::RestoreConverter);
                            }
                        }
                    }
                    effects.push(StateEffect::SelectDictionary(self.active_target()));
                }
            }
            Transition::PreferenceDictionary(pref) => {
                if pref != self.preference {
                    let before = self.active_target();
                    self.preference = pref;
                    let after = self.active_target();
                    if after != before {
                        effects.push(StateEffect::SelectDictionary(after));
                    }
                }
            }
            Transition::Keyboard(keyboard) => {
                if keyboard != self.keyboard {
                    self.keyboard = keyboard;
                    effects.push(StateEffect::SelectKeyboard(keyboard));
                }
            }
        }
        StateChange { effects }
    }

    /// Move to the next symbol list while in symbol mode. Outside symbol
    /// mode this is a no-op.
    pub fn cycle_symbol_list(&mut self) -> StateChange {
        if !self.is_symbol_mode() {
            return StateChange::default();
        }
        let list = self.advance_symbol_list();
        StateChange {
            effects: vec![
                StateEffect::EnterSymbolList(list),
                StateEffect::SelectDictionary(DictionaryTarget::Symbol(list)),
            ],
        }
    }

    fn advance_symbol_list(&mut self) -> SymbolList {
        let list = self.symbol_list.map_or(SymbolList::ALL[0], SymbolList::next);
        self.symbol_list = Some(list);
        list
    }
}
