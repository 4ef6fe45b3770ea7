use proptest::prelude::*;

use wnn_core::composing::Layer;

use super::Harness;
use crate::state::{
    ConvertType, DictionarySet, EngineState, Keyboard, PreferenceDictionary, TemporaryMode,
    Transition,
};
use crate::InputEvent;

#[derive(Debug, Clone)]
enum Step {
    Event(InputEvent),
    Flush,
}

fn transition() -> impl Strategy<Value = Transition> {
    prop_oneof![
        prop_oneof![Just(DictionarySet::Jp), Just(DictionarySet::En)].prop_map(Transition::DictionarySet),
        prop_oneof![
            Just(ConvertType::None),
            Just(ConvertType::ConsecutiveClause),
            Just(ConvertType::ReadingToKanji),
        ]
        .prop_map(Transition::ConvertType),
        prop_oneof![
            Just(TemporaryMode::None),
            Just(TemporaryMode::Symbol),
            Just(TemporaryMode::User),
        ]
        .prop_map(Transition::TemporaryMode),
        prop_oneof![
            Just(PreferenceDictionary::None),
            Just(PreferenceDictionary::PersonName),
            Just(PreferenceDictionary::PostalAddress),
            Just(PreferenceDictionary::EmailOrUri),
        ]
        .prop_map(Transition::PreferenceDictionary),
        prop_oneof![Just(Keyboard::Qwerty), Just(Keyboard::TwelveKey)].prop_map(Transition::Keyboard),
    ]
}

fn key() -> impl Strategy<Value = InputEvent> {
    prop_oneof![
        Just(InputEvent::Backspace),
        Just(InputEvent::CursorLeft),
        Just(InputEvent::CursorRight),
        Just(InputEvent::Convert),
        Just(InputEvent::Enter),
        Just(InputEvent::Cancel),
        (0usize..4).prop_map(InputEvent::SelectCandidate),
        Just(InputEvent::FocusNext),
        Just(InputEvent::SymbolKey),
        Just(InputEvent::FocusLost),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => prop::sample::select(vec!['k', 'y', 'o', 'u', 'h', 'a', 'n', 'e', ' ', '.'])
            .prop_map(|c| Step::Event(InputEvent::Char(c))),
        2 => Just(Step::Flush),
        6 => key().prop_map(Step::Event),
        1 => transition().prop_map(|t| Step::Event(InputEvent::ChangeState(t))),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn session_invariants_hold(steps in prop::collection::vec(step(), 1..60)) {
        let mut h = Harness::jp();
        for step in steps {
            let resp = match step {
                Step::Event(event) => Some(h.send(event)),
                Step::Flush => {
                    h.flush_prediction();
                    None
                }
            };
            if let Some(resp) = resp {
                if let Some(commit) = &resp.commit {
                    prop_assert!(!commit.is_empty());
                }
            }
            prop_assert!(h.ctl.composing().size(Layer::Input) <= 30);
            if let Some(i) = h.ctl.focused() {
                prop_assert!(i < h.ctl.candidates().len());
            }
            prop_assert_eq!(h.ctl.state().is_converting(), !h.ctl.clauses().is_empty());
            if !h.ctl.is_composing() {
                prop_assert_eq!(h.buf.composing_text(), None);
            }
            if h.ctl.state().is_symbol_mode() {
                prop_assert!(h.ctl.coordinator().target().is_symbol());
            }
        }
    }

    #[test]
    fn repeated_transition_is_noop(
        setup in prop::collection::vec(transition(), 0..8),
        t in transition(),
    ) {
        let mut state = EngineState::default();
        for s in setup {
            state.apply(s);
        }
        state.apply(t);
        prop_assert!(state.apply(t).is_noop());
    }
}
