mod proptest_fsm;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

use wnn_core::dict::{
    ApproxRule, DictionaryStore, DictionaryTarget, FixedDictionary, NativeError, NativeSearch,
    SearchMode, SearchOrder,
};
use wnn_core::letter::TableConverter;
use wnn_core::search::SearchCoordinator;
use wnn_core::settings::{Language, Settings};
use wnn_core::word::WnnWord;

use crate::{ConversionController, InputEvent, ListView, MemoryBuffer, Response, SessionContext};

const KANA: &str = r#"
[mappings]
a = "あ"
i = "い"
u = "う"
e = "え"
o = "お"
ka = "か"
ki = "き"
ko = "こ"
kyo = "きょ"
ne = "ね"
ha = "は"
te = "て"
n = "ん"
"#;

const JP_DICT: &str = "\
きょう\t今日\t300
きょう\t京\t100
は\tは\t200
は\t葉\t50
てんき\t天気\t250
ねこ\t猫\t300
ねこ\t寝子\t10
か\t蚊\t40
か\t可\t30
";

const EN_DICT: &str = "\
hello\thello\t100
help\thelp\t90
world\tworld\t80
";

/// Fixed dictionary that counts `break_sequence` calls.
pub(super) struct CountingNative {
    inner: FixedDictionary,
    breaks: Arc<AtomicUsize>,
}

impl NativeSearch for CountingNative {
    fn select_dictionary(&mut self, target: DictionaryTarget) -> Result<(), NativeError> {
        self.inner.select_dictionary(target)
    }
    fn search(&mut self, mode: SearchMode, order: SearchOrder, key: &str) -> Result<usize, NativeError> {
        self.inner.search(mode, order, key)
    }
    fn next_result(&mut self) -> Option<WnnWord> {
        self.inner.next_result()
    }
    fn set_approx_pattern(&mut self, rule: ApproxRule) -> Result<(), NativeError> {
        self.inner.set_approx_pattern(rule)
    }
    fn clear_approx_pattern(&mut self) {
        self.inner.clear_approx_pattern()
    }
    fn learn(&mut self, word: &WnnWord) -> Result<(), NativeError> {
        self.inner.learn(word)
    }
    fn break_sequence(&mut self) {
        self.breaks.fetch_add(1, Ordering::SeqCst);
        self.inner.break_sequence()
    }
}

pub(super) struct Harness {
    pub ctl: ConversionController,
    pub buf: MemoryBuffer,
    pub breaks: Arc<AtomicUsize>,
    pub now: Instant,
}

impl Harness {
    pub fn new(language: Language) -> Self {
        let mut settings = Settings::default();
        settings.engine.default_language = language;
        Self::with_settings(settings)
    }

    pub fn with_settings(settings: Settings) -> Self {
        let mut fixed = FixedDictionary::new(&settings.query);
        fixed.load_tsv(DictionaryTarget::Jp, JP_DICT).unwrap();
        fixed.load_tsv(DictionaryTarget::En, EN_DICT).unwrap();
        let breaks = Arc::new(AtomicUsize::new(0));
        let native = CountingNative {
            inner: fixed,
            breaks: Arc::clone(&breaks),
        };
        let store = Arc::new(RwLock::new(DictionaryStore::new(settings.store_limits())));
        let coordinator = SearchCoordinator::new(Box::new(native), store, &settings);
        let ctl = ConversionController::new(SessionContext {
            settings,
            coordinator,
            converter: Box::new(TableConverter::from_toml(KANA).unwrap()),
            view: Box::new(ListView::new()),
        });
        Self {
            ctl,
            buf: MemoryBuffer::new(),
            breaks,
            now: Instant::now(),
        }
    }

    pub fn jp() -> Self {
        Self::new(Language::Jp)
    }

    pub fn en() -> Self {
        Self::new(Language::En)
    }

    pub fn send(&mut self, event: InputEvent) -> Response {
        self.ctl.handle_event(event, &mut self.buf, self.now)
    }

    pub fn type_str(&mut self, s: &str) -> Vec<Response> {
        s.chars().map(|c| self.send(InputEvent::Char(c))).collect()
    }

    /// Deliver the pending prediction, if any.
    pub fn flush_prediction(&mut self) -> bool {
        let Some(deadline) = self.ctl.next_deadline() else {
            return false;
        };
        self.now = deadline;
        self.ctl.tick(self.now)
    }

    pub fn surfaces(&self) -> Vec<&str> {
        self.ctl
            .candidates()
            .iter()
            .map(|w| w.candidate.as_str())
            .collect()
    }

    pub fn breaks(&self) -> usize {
        self.breaks.load(Ordering::SeqCst)
    }
}
