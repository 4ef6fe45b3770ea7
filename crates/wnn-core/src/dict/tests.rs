use std::fs;
use std::io::Write;

use proptest::prelude::*;

use super::*;
use crate::settings::{Settings, StoreLimits};
use crate::word::{WnnWord, WordKind};

fn limits(user: usize, learned: usize) -> StoreLimits {
    StoreLimits {
        max_user_words: user,
        max_learned_words: learned,
        ..StoreLimits::default()
    }
}

fn both(freq: i32) -> FrequencyCeilings {
    FrequencyCeilings {
        user: Some(freq),
        learned: Some(freq),
    }
}

fn w(stroke: &str, candidate: &str) -> WnnWord {
    WnnWord::new(candidate, stroke)
}

fn candidates(words: &[WnnWord]) -> Vec<&str> {
    words.iter().map(|w| w.candidate.as_str()).collect()
}

// --- search ---

#[test]
fn prefix_search_ranks_newer_first_on_equal_frequency() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.learn(&w("kaa", "嗄"), None).unwrap();
    store.add_words(&[w("ka", "蚊")]).unwrap();

    let hits = store.search(&StoreQuery::new(SearchMode::Prefix, "ka", both(500)));
    assert_eq!(candidates(&hits), vec!["蚊", "嗄"]);
    assert!(hits.iter().all(|h| h.frequency == 500));
}

#[test]
fn frequency_order_follows_ceilings() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.learn(&w("kaa", "嗄"), None).unwrap();
    store.add_words(&[w("ka", "蚊")]).unwrap();

    let ceilings = Settings::default().frequency_ceilings();
    let hits = store.search(&StoreQuery::new(SearchMode::Prefix, "ka", ceilings));
    // Learned rows rank above user rows by default.
    assert_eq!(candidates(&hits), vec!["嗄", "蚊"]);
    assert!(hits[0].frequency > hits[1].frequency);
}

#[test]
fn key_order_sorts_by_stroke() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store
        .add_words(&[w("kab", "B"), w("kaa", "A"), w("kac", "C")])
        .unwrap();
    let q = StoreQuery::new(SearchMode::Prefix, "ka", both(1)).order(SearchOrder::Key);
    assert_eq!(candidates(&store.search(&q)), vec!["A", "B", "C"]);
}

#[test]
fn key_order_lists_learned_before_user() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊")]).unwrap();
    store.learn(&w("kaa", "嗄"), None).unwrap();
    let q = StoreQuery::new(SearchMode::Prefix, "ka", both(500)).order(SearchOrder::Key);
    assert_eq!(candidates(&store.search(&q)), vec!["嗄", "蚊"]);
}

#[test]
fn exact_search_matches_whole_stroke() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊"), w("kaa", "嗄")]).unwrap();
    let hits = store.search(&StoreQuery::new(SearchMode::Exact, "ka", both(1)));
    assert_eq!(candidates(&hits), vec!["蚊"]);
}

#[test]
fn empty_key_returns_nothing() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊")]).unwrap();
    assert!(store
        .search(&StoreQuery::new(SearchMode::Prefix, "", both(1)))
        .is_empty());
    assert!(store
        .search(&StoreQuery::new(SearchMode::Exact, "", both(1)))
        .is_empty());
}

#[test]
fn disabled_kind_contributes_nothing() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊")]).unwrap();
    store.learn(&w("kaa", "嗄"), None).unwrap();

    let user_only = FrequencyCeilings {
        user: Some(100),
        learned: None,
    };
    let hits = store.search(&StoreQuery::new(SearchMode::Prefix, "ka", user_only));
    assert_eq!(candidates(&hits), vec!["蚊"]);

    let hits = store.search(&StoreQuery::new(SearchMode::Prefix, "ka", FrequencyCeilings::DISABLED));
    assert!(hits.is_empty());
}

#[test]
fn repeated_learning_reported_once() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    for _ in 0..3 {
        store.learn(&w("aru", "ある"), None).unwrap();
    }
    assert_eq!(store.len(WordKind::Learned), 3);
    let hits = store.search(&StoreQuery::new(SearchMode::Exact, "aru", both(1)));
    assert_eq!(hits.len(), 1);
    // The newest row represents the group.
    assert_eq!(hits[0].id, 3);
}

#[test]
fn link_search_requires_previous_word() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    let prev = w("kyou", "今日");
    store.learn(&w("ha", "は"), Some(&prev)).unwrap();
    store.learn(&w("hare", "晴れ"), None).unwrap();

    let q = StoreQuery::new(SearchMode::Link, "", both(1));
    assert!(store.search(&q).is_empty());

    let hits = store.search(&q.prev(Some(&prev)));
    assert_eq!(candidates(&hits), vec!["は"]);

    let other = w("ashita", "明日");
    assert!(store.search(&q.prev(Some(&other))).is_empty());
}

#[test]
fn link_search_filters_by_key_prefix() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    let prev = w("kyou", "今日");
    store.learn(&w("ha", "は"), Some(&prev)).unwrap();
    store.learn(&w("mo", "も"), Some(&prev)).unwrap();
    let q = StoreQuery::new(SearchMode::Link, "m", both(1)).prev(Some(&prev));
    assert_eq!(candidates(&store.search(&q)), vec!["も"]);
}

#[test]
fn approximate_prefix_search() {
    let settings = Settings::default();
    let rules = ApproxRules::with_profile(&settings.query, ApproxProfile::Qwerty);
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("Tokyo", "東京")]).unwrap();

    let literal = StoreQuery::new(SearchMode::Prefix, "tok", both(1));
    assert!(store.search(&literal).is_empty());
    assert_eq!(candidates(&store.search(&literal.approx(Some(&rules)))), vec!["東京"]);
}

#[test]
fn overlong_key_returns_nothing() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("a", "あ")]).unwrap();
    let key = "a".repeat(51);
    assert!(store
        .search(&StoreQuery::new(SearchMode::Prefix, &key, both(1)))
        .is_empty());
}

// --- user dictionary ---

#[test]
fn add_beyond_cap_is_rejected_whole() {
    let mut store = DictionaryStore::new(limits(100, 2000));
    let words: Vec<WnnWord> = (0..100).map(|i| w(&format!("s{i}"), &format!("c{i}"))).collect();
    store.add_words(&words).unwrap();
    assert_eq!(store.len(WordKind::User), 100);

    let err = store.add_words(&[w("extra", "余分")]).unwrap_err();
    assert!(matches!(err, DictError::Full(100)));
    assert_eq!(store.len(WordKind::User), 100);
}

#[test]
fn batch_crossing_cap_adds_nothing() {
    let mut store = DictionaryStore::new(limits(3, 10));
    store.add_words(&[w("a", "A"), w("b", "B")]).unwrap();
    let err = store.add_words(&[w("c", "C"), w("d", "D")]).unwrap_err();
    assert!(matches!(err, DictError::Full(_)));
    assert_eq!(store.len(WordKind::User), 2);
}

#[test]
fn duplicates_reported_per_word() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊")]).unwrap();
    let report = store
        .add_words(&[w("ka", "蚊"), w("ka", "香"), w("ka", "香")])
        .unwrap();
    assert_eq!(
        report.statuses,
        vec![AddStatus::Duplicate, AddStatus::Added, AddStatus::Duplicate]
    );
    assert_eq!(report.added(), 1);
    assert_eq!(report.duplicates(), 2);
    assert_eq!(store.len(WordKind::User), 2);
}

#[test]
fn invalid_word_rejects_batch() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    let long = "あ".repeat(51);
    let err = store.add_words(&[w("ok", "OK"), w(&long, "長")]).unwrap_err();
    assert!(matches!(err, DictError::InvalidWord(_)));
    assert!(store.is_empty());

    let err = store.add_words(&[w("", "空")]).unwrap_err();
    assert!(matches!(err, DictError::InvalidWord(_)));
}

#[test]
fn remove_words_only_touches_user_rows() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊"), w("ki", "木")]).unwrap();
    store.learn(&w("ka", "蚊"), None).unwrap();
    assert_eq!(store.remove_words(&[w("ka", "蚊")]).unwrap(), 1);
    assert_eq!(store.len(WordKind::User), 1);
    assert_eq!(store.len(WordKind::Learned), 1);
    assert_eq!(store.remove_words(&[w("zz", "無")]).unwrap(), 0);
}

#[test]
fn clear_by_kind() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊")]).unwrap();
    store.learn(&w("ki", "木"), None).unwrap();
    store.clear_learned().unwrap();
    assert_eq!(store.len(WordKind::Learned), 0);
    assert_eq!(store.len(WordKind::User), 1);
    store.clear_user().unwrap();
    assert!(store.is_empty());
}

#[test]
fn user_words_sorted_by_stroke() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ki", "木"), w("ka", "蚊")]).unwrap();
    let words = store.user_words();
    assert_eq!(candidates(&words), vec!["蚊", "木"]);
    assert!(store.learned_words().is_empty());
}

// --- learning ---

#[test]
fn learn_at_cap_evicts_same_word_first() {
    let mut store = DictionaryStore::new(limits(100, 3));
    store.learn(&w("x", "X"), None).unwrap(); // id 1
    store.learn(&w("aru", "ある"), None).unwrap(); // id 2
    store.learn(&w("y", "Y"), None).unwrap(); // id 3

    store.learn(&w("aru", "ある"), None).unwrap();
    assert_eq!(store.len(WordKind::Learned), 3);
    let ids: Vec<i64> = store.rows().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 3, 4]);
}

#[test]
fn learn_at_cap_evicts_oldest_otherwise() {
    let mut store = DictionaryStore::new(limits(100, 2));
    store.learn(&w("a", "A"), None).unwrap();
    store.learn(&w("b", "B"), None).unwrap();
    store.learn(&w("c", "C"), None).unwrap();
    let strokes: Vec<&str> = store.rows().iter().map(|r| r.stroke.as_str()).collect();
    assert_eq!(strokes, vec!["b", "c"]);
}

#[test]
fn learn_oldest_row_at_full_cap() {
    let mut store = DictionaryStore::new(limits(100, 2000));
    store.learn(&w("aru", "ある"), None).unwrap();
    for i in 1..2000 {
        store.learn(&w(&format!("s{i}"), "x"), None).unwrap();
    }
    assert_eq!(store.len(WordKind::Learned), 2000);
    store.learn(&w("aru", "ある"), None).unwrap();
    assert_eq!(store.len(WordKind::Learned), 2000);
    let aru: Vec<i64> = store
        .rows()
        .iter()
        .filter(|r| r.stroke == "aru")
        .map(|r| r.id)
        .collect();
    assert_eq!(aru, vec![2001]);
}

#[test]
fn user_rows_never_evicted_by_learning() {
    let mut store = DictionaryStore::new(limits(100, 1));
    store.add_words(&[w("u", "U")]).unwrap();
    store.learn(&w("a", "A"), None).unwrap();
    store.learn(&w("b", "B"), None).unwrap();
    assert_eq!(store.len(WordKind::User), 1);
    assert_eq!(store.len(WordKind::Learned), 1);
}

#[test]
fn learn_invalid_word_fails_without_effect() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    assert!(store.learn(&w("", "空"), None).is_err());
    assert!(store.is_empty());
}

#[test]
fn learn_with_invalid_previous_drops_link() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.learn(&w("ha", "は"), Some(&w("", ""))).unwrap();
    assert!(store.rows()[0].prev.is_none());
}

proptest! {
    #[test]
    fn user_count_never_exceeds_cap(batches in prop::collection::vec(1usize..8, 0..30)) {
        let mut store = DictionaryStore::new(limits(10, 10));
        let mut n = 0;
        for size in batches {
            let words: Vec<WnnWord> = (0..size).map(|_| { n += 1; w(&format!("s{n}"), "c") }).collect();
            let before = store.len(WordKind::User);
            match store.add_words(&words) {
                Ok(report) => prop_assert_eq!(store.len(WordKind::User), before + report.added()),
                Err(DictError::Full(_)) => prop_assert_eq!(store.len(WordKind::User), before),
                Err(e) => prop_assert!(false, "unexpected error {e}"),
            }
            prop_assert!(store.len(WordKind::User) <= 10);
        }
    }

    #[test]
    fn eviction_picks_expected_row(
        seq in prop::collection::vec(0u8..6, 1..40),
        next in 0u8..6,
    ) {
        let cap = 5;
        let mut store = DictionaryStore::new(limits(10, cap));
        for s in &seq {
            store.learn(&w(&format!("s{s}"), "c"), None).unwrap();
        }
        let before: Vec<(i64, String)> = store
            .rows()
            .iter()
            .map(|r| (r.id, r.stroke.clone()))
            .collect();
        let stroke = format!("s{next}");
        store.learn(&w(&stroke, "c"), None).unwrap();

        if before.len() >= cap {
            let expected = before
                .iter()
                .find(|(_, s)| *s == stroke)
                .or_else(|| before.first())
                .map(|(id, _)| *id);
            let remaining: Vec<i64> = store.rows().iter().map(|r| r.id).collect();
            prop_assert!(!remaining.contains(&expected.unwrap()));
            prop_assert_eq!(store.len(WordKind::Learned), cap);
        } else {
            prop_assert_eq!(store.len(WordKind::Learned), before.len() + 1);
        }
    }
}

// --- persistence ---

#[test]
fn bytes_roundtrip_preserves_ids() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊")]).unwrap();
    store.learn(&w("ha", "は"), Some(&w("kyou", "今日"))).unwrap();
    let bytes = store.to_bytes().unwrap();
    let mut restored = DictionaryStore::from_bytes(&bytes, StoreLimits::default()).unwrap();
    assert_eq!(restored.rows(), store.rows());
    restored.learn(&w("ki", "木"), None).unwrap();
    assert_eq!(restored.rows().last().unwrap().id, 3);
}

#[test]
fn from_bytes_rejects_bad_headers() {
    assert!(matches!(
        DictionaryStore::from_bytes(b"WN", StoreLimits::default()),
        Err(DictError::InvalidHeader)
    ));
    assert!(matches!(
        DictionaryStore::from_bytes(b"XXXX\x01", StoreLimits::default()),
        Err(DictError::InvalidMagic)
    ));
    assert!(matches!(
        DictionaryStore::from_bytes(b"WNDS\x09", StoreLimits::default()),
        Err(DictError::UnsupportedVersion(9))
    ));
}

#[test]
fn wal_replay_restores_transactions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.wnds");
    {
        let mut store = DictionaryStore::open(&path, StoreLimits::default()).unwrap();
        assert!(store.is_persistent());
        store.add_words(&[w("ka", "蚊"), w("ki", "木")]).unwrap();
        store.learn(&w("ha", "は"), None).unwrap();
        store.remove_words(&[w("ki", "木")]).unwrap();
    }
    let store = DictionaryStore::open(&path, StoreLimits::default()).unwrap();
    assert_eq!(candidates(&store.user_words()), vec!["蚊"]);
    assert_eq!(candidates(&store.learned_words()), vec!["は"]);
}

#[test]
fn checkpoint_truncates_wal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.wnds");
    let wal_path = dir.path().join("words.wnds.wal");
    {
        let mut store = DictionaryStore::open(&path, StoreLimits::default()).unwrap();
        store.add_words(&[w("ka", "蚊")]).unwrap();
        assert!(fs::metadata(&wal_path).unwrap().len() > 0);
        store.checkpoint().unwrap();
        assert_eq!(fs::metadata(&wal_path).unwrap().len(), 0);
        store.learn(&w("ha", "は"), None).unwrap();
    }
    let store = DictionaryStore::open(&path, StoreLimits::default()).unwrap();
    assert_eq!(store.len(WordKind::User), 1);
    assert_eq!(store.len(WordKind::Learned), 1);
}

#[test]
fn corrupt_wal_tail_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.wnds");
    {
        let mut store = DictionaryStore::open(&path, StoreLimits::default()).unwrap();
        store.add_words(&[w("ka", "蚊")]).unwrap();
    }
    let mut f = fs::OpenOptions::new()
        .append(true)
        .open(dir.path().join("words.wnds.wal"))
        .unwrap();
    f.write_all(&[7, 0, 0, 0, 1, 2, 3, 4, 9]).unwrap();
    drop(f);

    let store = DictionaryStore::open(&path, StoreLimits::default()).unwrap();
    assert_eq!(store.len(WordKind::User), 1);
}

#[test]
fn failed_wal_append_leaves_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("words.wnds");
    let wal_path = dir.path().join("words.wnds.wal");
    {
        let mut store = DictionaryStore::open(&path, limits(10, 2)).unwrap();
        store.learn(&w("ka", "蚊"), None).unwrap();
        store.learn(&w("ha", "は"), None).unwrap();
        store.checkpoint().unwrap();
    }
    fs::remove_file(&wal_path).unwrap();
    let mut store = DictionaryStore::open(&path, limits(10, 2)).unwrap();
    fs::create_dir(&wal_path).unwrap();

    // At the cap: the eviction and the insert fail together.
    let err = store.learn(&w("ne", "ね"), None).unwrap_err();
    assert!(matches!(err, DictError::Io(_)));
    assert_eq!(candidates(&store.learned_words()), vec!["は", "蚊"]);
    assert_eq!(store.rows().len(), 2);

    assert!(store.add_words(&[w("ki", "木")]).is_err());
    assert_eq!(store.len(WordKind::User), 0);
}

#[test]
fn in_memory_checkpoint_is_noop() {
    let mut store = DictionaryStore::new(StoreLimits::default());
    store.add_words(&[w("ka", "蚊")]).unwrap();
    store.checkpoint().unwrap();
    assert!(!store.is_persistent());
}

// --- fixed dictionary ---

const TSV: &str = "# stroke\tcandidate\tfrequency
ka\t蚊\t300
ka\t課\t500
kaa\t嗄\t100
kai\t貝\t400\t10\t11
";

fn fixed() -> FixedDictionary {
    let mut dict = FixedDictionary::new(&Settings::default().query);
    dict.load_tsv(DictionaryTarget::Jp, TSV).unwrap();
    dict
}

fn drain(dict: &mut dyn NativeSearch) -> Vec<String> {
    std::iter::from_fn(|| dict.next_result())
        .map(|w| w.candidate)
        .collect()
}

#[test]
fn fixed_exact_and_prefix() {
    let mut dict = fixed();
    assert_eq!(dict.search(SearchMode::Exact, SearchOrder::Frequency, "ka").unwrap(), 2);
    assert_eq!(drain(&mut dict), vec!["課", "蚊"]);

    assert_eq!(dict.search(SearchMode::Prefix, SearchOrder::Frequency, "ka").unwrap(), 4);
    assert_eq!(drain(&mut dict), vec!["課", "貝", "蚊", "嗄"]);

    dict.search(SearchMode::Prefix, SearchOrder::Key, "ka").unwrap();
    assert_eq!(drain(&mut dict), vec!["課", "蚊", "嗄", "貝"]);
}

#[test]
fn fixed_parses_part_of_speech() {
    let mut dict = fixed();
    dict.search(SearchMode::Exact, SearchOrder::Frequency, "kai").unwrap();
    let word = dict.next_result().unwrap();
    assert_eq!(word.part_of_speech, crate::word::PartOfSpeech::new(10, 11));
    assert_eq!(word.frequency, 400);
}

#[test]
fn fixed_rejects_malformed_lines() {
    let mut dict = FixedDictionary::new(&Settings::default().query);
    let err = dict
        .load_tsv(DictionaryTarget::Jp, "ka\t蚊\tnotanumber\n")
        .unwrap_err();
    assert!(err.to_string().contains("line 1"));
    assert!(dict.load_tsv(DictionaryTarget::Jp, "ka\t蚊\n").is_err());
}

#[test]
fn fixed_link_memory_and_break_sequence() {
    let mut dict = fixed();
    dict.learn(&w("kyou", "今日")).unwrap();
    dict.learn(&w("ha", "は")).unwrap();
    dict.learn(&w("kyou", "今日")).unwrap();
    assert_eq!(dict.search(SearchMode::Link, SearchOrder::Frequency, "").unwrap(), 1);
    assert_eq!(drain(&mut dict), vec!["は"]);

    dict.break_sequence();
    assert!(dict.previous_word().is_none());
    assert_eq!(dict.search(SearchMode::Link, SearchOrder::Frequency, "").unwrap(), 0);
}

#[test]
fn fixed_select_dictionary_falls_back() {
    let mut dict = fixed();
    dict.select_dictionary(DictionaryTarget::JpPersonName).unwrap();
    assert_eq!(dict.active(), DictionaryTarget::Jp);
    let err = dict.select_dictionary(DictionaryTarget::En).unwrap_err();
    assert_eq!(err, NativeError::UnknownTarget(DictionaryTarget::En));
    assert_eq!(dict.active(), DictionaryTarget::Jp);
}

#[test]
fn fixed_symbol_lists() {
    let mut dict = fixed();
    dict.select_dictionary(DictionaryTarget::Symbol(SymbolList::Face)).unwrap();
    let n = dict.search(SearchMode::Prefix, SearchOrder::Frequency, "").unwrap();
    assert_eq!(n, SymbolList::Face.entries().len());
    assert_eq!(dict.next_result().unwrap().candidate, "(^_^)");
    assert_eq!(SymbolList::Face.next(), SymbolList::Japanese);
}

#[test]
fn fixed_approx_pattern() {
    let mut dict = FixedDictionary::new(&Settings::default().query);
    dict.insert(DictionaryTarget::En, w("Tokyo", "Tokyo").with_frequency(1));
    dict.select_dictionary(DictionaryTarget::En).unwrap();
    assert_eq!(dict.search(SearchMode::Prefix, SearchOrder::Frequency, "to").unwrap(), 0);
    dict.set_approx_pattern(ApproxRule::new('t', 'T')).unwrap();
    assert_eq!(dict.search(SearchMode::Prefix, SearchOrder::Frequency, "to").unwrap(), 1);
    dict.clear_approx_pattern();
    assert_eq!(dict.search(SearchMode::Prefix, SearchOrder::Frequency, "to").unwrap(), 0);
}

#[test]
fn frequency_range_validation() {
    assert_eq!(FrequencyCeilings::from_range(400, 500), Some(500));
    assert_eq!(FrequencyCeilings::from_range(-1, 500), None);
    assert_eq!(FrequencyCeilings::from_range(600, 500), None);
}
