//! Approximate-pattern expansion for prefix and link search.
//!
//! A rule lets one key character also match another stroke character
//! (e.g. shift-insensitive letters, or voiced kana on a 12-key pad). Each
//! key character carries at most `max_patterns` alternatives, and only the
//! first `QueryPlan::capacity` key positions are expanded. Positions past
//! the capacity match literally, so overlong keys get a coarser query
//! instead of an error.

use std::collections::HashMap;

use tracing::debug;

use crate::settings::QuerySettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ApproxRule {
    pub from: char,
    pub to: char,
}

impl ApproxRule {
    pub fn new(from: char, to: char) -> Self {
        Self { from, to }
    }
}

/// Built-in rule sets, selected by keyboard type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApproxProfile {
    /// Full keyboard: ASCII letters match regardless of case.
    Qwerty,
    /// 12-key pad: plain kana also match their voiced and small forms.
    TwelveKey,
}

/// Voiced, semi-voiced and small variants reachable from a base kana.
const KANA_VARIANTS: &[(char, &str)] = &[
    ('あ', "ぁ"),
    ('い', "ぃ"),
    ('う', "ぅゔ"),
    ('え', "ぇ"),
    ('お', "ぉ"),
    ('か', "が"),
    ('き', "ぎ"),
    ('く', "ぐ"),
    ('け', "げ"),
    ('こ', "ご"),
    ('さ', "ざ"),
    ('し', "じ"),
    ('す', "ず"),
    ('せ', "ぜ"),
    ('そ', "ぞ"),
    ('た', "だ"),
    ('ち', "ぢ"),
    ('つ', "っづ"),
    ('て', "で"),
    ('と', "ど"),
    ('は', "ばぱ"),
    ('ひ', "びぴ"),
    ('ふ', "ぶぷ"),
    ('へ', "べぺ"),
    ('ほ', "ぼぽ"),
    ('や', "ゃ"),
    ('ゆ', "ゅ"),
    ('よ', "ょ"),
    ('わ', "ゎ"),
];

impl ApproxProfile {
    pub fn rules(self) -> Vec<ApproxRule> {
        match self {
            ApproxProfile::Qwerty => ('a'..='z')
                .flat_map(|c| {
                    let upper = c.to_ascii_uppercase();
                    [ApproxRule::new(c, upper), ApproxRule::new(upper, c)]
                })
                .collect(),
            ApproxProfile::TwelveKey => KANA_VARIANTS
                .iter()
                .flat_map(|(base, variants)| variants.chars().map(|v| ApproxRule::new(*base, v)))
                .collect(),
        }
    }
}

/// Query shape chosen by key length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPlan {
    Fast,
    Full,
}

#[derive(Debug, Clone)]
pub struct ApproxRules {
    alternatives: HashMap<char, Vec<char>>,
    max_patterns: usize,
    fast_key_length: usize,
    max_key_length: usize,
}

impl ApproxRules {
    pub fn new(query: &QuerySettings) -> Self {
        Self {
            alternatives: HashMap::new(),
            max_patterns: query.max_approx_patterns,
            fast_key_length: query.fast_key_length,
            max_key_length: query.max_key_length,
        }
    }

    pub fn with_profile(query: &QuerySettings, profile: ApproxProfile) -> Self {
        let mut rules = Self::new(query);
        for rule in profile.rules() {
            rules.add(rule);
        }
        rules
    }

    /// Add a rule. Returns `false` if it is a duplicate or the character
    /// already has `max_patterns` alternatives.
    pub fn add(&mut self, rule: ApproxRule) -> bool {
        if rule.from == rule.to {
            return false;
        }
        let alts = self.alternatives.entry(rule.from).or_default();
        if alts.contains(&rule.to) {
            return false;
        }
        if alts.len() >= self.max_patterns {
            debug!(from = %rule.from, max = self.max_patterns, "approx pattern cap reached");
            return false;
        }
        alts.push(rule.to);
        true
    }

    pub fn clear(&mut self) {
        self.alternatives.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.alternatives.is_empty()
    }

    pub fn alternatives(&self, c: char) -> &[char] {
        self.alternatives.get(&c).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn plan(&self, key: &str) -> QueryPlan {
        if key.chars().count() <= self.fast_key_length {
            QueryPlan::Fast
        } else {
            QueryPlan::Full
        }
    }

    /// Number of leading key positions that are expanded under `plan`.
    pub fn capacity(&self, plan: QueryPlan) -> usize {
        match plan {
            QueryPlan::Fast => self.fast_key_length,
            QueryPlan::Full => self.max_key_length,
        }
    }

    /// Whether `stroke` starts with `key` under the expansion rules.
    pub fn matches_prefix(&self, stroke: &str, key: &str) -> bool {
        let capacity = self.capacity(self.plan(key));
        let mut stroke_chars = stroke.chars();
        for (i, kc) in key.chars().enumerate() {
            let Some(sc) = stroke_chars.next() else {
                return false;
            };
            if sc == kc {
                continue;
            }
            if i >= capacity || !self.alternatives(kc).contains(&sc) {
                return false;
            }
        }
        true
    }
}
