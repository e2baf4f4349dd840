// SPDX-FileCopyrightText: 2026 Medfinder Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic medicine-name extraction from free text.
//!
//! Three strategies run over the normalized text in strict order and the
//! first non-empty candidate wins:
//!
//! 1. the pattern table ([`PATTERNS`]): question templates, availability
//!    phrasing, then name-plus-dosage;
//! 2. the text right after the first trigger phrase found;
//! 3. the first significant word.
//!
//! The question templates capture a single token, so
//! `هل يتوفر بنادول 500` yields `بنادول`, not `بنادول 500`. A quantity and
//! pack unit after the request verb is skipped (`i need 2 boxes of panadol`).
//! Pattern captures that are stop words or trigger words are rejected.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::normalize::normalize;

/// Which strategy produced a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    /// A row of the pattern table, by label.
    Pattern(&'static str),
    /// Text following a trigger phrase.
    Phrase,
    /// First word surviving the stop-word filter.
    SignificantWord,
}

/// A provisional medicine name. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameMatch {
    pub name: String,
    pub source: NameSource,
}

struct NamePattern {
    label: &'static str,
    regex: Regex,
}

/// Letters of the Latin (already lowercased) and Arabic alphabets.
const LETTER: &str = r"a-z\x{0621}-\x{064A}\x{066E}-\x{06D3}";

/// Characters that end a captured token.
const TOKEN_END: &str = r"\s?؟!.,،;:";

/// Optional quantity and pack unit between a request verb and the name.
const QUANTITY: &str = r"(?:\d+\s+(?:(?:علبه|علب|عبوه|عبوات|شريط|اشرطه|حبات|اقراص|قرص|boxes|box|packs|pack|strips|strip|tablets|pills)\s+)?(?:(?:of|من)\s+)?)?";

/// The ordered pattern table. Each regex has a `name` capture group.
static PATTERNS: LazyLock<Vec<NamePattern>> = LazyLock::new(|| {
    let token = format!(r"(?P<name>[{LETTER}][^{TOKEN_END}]*)");
    vec![
        NamePattern {
            label: "question",
            regex: Regex::new(&format!(
                r"(?:^|\s)(?:هل يتوفر|هل عندكم|هل يوجد|ابحث عن|اريد|ابي|احتاج|do you have|i want|i need|looking for|where can i find|search for)\s+{QUANTITY}(?:(?:any|some|the|a|an|دواء|علاج|حبوب|شراب)\s+)?{token}"
            ))
            .unwrap(),
        },
        NamePattern {
            label: "availability",
            regex: Regex::new(&format!(
                r"(?:^|\s)(?P<name>[{LETTER}]{{3,}})\s+(?:متوفر|موجود|available|in stock)"
            ))
            .unwrap(),
        },
        NamePattern {
            label: "dosage",
            regex: Regex::new(&format!(
                r"(?:^|\s)(?P<name>[{LETTER}]{{3,}})\s*\d+(?:\.\d+)?\s*(?:mg|mcg|ml|g|%|مجم|ملغ|مل|جم)?"
            ))
            .unwrap(),
        },
    ]
});

/// Trigger phrases for the second strategy, in priority order.
static TRIGGER_PHRASES: LazyLock<Vec<String>> = LazyLock::new(|| {
    [
        "هل يتوفر",
        "هل عندكم",
        "في عندكم",
        "ابحث عن",
        "اين اجد",
        "اريد",
        "احتاج",
        "ابي",
        "متوفر",
        "موجود",
        "where can i find",
        "do you have",
        "is there",
        "i need",
        "looking for",
    ]
    .iter()
    .map(|phrase| normalize(phrase))
    .collect()
});

static PHRASE_TAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*(?P<name>[^{TOKEN_END}]+)")).unwrap());

const STOP_WORDS: &[&str] = &[
    "في", "من", "الى", "على", "عن", "هل", "ما", "لا", "نعم", "هذا", "هذه", "ممكن", "لو", "سمحت",
    "عندكم", "يوجد", "يتوفر", "اريد", "احتاج", "دواء", "علاج", "the", "a", "an", "is", "are",
    "do", "does", "have", "has", "you", "any", "some", "please", "want", "need", "for", "can",
    "there", "medicine",
];

/// Derives a candidate medicine name from free text.
#[derive(Debug, Default, Clone, Copy)]
pub struct NameExtractor;

impl NameExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns the first candidate produced by the strategy cascade, or `None`.
    pub fn extract(&self, text: &str) -> Option<NameMatch> {
        let normalized = normalize(text);
        if normalized.is_empty() {
            return None;
        }

        let found = by_pattern(&normalized)
            .or_else(|| by_trigger_phrase(&normalized))
            .or_else(|| by_significant_word(&normalized));
        if let Some(found) = &found {
            debug!(name = %found.name, source = ?found.source, "medicine name extracted");
        }
        found
    }
}

fn by_pattern(normalized: &str) -> Option<NameMatch> {
    PATTERNS.iter().find_map(|pattern| {
        pattern.regex.captures_iter(normalized).find_map(|captures| {
            let name = clean_candidate(captures.name("name")?.as_str());
            (!name.is_empty() && !is_filler(&name)).then_some(NameMatch {
                name,
                source: NameSource::Pattern(pattern.label),
            })
        })
    })
}

/// A stop word or a word of a trigger phrase.
fn is_filler(word: &str) -> bool {
    STOP_WORDS.contains(&word)
        || TRIGGER_PHRASES
            .iter()
            .any(|phrase| phrase.split_whitespace().any(|w| w == word))
}

fn by_trigger_phrase(normalized: &str) -> Option<NameMatch> {
    TRIGGER_PHRASES.iter().find_map(|phrase| {
        let start = find_at_word_start(normalized, phrase)?;
        let tail = &normalized[start + phrase.len()..];
        let captures = PHRASE_TAIL.captures(tail)?;
        let name = clean_candidate(captures.name("name")?.as_str());
        (!name.is_empty()).then_some(NameMatch {
            name,
            source: NameSource::Phrase,
        })
    })
}

fn by_significant_word(normalized: &str) -> Option<NameMatch> {
    normalized
        .split_whitespace()
        .map(clean_candidate)
        .find(|word| {
            word.chars().count() >= 3
                && !STOP_WORDS.contains(&word.as_str())
                && !word.chars().all(|c| c.is_numeric() || matches!(c, '.' | '-'))
        })
        .map(|name| NameMatch {
            name,
            source: NameSource::SignificantWord,
        })
}

/// Byte offset of the first occurrence of `phrase` that starts a word.
fn find_at_word_start(haystack: &str, phrase: &str) -> Option<usize> {
    haystack.match_indices(phrase).map(|(i, _)| i).find(|&i| {
        haystack[..i]
            .chars()
            .next_back()
            .is_none_or(char::is_whitespace)
    })
}

/// Keep letters, digits, whitespace, and hyphens; trim the rest.
pub fn clean_candidate(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect::<String>()
        .trim()
        .to_string()
}
