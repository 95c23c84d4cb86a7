//! Pairwise duplicate matching.
//!
//! Every unordered pair of entries is run through [`MatchRule::ORDER`]; the
//! first rule that applies decides the pair. A DOI match therefore wins over
//! any title or year difference, and title+year is only consulted when the
//! DOIs do not settle it.

use std::collections::HashSet;
use std::fmt;

use serde::Serialize;

use crate::normalize::{normalize_doi, normalize_year};
use crate::{Entry, MatchingConfig};

/// A rule that can declare two entries duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    /// Both DOIs present, non-empty and equal (case-sensitive).
    Doi,
    /// Both years present and equal, and normalized titles equal.
    TitleYear,
}

impl MatchRule {
    /// Evaluation order. Earlier rules take precedence.
    pub const ORDER: [MatchRule; 2] = [MatchRule::Doi, MatchRule::TitleYear];

    pub fn name(self) -> &'static str {
        match self {
            MatchRule::Doi => "doi",
            MatchRule::TitleYear => "title_year",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ORDER
            .into_iter()
            .find(|rule| rule.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Whether this rule alone holds for the pair, ignoring precedence.
    pub fn applies(self, a: &Entry, b: &Entry, config: &MatchingConfig) -> bool {
        match self {
            MatchRule::Doi => doi_match(a, b, config.strip_doi_url),
            MatchRule::TitleYear => title_year_match(a, b),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of comparing one pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Duplicate(MatchRule),
    Distinct,
}

fn doi_match(a: &Entry, b: &Entry, strip_url: bool) -> bool {
    match (a.doi(), b.doi()) {
        (Some(doi_a), Some(doi_b)) => {
            let doi_a = normalize_doi(doi_a, strip_url);
            !doi_a.is_empty() && doi_a == normalize_doi(doi_b, strip_url)
        }
        _ => false,
    }
}

fn title_year_match(a: &Entry, b: &Entry) -> bool {
    let (Some(year_a), Some(year_b)) = (
        a.year().and_then(normalize_year),
        b.year().and_then(normalize_year),
    ) else {
        return false;
    };
    if year_a != year_b {
        return false;
    }

    // Titles are only normalized once the cheap year check passes.
    match (a.normalized_title(), b.normalized_title()) {
        (Some(title_a), Some(title_b)) => !title_a.is_empty() && title_a == title_b,
        _ => false,
    }
}

/// Compare two entries with the default configuration.
pub fn evaluate_pair(a: &Entry, b: &Entry) -> Verdict {
    evaluate_pair_with(a, b, &MatchingConfig::default())
}

/// Compare two entries, skipping rules disabled in `config`.
pub fn evaluate_pair_with(a: &Entry, b: &Entry, config: &MatchingConfig) -> Verdict {
    MatchRule::ORDER
        .into_iter()
        .filter(|rule| config.is_enabled(*rule))
        .find(|rule| rule.applies(a, b, config))
        .map_or(Verdict::Distinct, Verdict::Duplicate)
}

/// Two entries judged to be the same work. `first` precedes `second` in the
/// source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicatePair {
    pub first: String,
    pub second: String,
    pub rule: MatchRule,
}

/// All duplicate pairs found in one document, in first-seen order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DuplicateReport {
    pub pairs: Vec<DuplicatePair>,
    pub entries_compared: usize,
}

impl DuplicateReport {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DuplicatePair> {
        self.pairs.iter()
    }

    /// `(first, second)` citation keys of every pair.
    pub fn key_pairs(&self) -> Vec<(&str, &str)> {
        self.pairs
            .iter()
            .map(|p| (p.first.as_str(), p.second.as_str()))
            .collect()
    }

    /// Keys that appear in at least one pair, each once, in first-seen order.
    pub fn implicated_keys(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.pairs
            .iter()
            .flat_map(|p| [p.first.as_str(), p.second.as_str()])
            .filter(|key| seen.insert(*key))
            .collect()
    }
}

impl<'a> IntoIterator for &'a DuplicateReport {
    type Item = &'a DuplicatePair;
    type IntoIter = std::slice::Iter<'a, DuplicatePair>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Find duplicate pairs among `entries` with the default configuration.
pub fn find_duplicates(entries: &[Entry]) -> DuplicateReport {
    find_duplicates_with(entries, &MatchingConfig::default())
}

/// Compare every unordered pair of `entries` once and collect the duplicates.
///
/// Pairs are formed by position, not by citation key. Two distinct entries
/// that share a key (a document that cites `A` twice) are compared like any
/// other pair and, when they match, reported as `("A", "A")`.
pub fn find_duplicates_with(entries: &[Entry], config: &MatchingConfig) -> DuplicateReport {
    let mut pairs = Vec::new();

    for (i, a) in entries.iter().enumerate() {
        for b in &entries[i + 1..] {
            if let Verdict::Duplicate(rule) = evaluate_pair_with(a, b, config) {
                tracing::trace!(first = a.key(), second = b.key(), %rule, "duplicate pair");
                pairs.push(DuplicatePair {
                    first: a.key().to_string(),
                    second: b.key().to_string(),
                    rule,
                });
            }
        }
    }

    DuplicateReport {
        pairs,
        entries_compared: entries.len(),
    }
}
