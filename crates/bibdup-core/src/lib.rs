use std::path::PathBuf;

use once_cell::unsync::OnceCell;
use thiserror::Error;

pub mod config_file;
pub mod matcher;
pub mod normalize;

// Re-export for convenience
pub use matcher::{
    DuplicatePair, DuplicateReport, MatchRule, Verdict, evaluate_pair, evaluate_pair_with,
    find_duplicates, find_duplicates_with,
};
pub use normalize::{normalize_doi, normalize_title, normalize_year};

/// Fewest parsed entries a document needs before pairs can be compared.
pub const MIN_ENTRIES: usize = 2;

/// A bibliographic entry parsed from a BibTeX document.
///
/// Fields are `None` when absent from the source and `Some("")` when present
/// but empty. The normalized title is computed on first use and cached.
#[derive(Debug, Clone)]
pub struct Entry {
    key: String,
    title: Option<String>,
    year: Option<String>,
    doi: Option<String>,
    normalized_title: OnceCell<Option<String>>,
}

impl Entry {
    /// An entry with only a citation key; add fields with the `with_*` builders.
    pub fn new(key: impl Into<String>) -> Self {
        Self::from_fields(key, None, None, None)
    }

    pub fn from_fields(
        key: impl Into<String>,
        title: Option<String>,
        year: Option<String>,
        doi: Option<String>,
    ) -> Self {
        Self {
            key: key.into(),
            title,
            year,
            doi,
            normalized_title: OnceCell::new(),
        }
    }

    pub fn with_title(self, title: impl Into<String>) -> Self {
        Self::from_fields(self.key, Some(title.into()), self.year, self.doi)
    }

    pub fn with_year(self, year: impl Into<String>) -> Self {
        Self::from_fields(self.key, self.title, Some(year.into()), self.doi)
    }

    pub fn with_doi(self, doi: impl Into<String>) -> Self {
        Self::from_fields(self.key, self.title, self.year, Some(doi.into()))
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn year(&self) -> Option<&str> {
        self.year.as_deref()
    }

    pub fn doi(&self) -> Option<&str> {
        self.doi.as_deref()
    }

    /// Title after [`normalize_title`], or `None` if the entry has no title.
    pub fn normalized_title(&self) -> Option<&str> {
        self.normalized_title
            .get_or_init(|| self.title.as_deref().map(normalize_title))
            .as_deref()
    }
}

#[derive(Error, Debug)]
pub enum DedupError {
    #[error("The input data does not contain enough articles to detect duplicates.")]
    InsufficientData { found: usize },
    #[error("config error in {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },
}

/// Settings for turning BibTeX text into entries.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    /// Parse entries one by one when the whole document fails to parse,
    /// dropping the ones that are malformed.
    pub recover_entries: bool,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            recover_entries: true,
        }
    }
}

/// Settings for pairwise comparison.
#[derive(Debug, Clone, Default)]
pub struct MatchingConfig {
    /// Rules skipped during evaluation.
    pub disabled_rules: Vec<MatchRule>,
    /// Compare `https://doi.org/10.x/y` and `10.x/y` as the same DOI.
    pub strip_doi_url: bool,
}

impl MatchingConfig {
    pub fn is_enabled(&self, rule: MatchRule) -> bool {
        !self.disabled_rules.contains(&rule)
    }
}

/// Configuration for a detection run.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub parsing: ParsingConfig,
    pub matching: MatchingConfig,
}

impl Config {
    /// Build a runtime config from an on-disk one, filling gaps with defaults.
    pub fn from_file(file: &config_file::ConfigFile) -> Self {
        let defaults = Config::default();

        let recover_entries = file
            .parsing
            .as_ref()
            .and_then(|p| p.recover_entries)
            .unwrap_or(defaults.parsing.recover_entries);

        let mut disabled_rules = Vec::new();
        for name in file
            .matching
            .as_ref()
            .and_then(|m| m.disabled_rules.as_deref())
            .unwrap_or_default()
        {
            match MatchRule::from_name(name) {
                Some(rule) if !disabled_rules.contains(&rule) => disabled_rules.push(rule),
                Some(_) => {}
                None => tracing::warn!(rule = %name, "ignoring unknown match rule in config"),
            }
        }

        let strip_doi_url = file
            .matching
            .as_ref()
            .and_then(|m| m.strip_doi_url)
            .unwrap_or(defaults.matching.strip_doi_url);

        Self {
            parsing: ParsingConfig { recover_entries },
            matching: MatchingConfig {
                disabled_rules,
                strip_doi_url,
            },
        }
    }
}
