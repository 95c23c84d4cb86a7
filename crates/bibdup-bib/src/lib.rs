//! Duplicate citation detection for BibTeX documents.
//!
//! ```no_run
//! let bib = r#"
//! @article{A, title={Deep Learning for Cats}, year={2021}, doi={10.1000/abc}}
//! @article{B, title={deep learning for cats!}, year={2021}}
//! "#;
//! let report = bibdup_bib::detect_duplicates(bib)?;
//! assert_eq!(report.key_pairs(), vec![("A", "B")]);
//! # Ok::<(), bibdup_bib::DedupError>(())
//! ```

pub mod parser;

pub use bibdup_core::{
    Config, DedupError, DuplicatePair, DuplicateReport, Entry, MIN_ENTRIES, MatchRule,
    MatchingConfig, ParsingConfig, Verdict,
};
pub use parser::{parse_entries, parse_entries_with};

/// Find duplicate entries in a BibTeX document using the default configuration.
///
/// Returns [`DedupError::InsufficientData`] when fewer than two entries could
/// be parsed, which includes empty input and documents whose entries are
/// malformed.
pub fn detect_duplicates(content: &str) -> Result<DuplicateReport, DedupError> {
    detect_duplicates_with(content, &Config::default())
}

/// Find duplicate entries in a BibTeX document.
pub fn detect_duplicates_with(
    content: &str,
    config: &Config,
) -> Result<DuplicateReport, DedupError> {
    let entries = parse_entries_with(content, &config.parsing);

    if entries.len() < MIN_ENTRIES {
        tracing::warn!(
            entries = entries.len(),
            "not enough entries to detect duplicates"
        );
        return Err(DedupError::InsufficientData {
            found: entries.len(),
        });
    }

    let report = bibdup_core::find_duplicates_with(&entries, &config.matching);
    tracing::info!(
        entries = entries.len(),
        duplicates = report.len(),
        "duplicate detection complete"
    );
    Ok(report)
}
