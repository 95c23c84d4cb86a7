use once_cell::sync::Lazy;
use regex::Regex;

use bibdup_core::{Entry, ParsingConfig};

/// Parse BibTeX text into entries with the default configuration.
pub fn parse_entries(content: &str) -> Vec<Entry> {
    parse_entries_with(content, &ParsingConfig::default())
}

/// Parse BibTeX text into entries, in document order.
///
/// Uses the `biblatex` crate on the whole document first. If that fails and
/// `recover_entries` is set, each `@type{...}` block is parsed on its own and
/// the malformed ones are dropped, so a broken entry never shows up as a
/// half-filled [`Entry`].
pub fn parse_entries_with(content: &str, config: &ParsingConfig) -> Vec<Entry> {
    match biblatex::Bibliography::parse(content) {
        Ok(bibliography) => bibliography.iter().map(to_entry).collect(),
        Err(e) if config.recover_entries => {
            tracing::debug!(error = %e, "whole-document parse failed, parsing entries individually");
            parse_entries_individually(content)
        }
        Err(e) => {
            tracing::debug!(error = %e, "whole-document parse failed, entry recovery disabled");
            Vec::new()
        }
    }
}

/// Split content at each `@type` and parse every block independently.
fn parse_entries_individually(content: &str) -> Vec<Entry> {
    // An entry starts a line (often indented) or follows whitespace or the
    // closing brace of the previous entry on the same line.
    static ENTRY_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)(?:^|[}\s])[ \t]*@[a-zA-Z]").unwrap());

    // Split at the `@` itself, not at the brace or whitespace before it.
    let positions: Vec<usize> = ENTRY_RE
        .find_iter(content)
        .filter_map(|m| m.as_str().find('@').map(|at| m.start() + at))
        .collect();
    let mut entries = Vec::new();

    for (i, &start) in positions.iter().enumerate() {
        let end = positions.get(i + 1).copied().unwrap_or(content.len());
        let chunk = &content[start..end];

        match biblatex::Bibliography::parse(chunk) {
            Ok(bib) => entries.extend(bib.iter().map(to_entry)),
            Err(e) => tracing::debug!(offset = start, error = %e, "dropping malformed entry"),
        }
    }

    entries
}

fn to_entry(entry: &biblatex::Entry) -> Entry {
    let field = |name: &str| entry.get(name).map(chunks_to_string);
    let parsed = Entry::from_fields(
        entry.key.clone(),
        field("title"),
        field("year"),
        field("doi"),
    );
    tracing::trace!(
        key = parsed.key(),
        has_title = parsed.title().is_some(),
        has_year = parsed.year().is_some(),
        has_doi = parsed.doi().is_some(),
        "parsed entry"
    );
    parsed
}

/// Convert biblatex chunks to a plain string.
fn chunks_to_string(chunks: &[biblatex::Spanned<biblatex::Chunk>]) -> String {
    chunks
        .iter()
        .map(|c| match &c.v {
            biblatex::Chunk::Normal(s) => s.as_str(),
            biblatex::Chunk::Verbatim(s) => s.as_str(),
            biblatex::Chunk::Math(s) => s.as_str(),
        })
        .collect::<Vec<_>>()
        .join("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_fields() {
        let bib = r#"
@article{doe2023,
  title={A Very Important Research Paper Title},
  author={Doe, John and Smith, Jane},
  journal={Journal of Testing},
  year={2023},
  doi={10.1234/test.2023}
}
"#;
        let entries = parse_entries(bib);
        assert_eq!(entries.len(), 1);

        let e = &entries[0];
        assert_eq!(e.key(), "doe2023");
        assert_eq!(e.title(), Some("A Very Important Research Paper Title"));
        assert_eq!(e.year(), Some("2023"));
        assert_eq!(e.doi(), Some("10.1234/test.2023"));
    }

    #[test]
    fn test_parse_missing_fields_are_none() {
        let bib = r#"
@misc{bare,
  author={Author, Test}
}
"#;
        let entries = parse_entries(bib);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title(), None);
        assert_eq!(entries[0].year(), None);
        assert_eq!(entries[0].doi(), None);
    }

    #[test]
    fn test_parse_keeps_document_order() {
        let bib = r#"
    @article{B,
      title={Second Written First},
      year={2021}
    }
    @article{A,
      title={First Written Second},
      year={2021}
    }
"#;
        let keys: Vec<String> = parse_entries(bib)
            .iter()
            .map(|e| e.key().to_string())
            .collect();
        assert_eq!(keys, vec!["B", "A"]);
    }

    #[test]
    fn test_parse_accented_title() {
        let bib = r#"
@inproceedings{jegou2020,
  title={Radioactive data: tracing through training with J{\'e}gou},
  year={2020}
}
"#;
        let entries = parse_entries(bib);
        assert_eq!(entries.len(), 1);
        let title = entries[0].title().unwrap();
        assert!(title.starts_with("Radioactive data"), "title: {title}");
        assert!(title.contains("gou"), "title: {title}");
    }

    #[test]
    fn test_parse_recovers_from_malformed_entry() {
        let bib = r#"
    @article{A,
      title={Bad Entry}
    }
    @article{B,
      title={Also Bad"
    "#;
        let entries = parse_entries(bib);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key(), "A");
        assert_eq!(entries[0].title(), Some("Bad Entry"));
    }

    #[test]
    fn test_parse_recovery_keeps_entries_after_broken_one() {
        let bib = r#"
@article{A,
  title={First Paper},
  year={2021}
}
@article{B,
  title={Broken {Paper},
  year={2021}

@article{C,
  title={Third Paper},
  year={2022}
}
"#;
        let keys: Vec<String> = parse_entries(bib)
            .iter()
            .map(|e| e.key().to_string())
            .collect();
        assert_eq!(keys, vec!["A", "C"]);
    }

    #[test]
    fn test_parse_recovery_splits_entries_sharing_a_line() {
        let bib = "@article{A, title={X}, year={2021}} @article{B, title={Y}, year={2021}} @article{C, title={Z";
        let keys: Vec<String> = parse_entries(bib)
            .iter()
            .map(|e| e.key().to_string())
            .collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn test_parse_recovery_splits_after_closing_brace() {
        let bib = "@article{A, title={X}, year={2021}}@article{B, title={Y}, year={2021}}@article{C, title={Z";
        let keys: Vec<String> = parse_entries(bib)
            .iter()
            .map(|e| e.key().to_string())
            .collect();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn test_parse_without_recovery_drops_everything() {
        let bib = r#"
@article{A,
  title={Bad Entry}
}
@article{B,
  title={Also Bad"
"#;
        let config = ParsingConfig {
            recover_entries: false,
        };
        assert!(parse_entries_with(bib, &config).is_empty());
    }

    #[test]
    fn test_parse_empty_and_non_bib_input() {
        assert!(parse_entries("").is_empty());
        assert!(parse_entries("   \n\t ").is_empty());
    }

    #[test]
    fn test_chunks_to_string_joins_braced_parts() {
        let bib = r#"
@article{gpu,
  title={Training {GPU} Kernels},
  year={2020}
}
"#;
        let entries = parse_entries(bib);
        assert_eq!(entries[0].title(), Some("Training GPU Kernels"));
    }
}
