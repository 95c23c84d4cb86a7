use once_cell::sync::Lazy;
use regex::Regex;

static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Punctuation (any Unicode `P*` category, plus ASCII symbols like `$` or `~`)
/// and whitespace at either end of a title.
static EDGE_PUNCT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\s\p{P}[:punct:]]+|[\s\p{P}[:punct:]]+$").unwrap()
});

/// Resolver prefixes that may wrap a bare DOI (`https://doi.org/`, `doi:` ...).
static DOI_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:https?://(?:dx\.)?doi\.org/|doi:\s*)").unwrap());

/// Normalize a title for equality comparison.
///
/// Steps (order matters):
/// 1. Lowercase
/// 2. Collapse whitespace runs (line breaks and indentation from the BibTeX
///    source included) to a single space
/// 3. Strip punctuation and whitespace from both ends
///
/// Interior punctuation and spelling are left alone, so `"Learnng"` and
/// `"Learning"` stay distinct.
pub fn normalize_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let collapsed = WS_RE.replace_all(&lower, " ");
    EDGE_PUNCT_RE.replace_all(&collapsed, "").into_owned()
}

/// Trimmed year, or `None` when blank.
pub fn normalize_year(year: &str) -> Option<&str> {
    let year = year.trim();
    (!year.is_empty()).then_some(year)
}

/// Trim a DOI and optionally drop a resolver prefix. Case is preserved.
pub fn normalize_doi(doi: &str, strip_url: bool) -> &str {
    let doi = doi.trim();
    if !strip_url {
        return doi;
    }
    match DOI_PREFIX_RE.find(doi) {
        Some(m) => &doi[m.end()..],
        None => doi,
    }
}
