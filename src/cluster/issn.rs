//! ISSN validation and normalisation

use once_cell::sync::Lazy;
use regex::Regex;

/// ISSN shape: four digits, hyphen, three digits and a check character.
/// The check character may be a lowercase or uppercase X.
static ISSN_RX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{3}[\dxX]$").expect("valid ISSN pattern"));

/// Whether a string has the ISSN shape
pub fn is_valid(issn: &str) -> bool {
    ISSN_RX.is_match(issn)
}

/// Keep only the valid identifiers of a row, uppercased
///
/// Invalid identifiers are dropped entirely rather than flagged: upstream
/// data is expected to be messy, and a malformed identifier must not enter
/// clustering in any form.
pub fn valid_issns(row: &[String]) -> Vec<String> {
    row.iter()
        .filter(|issn| ISSN_RX.is_match(issn))
        .map(|issn| issn.to_uppercase())
        .collect()
}

/// Drop invalid identifiers from every row, discarding rows with no valid
/// member left
pub fn remove_invalid(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| valid_issns(row))
        .filter(|row| !row.is_empty())
        .collect()
}

/// Hyphen-stripped secondary form, used for downstream index lookup only —
/// never for clustering
pub fn unhyphenated(issn: &str) -> String {
    issn.replace('-', "")
}
