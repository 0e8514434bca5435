//! Canonical value selection over competing source candidates

/// A candidate value attributed to a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub source: String,
    pub value: String,
}

impl Candidate {
    pub fn new(source: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            value: value.into(),
        }
    }
}

/// A preference-resolved value and its alternates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preferred {
    /// The single canonical value
    pub canonical: String,
    /// Remaining distinct values, canonical excluded, in first-seen order
    pub alternates: Vec<String>,
}

/// Pick the canonical value for a cluster field
///
/// Scans `preference_order` and returns the value of the first candidate
/// whose source is ranked. When no candidate's source appears in the
/// preference list, the fallback is the first candidate in input order —
/// deterministic by construction, never varying between runs on equal
/// input. `None` only when there are no candidates at all.
pub fn extract_preferred(candidates: &[Candidate], preference_order: &[String]) -> Option<Preferred> {
    let first = candidates.first()?;

    let canonical = preference_order
        .iter()
        .find_map(|source| candidates.iter().find(|c| &c.source == source))
        .unwrap_or(first)
        .value
        .clone();

    let mut alternates = Vec::new();
    for candidate in candidates {
        if candidate.value != canonical && !alternates.contains(&candidate.value) {
            alternates.push(candidate.value.clone());
        }
    }

    Some(Preferred {
        canonical,
        alternates,
    })
}
