//! Identifier coincidence clustering
//!
//! Merges pairwise coincident-identifier observations from several sources
//! into maximal disjoint clusters: every identifier that appears in at least
//! one valid coincidence record ends up in exactly one cluster, with
//! transitive relationships resolved. Connected components are computed with
//! a disjoint-set structure, which terminates for every input shape and
//! makes re-clustering an already-clustered output a fixed point.

pub mod issn;
pub mod prefer;

use std::collections::HashMap;

use petgraph::unionfind::UnionFind;

use crate::analysis::{Analysis, AnalysisError};

/// Concatenate analysis rows, tagging each with its source id as the
/// trailing column, then sort and drop exact duplicates
pub fn cat_and_dedupe(analyses: &[Analysis]) -> Result<Vec<Vec<String>>, AnalysisError> {
    let mut rows = Vec::new();
    for analysis in analyses {
        for mut row in analysis.entries()? {
            row.push(analysis.source().to_string());
            rows.push(row);
        }
    }
    rows.sort();
    rows.dedup();
    Ok(rows)
}

/// Cluster coincident-identifier analyses into disjoint identifier sets
///
/// Output: one row per cluster, `[primary, member, ...]`, members sorted and
/// de-duplicated, clusters sorted by primary. The primary is the smallest
/// member.
pub fn issn_clusters(analyses: &[Analysis]) -> Result<Vec<Vec<String>>, AnalysisError> {
    let rows = cat_and_dedupe(analyses)?;
    Ok(cluster_rows(&rows))
}

/// Cluster plain coincidence rows
///
/// Each row is an identifier followed by zero or more identifiers observed
/// to denote the same entity (trailing non-identifier columns, such as
/// source tags, are filtered out by validation). An identifier with no
/// surviving relations forms a singleton cluster.
pub fn cluster_rows(rows: &[Vec<String>]) -> Vec<Vec<String>> {
    let valid = issn::remove_invalid(rows);

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut idents: Vec<&str> = Vec::new();
    for row in &valid {
        for ident in row {
            if !index.contains_key(ident.as_str()) {
                index.insert(ident.as_str(), idents.len());
                idents.push(ident.as_str());
            }
        }
    }

    let mut sets: UnionFind<usize> = UnionFind::new(idents.len());
    for row in &valid {
        let first = index[row[0].as_str()];
        for related in &row[1..] {
            sets.union(first, index[related.as_str()]);
        }
    }

    let labels = sets.into_labeling();
    let mut clusters: HashMap<usize, Vec<String>> = HashMap::new();
    for (i, ident) in idents.iter().enumerate() {
        clusters
            .entry(labels[i])
            .or_default()
            .push((*ident).to_string());
    }

    let mut out: Vec<Vec<String>> = clusters
        .into_values()
        .map(|mut members| {
            members.sort();
            members.dedup();
            members
        })
        .collect();
    out.sort();
    out
}

/// Index candidate rows by their leading identifier, keeping the next
/// `width` columns of each row
pub fn cluster_to_map(rows: &[Vec<String>], width: usize) -> HashMap<String, Vec<Vec<String>>> {
    let mut map: HashMap<String, Vec<Vec<String>>> = HashMap::new();
    for row in rows {
        let Some(key) = row.first() else { continue };
        let values: Vec<String> = row[1..].iter().take(width).cloned().collect();
        map.entry(key.clone()).or_default().push(values);
    }
    map
}
