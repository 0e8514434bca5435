//! Clustering and preference resolution properties

use dataimport::analysis::Analysis;
use dataimport::cluster::prefer::{Candidate, extract_preferred};
use dataimport::cluster::{cluster_rows, issn_clusters};

fn rows(data: &[&[&str]]) -> Vec<Vec<String>> {
    data.iter()
        .map(|row| row.iter().map(|s| s.to_string()).collect())
        .collect()
}

#[test]
fn test_transitivity() {
    let clusters = cluster_rows(&rows(&[
        &["1111-1111", "2222-2222"],
        &["2222-2222", "3333-3333"],
    ]));
    assert_eq!(clusters, rows(&[&["1111-1111", "2222-2222", "3333-3333"]]));
}

#[test]
fn test_disjointness() {
    let clusters = cluster_rows(&rows(&[
        &["1111-1111", "2222-2222"],
        &["3333-3333", "4444-4444"],
        &["4444-4444", "5555-5555"],
        &["6666-6666", ""],
    ]));

    let mut seen = std::collections::HashSet::new();
    for cluster in &clusters {
        for member in cluster {
            assert!(seen.insert(member.clone()), "{member} appears twice");
        }
    }
    assert_eq!(clusters.len(), 3);
}

#[test]
fn test_idempotence() {
    let once = cluster_rows(&rows(&[
        &["1111-1111", "2222-2222"],
        &["2222-2222", "3333-3333"],
        &["4444-4444", ""],
    ]));
    assert_eq!(cluster_rows(&once), once);
}

#[test]
fn test_partial_clusters_merge_through_shared_member() {
    // the same identifier related to two disjoint partners must pull
    // everything into one cluster
    let clusters = cluster_rows(&rows(&[
        &["1111-1111", "2222-2222"],
        &["1111-1111", "3333-3333"],
    ]));
    assert_eq!(clusters, rows(&[&["1111-1111", "2222-2222", "3333-3333"]]));
}

#[test]
fn test_issn_validation() {
    let clusters = cluster_rows(&rows(&[
        &["1234-5678", "1234-567X"],
        &["abcd-efgh", "1234-5678"],
        &["12345678", ""],
    ]));
    // invalid identifiers dropped entirely, valid relation survives
    assert_eq!(clusters, rows(&[&["1234-5678", "1234-567X"]]));
}

#[test]
fn test_lowercase_check_character_normalised() {
    let clusters = cluster_rows(&rows(&[&["1234-567x", ""]]));
    assert_eq!(clusters, rows(&[&["1234-567X"]]));
}

#[test]
fn test_two_record_scenario() {
    let analysis = Analysis::from_rows(
        "journals",
        vec![
            vec!["1234-5678".to_string(), "1234-567X".to_string()],
            vec!["1234-567X".to_string(), "".to_string()],
        ],
    );
    let clusters = issn_clusters(&[analysis]).unwrap();
    assert_eq!(clusters, rows(&[&["1234-5678", "1234-567X"]]));
}

#[test]
fn test_preference_resolution_determinism() {
    let candidates = vec![
        Candidate::new("sourceB", "X"),
        Candidate::new("sourceA", "Y"),
    ];
    let order = vec!["sourceA".to_string(), "sourceB".to_string()];

    let preferred = extract_preferred(&candidates, &order).unwrap();
    assert_eq!(preferred.canonical, "Y");
    assert_eq!(preferred.alternates, vec!["X"]);

    // same input, same output
    let again = extract_preferred(&candidates, &order).unwrap();
    assert_eq!(preferred, again);
}
