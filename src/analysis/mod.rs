//! Analysis results exchanged between pipeline entities
//!
//! Datasources expose their derived artifacts to downstream products through
//! a capability query: a product asks `provides_analysis(kind)` and, where
//! supported, retrieves an [`Analysis`] whose `entries()` is a finite,
//! restartable row sequence. Products expose assembled feeds to targets the
//! same way via [`FormatKind`] and [`JsonFeed`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Error reading an analysis or feed backing file
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("IO error with {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Analysis kinds a datasource may provide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    /// Pairs of identifiers observed to denote the same journal
    CoincidentIssns,
    /// Identifier-to-title candidates with a main/alt marker
    Titles,
    /// Identifier-to-publisher candidates
    Publishers,
}

impl AnalysisKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CoincidentIssns => "coincident_issns",
            Self::Titles => "titles",
            Self::Publishers => "publishers",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone)]
enum Entries {
    Rows(Vec<Vec<String>>),
    CsvFile(PathBuf),
}

/// A source-tagged analysis result
///
/// Backed either by an in-memory row list or by a CSV file re-opened on
/// every read, so `entries()` can be consumed repeatedly.
#[derive(Debug, Clone)]
pub struct Analysis {
    source: String,
    entries: Entries,
}

impl Analysis {
    /// Analysis over a concrete row list
    pub fn from_rows(source: impl Into<String>, rows: Vec<Vec<String>>) -> Self {
        Self {
            source: source.into(),
            entries: Entries::Rows(rows),
        }
    }

    /// Analysis backed by a CSV file
    pub fn from_csv(source: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            entries: Entries::CsvFile(path.into()),
        }
    }

    /// Id of the datasource this analysis came from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The full row set
    pub fn entries(&self) -> Result<Vec<Vec<String>>, AnalysisError> {
        match &self.entries {
            Entries::Rows(rows) => Ok(rows.clone()),
            Entries::CsvFile(path) => read_csv_rows(path),
        }
    }
}

/// Read all rows of a headerless CSV file
pub fn read_csv_rows(path: &Path) -> Result<Vec<Vec<String>>, AnalysisError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|e| AnalysisError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| AnalysisError::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

/// Feed formats a product may provide to targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatKind {
    /// One JSON object per line
    JsonFeed,
}

/// A line-by-line JSON feed over a product artifact
#[derive(Debug, Clone)]
pub struct JsonFeed {
    path: PathBuf,
}

impl JsonFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records in the feed; the file is re-opened per call
    pub fn entries(&self) -> Result<Vec<serde_json::Value>, AnalysisError> {
        let file = File::open(&self.path).map_err(|e| AnalysisError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| AnalysisError::Io {
                path: self.path.clone(),
                source: e,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(
                serde_json::from_str(&line).map_err(|e| AnalysisError::Json {
                    path: self.path.clone(),
                    source: e,
                })?,
            );
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_rows_backed_entries_are_restartable() {
        let analysis = Analysis::from_rows(
            "journals",
            vec![vec!["1234-5678".to_string(), "1234-567X".to_string()]],
        );
        assert_eq!(analysis.source(), "journals");
        assert_eq!(analysis.entries().unwrap().len(), 1);
        assert_eq!(analysis.entries().unwrap().len(), 1);
    }

    #[test]
    fn test_csv_backed_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("titles.csv");
        std::fs::write(&path, "1234-5678,Nature,main\n1234-5678,Nat.,alt\n").unwrap();

        let analysis = Analysis::from_csv("journals", &path);
        let rows = analysis.entries().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec!["1234-5678", "Nature", "main"]);
    }

    #[test]
    fn test_json_feed_entries() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("jac.json");
        let mut file = File::create(&path).unwrap();
        writeln!(file, r#"{{"title": "Nature"}}"#).unwrap();
        writeln!(file, r#"{{"title": "Science"}}"#).unwrap();

        let feed = JsonFeed::new(&path);
        let records = feed.entries().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["title"], "Nature");
        // restartable
        assert_eq!(feed.entries().unwrap().len(), 2);
    }
}
