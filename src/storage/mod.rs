//! Versioned file-system storage
//!
//! Every entity owns a storage scope: a directory holding timestamped
//! instance subdirectories, one per pipeline run. Instance names are
//! zero-padded UTC timestamps, so lexicographic order equals creation order
//! and the most recent instance is the greatest name. A retention policy
//! keeps the N most recent instances per scope and deletes the rest.
//!
//! The store assumes a single pipeline invocation per scope at a time; there
//! is no cross-process locking.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Settings;

/// Instance directory name format. Second resolution keeps names
/// collision-free under sequential invocation.
pub const INSTANCE_DATE_FORMAT: &str = "%Y-%m-%d_%H%M%S";

/// Error type for storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    /// A stage required pre-existing data but the scope has no instances
    #[error("no current instance for scope '{scope}'")]
    NoCurrentInstance { scope: String },

    /// A file operation was attempted before an instance was selected
    #[error("no instance selected for scope '{scope}'")]
    NoInstanceSelected { scope: String },

    /// IO error with path context
    #[error("{message} ({path}): {source}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// One or more instance deletions failed during retention cleanup
    #[error("cleanup failed for scope '{scope}': {}", .failures.join("; "))]
    Cleanup { scope: String, failures: Vec<String> },
}

impl StorageError {
    fn io(path: impl Into<PathBuf>, message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: message.into(),
            source,
        }
    }
}

/// Per-entity versioned file store
///
/// Wraps one storage scope and tracks the selected instance. Stages select
/// an instance with [`FileStore::fresh`] (write-producing stages) or
/// [`FileStore::resolve_current`] (read-dependent stages) before touching
/// files.
#[derive(Debug)]
pub struct FileStore {
    scope: String,
    dir: PathBuf,
    keep_historic: usize,
    instance: Option<String>,
}

impl FileStore {
    /// Create a store for an entity's scope. Path math only; nothing is
    /// created until files are written.
    pub fn new(settings: &Settings, scope: &str) -> Self {
        Self {
            scope: scope.to_string(),
            dir: settings.scope_dir(scope),
            keep_historic: settings.keep_historic_for(scope),
            instance: None,
        }
    }

    /// The scope id this store belongs to
    pub fn scope(&self) -> &str {
        &self.scope
    }

    /// The scope directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The selected instance name, if any
    pub fn instance(&self) -> Option<&str> {
        self.instance.as_deref()
    }

    /// The selected instance name, or an error if none is selected
    pub fn instance_name(&self) -> Result<&str, StorageError> {
        self.instance
            .as_deref()
            .ok_or_else(|| StorageError::NoInstanceSelected {
                scope: self.scope.clone(),
            })
    }

    /// Mint and select a brand-new instance named from the current UTC time
    pub fn fresh(&mut self) -> &str {
        let name = Utc::now().format(INSTANCE_DATE_FORMAT).to_string();
        debug!(scope = %self.scope, instance = %name, "minted fresh instance");
        self.instance.insert(name).as_str()
    }

    /// Select the most recent instance in the scope
    ///
    /// With `make_fresh`, an empty scope gets a fresh instance instead;
    /// otherwise an empty scope is a [`StorageError::NoCurrentInstance`]
    /// error so that stages acting on previously produced data fail loudly.
    pub fn resolve_current(&mut self, make_fresh: bool) -> Result<&str, StorageError> {
        match self.instances()?.into_iter().max() {
            Some(name) => Ok(self.instance.insert(name).as_str()),
            None if make_fresh => Ok(self.fresh()),
            None => Err(StorageError::NoCurrentInstance {
                scope: self.scope.clone(),
            }),
        }
    }

    /// Creation time of the current (most recent) instance, parsed from its
    /// name, without selecting it. `None` when the scope has no instances
    /// with a parseable name.
    pub fn current_created(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        Ok(self.instances()?.into_iter().max().and_then(|name| {
            NaiveDateTime::parse_from_str(&name, INSTANCE_DATE_FORMAT)
                .ok()
                .map(|naive| naive.and_utc())
        }))
    }

    /// Absolute path of `filename` inside the selected instance, creating
    /// the instance directory if needed. Idempotent.
    pub fn path_for(&self, filename: &str) -> Result<PathBuf, StorageError> {
        let dir = self.instance_dir()?;
        fs::create_dir_all(&dir)
            .map_err(|e| StorageError::io(&dir, "creating instance directory", e))?;
        Ok(dir.join(filename))
    }

    /// Buffered write handle for a file inside the selected instance
    pub fn open_output(&self, filename: &str) -> Result<BufWriter<File>, StorageError> {
        let path = self.path_for(filename)?;
        let file =
            File::create(&path).map_err(|e| StorageError::io(&path, "creating output file", e))?;
        Ok(BufWriter::new(file))
    }

    /// Buffered read handle for a file inside the selected instance
    pub fn open_input(&self, filename: &str) -> Result<BufReader<File>, StorageError> {
        let path = self.path_for(filename)?;
        let file =
            File::open(&path).map_err(|e| StorageError::io(&path, "opening input file", e))?;
        Ok(BufReader::new(file))
    }

    /// Filenames in the selected instance ending with `suffix`, read fresh
    /// from the directory on every call
    pub fn list_files(&self, suffix: &str) -> Result<Vec<String>, StorageError> {
        let dir = self.instance_dir()?;
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        let entries = fs::read_dir(&dir)
            .map_err(|e| StorageError::io(&dir, "reading instance directory", e))?;
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::io(&dir, "reading directory entry", e))?;
            if entry.path().is_file()
                && let Some(name) = entry.file_name().to_str()
                && name.ends_with(suffix)
            {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Delete all but the N most recent instances for this scope
    ///
    /// No-op when the scope directory does not exist or holds at most N
    /// instances. Every deletion is attempted independently; failures are
    /// collected and reported together after the pass.
    pub fn cleanup(&self) -> Result<(), StorageError> {
        let mut names = self.instances()?;
        if names.len() <= self.keep_historic {
            return Ok(());
        }
        names.sort_by(|a, b| b.cmp(a));

        let mut failures = Vec::new();
        for name in names.iter().skip(self.keep_historic) {
            let path = self.dir.join(name);
            debug!(scope = %self.scope, instance = %name, "removing expired instance");
            if let Err(e) = fs::remove_dir_all(&path) {
                warn!(scope = %self.scope, instance = %name, error = %e, "failed to remove instance");
                failures.push(format!("{}: {e}", path.display()));
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StorageError::Cleanup {
                scope: self.scope.clone(),
                failures,
            })
        }
    }

    fn instance_dir(&self) -> Result<PathBuf, StorageError> {
        Ok(self.dir.join(self.instance_name()?))
    }

    /// Instance subdirectory names currently present in the scope
    fn instances(&self) -> Result<Vec<String>, StorageError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| StorageError::io(&self.dir, "reading scope directory", e))?;
        for entry in entries {
            let entry =
                entry.map_err(|e| StorageError::io(&self.dir, "reading directory entry", e))?;
            if entry.path().is_dir()
                && let Some(name) = entry.file_name().to_str()
            {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }
}
