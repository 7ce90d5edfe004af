//! Report persistence.
//!
//! One pretty-printed JSON document per reviewed file, written to
//! `<scope dir>/review_<sequence_id>.json`. Listing reads every
//! `review_*.json` under the scope; read order is not guaranteed to match
//! sequence order, so callers sort when order matters.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::models::{ReviewRecord, ScopeKey};

/// Browsing-time failure. Never affects a running review.
#[derive(Debug, Error)]
pub enum ReportReadError {
    #[error("report file not found: {0}")]
    Missing(String),
    #[error("failed to read report {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("report {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
}

/// Persists and loads review records under a project/user-scoped directory.
pub struct ReportStore {
    data_root: PathBuf,
    user_root: PathBuf,
}

impl ReportStore {
    pub fn new(data_root: impl Into<PathBuf>, user_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            user_root: user_root.into(),
        }
    }

    /// Path a record for this scope and sequence id is stored at.
    pub fn report_path(&self, scope: &ScopeKey, sequence_id: u32) -> PathBuf {
        scope
            .report_dir(&self.data_root, &self.user_root)
            .join(format!("review_{}.json", sequence_id))
    }

    /// Write one record. Parent directories are created as needed.
    pub fn save(&self, scope: &ScopeKey, record: &ReviewRecord) -> Result<PathBuf> {
        let path = self.report_path(scope, record.sequence_id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create report directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(record)?;
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;

        Ok(path)
    }

    /// Read one record back.
    pub fn load(&self, path: &Path) -> Result<ReviewRecord, ReportReadError> {
        if !path.exists() {
            return Err(ReportReadError::Missing(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| ReportReadError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        serde_json::from_str(&content).map_err(|e| ReportReadError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// All records saved under a scope, sorted by sequence id.
    ///
    /// A missing scope directory yields an empty list (nothing reviewed
    /// yet); individual unreadable files surface as errors.
    pub fn list(&self, scope: &ScopeKey) -> Result<Vec<ReviewRecord>, ReportReadError> {
        let dir = scope.report_dir(&self.data_root, &self.user_root);
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&dir).map_err(|e| ReportReadError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;

        let mut records = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ReportReadError::Io {
                path: dir.display().to_string(),
                source: e,
            })?;
            let name = entry.file_name().to_string_lossy().to_string();
            if !name.starts_with("review_") || !name.ends_with(".json") {
                continue;
            }
            records.push(self.load(&entry.path())?);
        }

        records.sort_by_key(|r| r.sequence_id);
        Ok(records)
    }
}
