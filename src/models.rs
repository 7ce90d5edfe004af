//! Core data models used throughout the review harness.
//!
//! These types represent the files, review records, and run results that
//! flow through the review pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use uuid::Uuid;

/// A file discovered by the collector, ready to be reviewed.
///
/// Created once at run start and discarded after the run produces its
/// [`ReviewRecord`].
#[derive(Debug, Clone)]
pub struct ReviewableFile {
    /// Path to the file, unique within a run.
    pub path: PathBuf,
    /// File content, decoded lossily (invalid UTF-8 replaced).
    pub content: String,
}

/// Outcome of reviewing a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    /// The model returned a review within the time budget.
    Completed,
    /// The generation call failed; `summary` carries the error description.
    Failed,
    /// The generation call exceeded the time budget.
    TimedOut,
}

impl Default for ReviewStatus {
    fn default() -> Self {
        ReviewStatus::Completed
    }
}

/// One persisted review. `sequence_id` is the join key between the report
/// file on disk and the vector index row.
///
/// `summary` is always non-empty — review text on success, a human-readable
/// error description otherwise. Records are written once and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// 1-based position in the run's file ordering.
    pub sequence_id: u32,
    /// Path of the reviewed file as collected.
    pub file: String,
    /// Review text, or an error description for failed/timed-out reviews.
    pub summary: String,
    /// Older report files lack this field; they default to `completed`.
    #[serde(default)]
    pub status: ReviewStatus,
}

/// Aggregated outcome of one review run.
///
/// Owned exclusively by a single run — never shared across concurrent runs.
/// Invariant: `reports.len() == total_files` and the records carry sequence
/// ids exactly `1..=total_files` in order.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    pub run_id: Uuid,
    pub total_files: usize,
    pub completed: usize,
    pub failed: usize,
    pub timed_out: usize,
    pub reports: Vec<ReviewRecord>,
}

impl RunResult {
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            total_files: 0,
            completed: 0,
            failed: 0,
            timed_out: 0,
            reports: Vec::new(),
        }
    }
}

impl Default for RunResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Partition key for reports and index collections.
///
/// Concurrent runs against different scopes do not contend; runs against
/// the same scope are not locked and should be serialized by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKey {
    /// Single-user layout: reports directly under the data root, one
    /// shared `code_reviews` collection.
    Default,
    /// Single-user layout partitioned by project name.
    Project(String),
    /// Multi-user layout: reports nested under the user's directory.
    UserProject { user: String, project: String },
}

impl ScopeKey {
    /// Build a scope from optional user and project names.
    pub fn resolve(user: Option<String>, project: Option<String>) -> Self {
        match (user, project) {
            (Some(user), project) => ScopeKey::UserProject {
                user,
                project: project.unwrap_or_else(|| "default".to_string()),
            },
            (None, Some(project)) => ScopeKey::Project(project),
            (None, None) => ScopeKey::Default,
        }
    }

    /// Collection name used as the scope column in the vector index.
    pub fn collection(&self) -> String {
        match self {
            ScopeKey::Default => "code_reviews".to_string(),
            ScopeKey::Project(name) => name.clone(),
            ScopeKey::UserProject { user, project } => format!("{}:{}", user, project),
        }
    }

    /// Report directory for this scope, relative to the configured roots.
    pub fn report_dir(&self, data_root: &std::path::Path, user_root: &std::path::Path) -> PathBuf {
        match self {
            ScopeKey::Default => data_root.to_path_buf(),
            ScopeKey::Project(name) => data_root.join(name),
            ScopeKey::UserProject { user, project } => user_root
                .join(user)
                .join("projects")
                .join(project)
                .join("code_review_reports"),
        }
    }
}

/// A nearest-neighbor hit returned by the review index.
#[derive(Debug, Clone, Serialize)]
pub struct QueryHit {
    pub sequence_id: u32,
    pub file: String,
    pub summary: String,
    /// Cosine similarity against the query vector, higher is closer.
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn scope_collection_names() {
        assert_eq!(ScopeKey::Default.collection(), "code_reviews");

        let single = ScopeKey::Project("demo".to_string());
        assert_eq!(single.collection(), "demo");

        let multi = ScopeKey::UserProject {
            user: "alice".to_string(),
            project: "demo".to_string(),
        };
        assert_eq!(multi.collection(), "alice:demo");
    }

    #[test]
    fn scope_report_dirs() {
        let data = Path::new("data/reports");
        let users = Path::new("user_data");

        assert_eq!(
            ScopeKey::Default.report_dir(data, users),
            Path::new("data/reports")
        );

        let single = ScopeKey::Project("demo".to_string());
        assert_eq!(
            single.report_dir(data, users),
            Path::new("data/reports/demo")
        );

        let multi = ScopeKey::UserProject {
            user: "alice".to_string(),
            project: "demo".to_string(),
        };
        assert_eq!(
            multi.report_dir(data, users),
            Path::new("user_data/alice/projects/demo/code_review_reports")
        );
    }

    #[test]
    fn scope_resolution() {
        assert_eq!(ScopeKey::resolve(None, None), ScopeKey::Default);
        assert_eq!(
            ScopeKey::resolve(None, Some("demo".into())),
            ScopeKey::Project("demo".into())
        );
        assert_eq!(
            ScopeKey::resolve(Some("alice".into()), Some("demo".into())),
            ScopeKey::UserProject {
                user: "alice".into(),
                project: "demo".into()
            }
        );
    }

    #[test]
    fn record_defaults_status_for_legacy_reports() {
        // Reports written by older tooling carry only file + summary.
        let json = r#"{"sequence_id": 3, "file": "src/a.py", "summary": "ok"}"#;
        let record: ReviewRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.status, ReviewStatus::Completed);
        assert_eq!(record.sequence_id, 3);
    }
}
