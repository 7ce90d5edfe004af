//! Review run progress reporting.
//!
//! Reports observable progress during a review run so users see which file
//! is being reviewed and how much is left. Progress is emitted on
//! **stderr** so stdout remains parseable for scripts.

use std::io::Write;

/// A single progress event for a review run.
#[derive(Clone, Debug)]
pub enum ReviewProgressEvent {
    /// Cloning the target repository (total unknown).
    Cloning { url: String },
    /// Walking the project tree (total unknown).
    Collecting,
    /// Review phase: file `n` of `total` is being processed.
    Reviewing { n: u64, total: u64, file: String },
}

/// Reports run progress. Implementations write to stderr (human or JSON).
pub trait ReviewProgressReporter: Send + Sync {
    /// Emit a progress event. Called from the orchestrator loop in
    /// strictly increasing `n` order.
    fn report(&self, event: ReviewProgressEvent);
}

/// Human-friendly progress on stderr: "review  12 / 48  src/app.py".
pub struct StderrProgress;

impl ReviewProgressReporter for StderrProgress {
    fn report(&self, event: ReviewProgressEvent) {
        let line = match &event {
            ReviewProgressEvent::Cloning { url } => {
                format!("review  cloning {}...\n", url)
            }
            ReviewProgressEvent::Collecting => "review  collecting files...\n".to_string(),
            ReviewProgressEvent::Reviewing { n, total, file } => {
                format!("review  {} / {}  {}\n", n, total, file)
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ReviewProgressReporter for JsonProgress {
    fn report(&self, event: ReviewProgressEvent) {
        let obj = match &event {
            ReviewProgressEvent::Cloning { url } => serde_json::json!({
                "event": "progress",
                "phase": "cloning",
                "url": url
            }),
            ReviewProgressEvent::Collecting => serde_json::json!({
                "event": "progress",
                "phase": "collecting"
            }),
            ReviewProgressEvent::Reviewing { n, total, file } => serde_json::json!({
                "event": "progress",
                "phase": "reviewing",
                "n": n,
                "total": total,
                "file": file
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ReviewProgressReporter for NoProgress {
    fn report(&self, _event: ReviewProgressEvent) {}
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Build a reporter for this mode. Caller passes it to the orchestrator.
    pub fn reporter(&self) -> Box<dyn ReviewProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
