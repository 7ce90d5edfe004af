//! Review pipeline orchestration.
//!
//! Coordinates the full run: collected files → prompt → bounded-time
//! generation call → embedding → vector index + report store, with
//! per-file failure isolation. A single file's failure or timeout is
//! recorded in its [`ReviewRecord`] and never aborts the run or affects
//! subsequent files.
//!
//! # Timeout semantics
//!
//! Each generation call is dispatched onto a spawned task and the
//! orchestrator waits on the join handle for at most the configured
//! per-call budget. On expiry the orchestrator stops waiting and the task
//! is abandoned, not aborted — a timed-out call may keep consuming the
//! inference server's resources in the background.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::embedding::Embedder;
use crate::index::ReviewIndex;
use crate::llm::TextGenerator;
use crate::models::{ReviewRecord, ReviewStatus, ReviewableFile, RunResult, ScopeKey};
use crate::progress::{ReviewProgressEvent, ReviewProgressReporter};
use crate::reports::ReportStore;

/// Diagnostic recorded as the summary of a timed-out review.
pub const TIMED_OUT_MESSAGE: &str =
    "Review generation exceeded the time budget; the call was abandoned.";

/// Per-run parameters for the orchestrator.
pub struct RunOptions {
    pub scope: ScopeKey,
    /// Prompt template; `{file}` and `{code}` are interpolated per file.
    pub prompt_template: String,
    /// Hard character cap applied to file content before prompting.
    pub max_content_chars: usize,
    /// Wall-clock budget for one generation call.
    pub per_call_timeout: Duration,
}

/// Outcome of one generation attempt, converted into a record field
/// rather than unwinding across file boundaries.
enum GenerationOutcome {
    Completed(String),
    Failed(String),
    TimedOut,
}

/// Run the review pipeline over the collected files, strictly
/// sequentially, in the collector's order.
///
/// Records are produced and persisted in file order; sequence ids are
/// exactly `1..=files.len()`. Progress events fire in strictly increasing
/// order. The returned [`RunResult`] is owned by this run alone.
pub async fn run_review(
    files: Vec<ReviewableFile>,
    opts: &RunOptions,
    generator: Arc<dyn TextGenerator>,
    embedder: &dyn Embedder,
    index: &ReviewIndex,
    reports: &ReportStore,
    progress: &dyn ReviewProgressReporter,
) -> Result<RunResult> {
    let mut result = RunResult::new();
    result.total_files = files.len();

    let scope = opts.scope.collection();
    let total = files.len() as u64;

    for (i, file) in files.iter().enumerate() {
        let sequence_id = (i + 1) as u32;
        let file_display = file.path.display().to_string();

        let truncated = truncate_chars(&file.content, opts.max_content_chars);
        let prompt = render_prompt(&opts.prompt_template, &file_display, truncated);

        let (status, summary) =
            match generate_bounded(generator.clone(), prompt, opts.per_call_timeout).await {
                GenerationOutcome::Completed(text) => (ReviewStatus::Completed, text),
                GenerationOutcome::Failed(desc) => (
                    ReviewStatus::Failed,
                    format!("Review generation failed for {}: {}", file_display, desc),
                ),
                GenerationOutcome::TimedOut => {
                    (ReviewStatus::TimedOut, TIMED_OUT_MESSAGE.to_string())
                }
            };

        let record = ReviewRecord {
            sequence_id,
            file: file_display.clone(),
            summary,
            status,
        };

        // Embedding is attempted even for failed or timed-out reviews so
        // the file stays searchable by content. An embedding failure only
        // skips the index write; the report is still produced.
        match embedder.embed(truncated).await {
            Ok(vector) => {
                if let Err(e) = index
                    .add(
                        &scope,
                        sequence_id,
                        &vector,
                        &record.file,
                        &record.summary,
                        embedder.model_name(),
                    )
                    .await
                {
                    eprintln!(
                        "Warning: failed to index review {} ({}): {}",
                        sequence_id, file_display, e
                    );
                }
            }
            Err(e) => {
                eprintln!(
                    "Warning: embedding failed for {} ({}): {}",
                    sequence_id, file_display, e
                );
            }
        }

        reports.save(&opts.scope, &record)?;

        match record.status {
            ReviewStatus::Completed => result.completed += 1,
            ReviewStatus::Failed => result.failed += 1,
            ReviewStatus::TimedOut => result.timed_out += 1,
        }
        result.reports.push(record);

        progress.report(ReviewProgressEvent::Reviewing {
            n: sequence_id as u64,
            total,
            file: file_display,
        });
    }

    Ok(result)
}

/// Dispatch one generation call on a spawned task and wait at most
/// `budget`. The task is not aborted on expiry; its eventual result is
/// discarded.
async fn generate_bounded(
    generator: Arc<dyn TextGenerator>,
    prompt: String,
    budget: Duration,
) -> GenerationOutcome {
    let handle = tokio::spawn(async move { generator.generate(&prompt).await });

    match tokio::time::timeout(budget, handle).await {
        Ok(Ok(Ok(text))) => GenerationOutcome::Completed(text),
        Ok(Ok(Err(e))) => GenerationOutcome::Failed(e.to_string()),
        Ok(Err(join_err)) => GenerationOutcome::Failed(join_err.to_string()),
        Err(_) => GenerationOutcome::TimedOut,
    }
}

/// Hard truncation to at most `max` characters, on a char boundary.
/// Not token-aware by design.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Interpolate `{file}` and `{code}` into the prompt template.
pub fn render_prompt(template: &str, file: &str, code: &str) -> String {
    template.replace("{file}", file).replace("{code}", code)
}
