//! Extraction run over an opened archive.
//!
//! Candidates are the non-directory entries whose extension is registered;
//! they are read one at a time in enumeration order, and progress is
//! counted against the number of candidates. Directories and other files
//! never reach the progress denominator.

use super::registry::is_code_file;
use super::report::format_block;
use super::{Archive, ArchiveEntry};
use crate::error::{ExtractError, ExtractResult};

/// Outcome of one candidate entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryOutcome {
    pub path: String,
    pub succeeded: bool,
    /// Why the entry could not be read, when it failed.
    pub error: Option<String>,
}

/// Aggregated report text plus the per-candidate outcomes, in archive order.
#[derive(Debug, Clone, Default)]
pub struct ExtractionResult {
    pub aggregated_text: String,
    pub entries: Vec<EntryOutcome>,
}

impl ExtractionResult {
    pub fn succeeded_count(&self) -> usize {
        self.entries.iter().filter(|e| e.succeeded).count()
    }

    pub fn failed_count(&self) -> usize {
        self.entries.len() - self.succeeded_count()
    }

    /// Whether there is anything worth writing out.
    pub fn has_content(&self) -> bool {
        !self.aggregated_text.is_empty()
    }
}

/// Candidates processed so far out of the candidate total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    /// `round(100 * processed / total)`, halves rounded up.
    pub fn percentage(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        let pct = (200 * self.processed + self.total) / (2 * self.total);
        pct.min(100) as u8
    }
}

/// Callbacks fired while a run progresses.
pub trait RunObserver {
    /// Called once, after filtering, with the candidate count.
    fn on_start(&mut self, total_entries: usize, candidates: usize) {
        let _ = (total_entries, candidates);
    }

    /// Called after every candidate, successful or not.
    fn on_entry(&mut self, outcome: &EntryOutcome, progress: Progress) {
        let _ = (outcome, progress);
    }
}

impl RunObserver for () {}

/// State owned by exactly one run and consumed into its result.
struct RunContext {
    text: String,
    entries: Vec<EntryOutcome>,
    total: usize,
}

impl RunContext {
    fn new(total: usize) -> Self {
        Self {
            text: String::new(),
            entries: Vec::with_capacity(total),
            total,
        }
    }

    fn record_success(&mut self, path: &str, content: &str) -> &EntryOutcome {
        self.text.push_str(&format_block(path, content));
        self.push(EntryOutcome {
            path: path.to_string(),
            succeeded: true,
            error: None,
        })
    }

    fn record_failure(&mut self, path: &str, reason: String) -> &EntryOutcome {
        self.push(EntryOutcome {
            path: path.to_string(),
            succeeded: false,
            error: Some(reason),
        })
    }

    fn push(&mut self, outcome: EntryOutcome) -> &EntryOutcome {
        self.entries.push(outcome);
        &self.entries[self.entries.len() - 1]
    }

    fn progress(&self) -> Progress {
        Progress {
            processed: self.entries.len(),
            total: self.total,
        }
    }

    fn finish(self) -> ExtractionResult {
        ExtractionResult {
            aggregated_text: self.text,
            entries: self.entries,
        }
    }
}

/// Extract every candidate entry of `archive` into one report.
///
/// Returns [`ExtractError::NoCodeFilesFound`] when nothing qualifies. A
/// candidate that cannot be read is recorded as failed and the run carries
/// on; it never aborts the run.
pub async fn run<A, O>(archive: &A, observer: &mut O) -> ExtractResult<ExtractionResult>
where
    A: Archive,
    O: RunObserver + ?Sized,
{
    let all = archive.entries();
    let candidates: Vec<&A::Entry> = all
        .iter()
        .filter(|e| !e.is_directory() && is_code_file(e.path()))
        .collect();

    log::info!(
        "Found {} code files out of {} total entries",
        candidates.len(),
        all.len()
    );

    if candidates.is_empty() {
        return Err(ExtractError::NoCodeFilesFound {
            total_entries: all.len(),
        });
    }

    observer.on_start(all.len(), candidates.len());
    let mut ctx = RunContext::new(candidates.len());

    for entry in candidates {
        let path = entry.path();
        let outcome = match archive.read_text(entry).await {
            Ok(content) => {
                log::debug!("Extracted {} ({} bytes)", path, content.len());
                ctx.record_success(path, &content).clone()
            }
            Err(ExtractError::Decode { reason, .. }) => {
                log::warn!("Skipping {}: {}", path, reason);
                ctx.record_failure(path, reason).clone()
            }
            Err(e) if !e.is_fatal() => {
                log::warn!("Skipping {}: {}", path, e);
                ctx.record_failure(path, e.to_string()).clone()
            }
            Err(e) => return Err(e),
        };

        observer.on_entry(&outcome, ctx.progress());
        tokio::task::yield_now().await;
    }

    let result = ctx.finish();
    log::info!(
        "Extracted {} of {} code files ({} failed)",
        result.succeeded_count(),
        result.entries.len(),
        result.failed_count()
    );
    Ok(result)
}
