//! Batch accept→extract pipeline over many candidate files.
//!
//! A convenience for hosts that hand over a batch of loaded files
//! instead of driving [`crate::extract::extract`] themselves. Per-file
//! failures are reported in the outcome, never swallowed; retry policy
//! stays with the host.

use crate::cancel::CancelToken;
use crate::extract::{self, ExtractError};
use crate::filter::{split_candidate, InclusionFilter};
use crate::index::IndexValue;
use rayon::prelude::*;
use tracing::{debug, info};

/// One candidate compiled file, already loaded by the host. `path` may
/// be archive-style (`/libs/foo.jar!/com/example/Foo.class`).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl Candidate {
    pub fn new(path: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            bytes,
        }
    }
}

/// Result of running one candidate through the pipeline.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: String,
    pub result: Outcome,
}

#[derive(Debug)]
pub enum Outcome {
    /// Rejected by the inclusion filter
    Skipped,
    Indexed(IndexValue),
    Failed(ExtractError),
}

/// Filter and extract a batch of candidates in parallel.
///
/// Outcomes are returned in input order. Cancellation is observed per
/// file: files processed after the token trips report
/// [`ExtractError::Cancelled`].
pub fn index_candidates(
    filter: &InclusionFilter,
    candidates: &[Candidate],
    cancel: &CancelToken,
) -> Vec<FileOutcome> {
    info!("Indexing {} candidate files...", candidates.len());

    let outcomes: Vec<FileOutcome> = candidates
        .par_iter()
        .map(|candidate| {
            let (container, class_path) = split_candidate(&candidate.path);
            if !filter.accept(container, class_path) {
                return FileOutcome {
                    path: candidate.path.clone(),
                    result: Outcome::Skipped,
                };
            }

            let result = match extract::extract_at(&candidate.bytes, class_path, cancel) {
                Ok(value) => Outcome::Indexed(value),
                Err(err) => {
                    debug!("Extraction failed for {} (reported): {}", candidate.path, err);
                    Outcome::Failed(err)
                }
            };
            FileOutcome {
                path: candidate.path.clone(),
                result,
            }
        })
        .collect();

    let indexed = outcomes
        .iter()
        .filter(|outcome| matches!(outcome.result, Outcome::Indexed(_)))
        .count();
    let skipped = outcomes
        .iter()
        .filter(|outcome| matches!(outcome.result, Outcome::Skipped))
        .count();
    info!(
        "Indexed {} files, skipped {}, failed {}",
        indexed,
        skipped,
        outcomes.len() - indexed - skipped
    );

    outcomes
}
