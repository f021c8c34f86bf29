//! Running one operation over many documents

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use tracing::{info, warn};
use crate::error::{Error, Result};
use crate::pdf::{normalize_document, unify_boxes_only, DocumentOptions, NormalizeReport, UnifyReport};

/// What to do with each document of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchOperation {
    Normalize,
    UnifyBoxes,
}

/// Result of one batch document
#[derive(Debug, Clone)]
pub enum BatchOutcome {
    Normalized(NormalizeReport),
    Unified(UnifyReport),
}

/// Options for [`run_batch`]
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Documents processed at the same time
    pub jobs: usize,
    pub operation: BatchOperation,
    /// Applied to every document. `output_path` must be `None`: batch
    /// documents are always rewritten in place.
    pub document: DocumentOptions,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            jobs: 4,
            operation: BatchOperation::Normalize,
            document: DocumentOptions::default(),
        }
    }
}

/// Process every input and report each one's outcome.
///
/// A path given more than once is processed once. One document failing
/// does not stop the others. Once the cancel token is
/// triggered, documents that have not started report [`Error::Cancelled`].
pub fn run_batch(inputs: &[PathBuf], options: &BatchOptions) -> Result<BTreeMap<PathBuf, Result<BatchOutcome>>> {
    if options.document.output_path.is_some() {
        return Err(Error::General("batch runs write each document in place".to_string()));
    }

    let pool = ThreadPoolBuilder::new()
        .num_threads(options.jobs.max(1))
        .build()
        .map_err(|e| Error::General(e.to_string()))?;

    let unique: Vec<&PathBuf> = inputs.iter().collect::<BTreeSet<_>>().into_iter().collect();
    if unique.len() < inputs.len() {
        warn!(duplicates = inputs.len() - unique.len(), "skipping repeated batch inputs");
    }

    let outcomes: Vec<(PathBuf, Result<BatchOutcome>)> = pool.install(|| {
        unique
            .par_iter()
            .map(|path| {
                let outcome = options.document.cancel.check().and_then(|_| match options.operation {
                    BatchOperation::Normalize => {
                        normalize_document(path, &options.document).map(BatchOutcome::Normalized)
                    }
                    BatchOperation::UnifyBoxes => {
                        unify_boxes_only(path, &options.document).map(BatchOutcome::Unified)
                    }
                });
                if let Err(e) = &outcome {
                    warn!(path = %path.display(), "{}", e);
                }
                ((*path).clone(), outcome)
            })
            .collect()
    });

    let failed = outcomes.iter().filter(|(_, r)| r.is_err()).count();
    info!(documents = outcomes.len(), failed, "batch finished");
    Ok(outcomes.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_inputs_fail_individually() {
        let inputs = vec![PathBuf::from("/nonexistent/a.pdf"), PathBuf::from("/nonexistent/b.pdf")];
        let results = run_batch(&inputs, &BatchOptions::default()).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.values().all(|r| matches!(r, Err(Error::FileNotFound(_)))));
    }

    #[test]
    fn test_repeated_input_runs_once() {
        let path = PathBuf::from("/nonexistent/a.pdf");
        let inputs = vec![path.clone(), path.clone(), path.clone(), path.clone()];
        let results = run_batch(&inputs, &BatchOptions::default()).unwrap();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[&path], Err(Error::FileNotFound(_))));
    }

    #[test]
    fn test_cancelled_batch_starts_nothing() {
        let options = BatchOptions::default();
        options.document.cancel.cancel();
        let inputs = vec![PathBuf::from("/nonexistent/a.pdf")];
        let results = run_batch(&inputs, &options).unwrap();
        assert!(matches!(results[&inputs[0]], Err(Error::Cancelled)));
    }

    #[test]
    fn test_output_path_is_rejected() {
        let options = BatchOptions {
            document: DocumentOptions {
                output_path: Some(PathBuf::from("out.pdf")),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(run_batch(&[], &options).is_err());
    }
}
