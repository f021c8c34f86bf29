//! Staged, validated replacement of the destination file
//!
//! A document is saved to a temporary file next to its destination, reopened
//! to check it parses with the expected page count, then renamed over the
//! destination. A failure at any point leaves the destination untouched.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use lopdf::Document;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use crate::error::{Error, Result};

/// Retry settings for the final rename
#[derive(Debug, Clone)]
pub struct ReplacePolicy {
    /// Total rename attempts
    pub attempts: u32,
    /// Wait after the first failure; grows linearly with each attempt
    pub backoff: Duration,
}

impl Default for ReplacePolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_millis(100),
        }
    }
}

/// A saved, not yet committed document
#[derive(Debug)]
pub struct StagedOutput {
    file: NamedTempFile,
    target: PathBuf,
}

impl StagedOutput {
    /// Save `doc` next to `target`. The document is consumed and dropped
    /// here, so no handle to it is alive when the file is renamed.
    pub fn stage(mut doc: Document, target: &Path) -> Result<Self> {
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let mut file = NamedTempFile::new_in(&dir)?;
        {
            let mut writer = BufWriter::new(file.as_file_mut());
            doc.save_to(&mut writer)?;
            writer.flush()?;
        }
        drop(doc);
        debug!(staged = %file.path().display(), "staged output");

        Ok(Self {
            file,
            target: target.to_path_buf(),
        })
    }

    /// Reopen the staged file and check its page count.
    pub fn verify(self, expected_pages: usize) -> Result<Self> {
        let reopened = Document::load(self.file.path())
            .map_err(|e| Error::Validation(format!("staged output does not parse: {}", e)))?;
        let pages = reopened.get_pages().len();
        if pages != expected_pages {
            return Err(Error::Validation(format!(
                "staged output has {} pages, expected {}",
                pages, expected_pages
            )));
        }
        Ok(self)
    }

    /// Rename the staged file over the destination, retrying the rename only.
    pub fn commit(self, policy: &ReplacePolicy) -> Result<()> {
        let attempts = policy.attempts.max(1);
        let target = self.target;
        let mut staged = self.file;

        let mut attempt = 1;
        loop {
            let e = match staged.persist(&target) {
                Ok(_) => return Ok(()),
                Err(e) => e,
            };
            if attempt >= attempts {
                return Err(Error::IoContention {
                    path: target,
                    attempts,
                    source: e.error,
                });
            }
            warn!(path = %target.display(), attempt, error = %e.error, "replace failed, retrying");
            staged = e.file;
            thread::sleep(policy.backoff * attempt);
            attempt += 1;
        }
    }
}

/// Stage, verify and commit in one step.
pub fn write_document(doc: Document, target: &Path, expected_pages: usize, policy: &ReplacePolicy) -> Result<()> {
    StagedOutput::stage(doc, target)?
        .verify(expected_pages)?
        .commit(policy)
}
