//! Archive processing
//!
//! Limit-enforcing listing and extraction. Progress lines are written to a
//! caller-supplied writer as members stream past; the returned report carries
//! the same information in structured form.

pub mod extract;
pub mod limits;
pub mod list;
pub mod report;

pub use limits::LimitTracker;
pub use report::{ExtractionReport, ListingReport};

use crate::config::types::{ProcessorConfig, Result, TarGuardError};
use crate::observability::audit::events;
use std::io::Write;
use std::path::Path;

/// Lists or extracts tar archives under the configured limits
#[derive(Debug, Clone, Default)]
pub struct TarProcessor {
    config: ProcessorConfig,
}

impl TarProcessor {
    pub fn new(config: ProcessorConfig) -> Self {
        Self { config }
    }

    /// List archive members, writing one line per member to `out`
    pub fn list_archive(&self, archive: &Path, out: &mut dyn Write) -> Result<ListingReport> {
        let result = list::list_archive(&self.config, archive, out);
        record_outcome(archive, "listing", result)
    }

    /// Extract archive members into `output` (or `<stem>_extracted` when `None`)
    pub fn extract_archive(
        &self,
        archive: &Path,
        output: Option<&Path>,
        out: &mut dyn Write,
    ) -> Result<ExtractionReport> {
        let result = extract::extract_archive(&self.config, archive, output, out);
        record_outcome(archive, "extraction", result)
    }
}

fn record_outcome<T>(archive: &Path, operation: &str, result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => events::processing_end(archive, &format!("{} completed", operation)),
        Err(e) => events::processing_end(archive, &format!("{} failed: {}", operation, e)),
    }
    result
}

/// Count a member against the limits, auditing the violation if one occurs
pub(crate) fn audited<T>(archive: &Path, member: &str, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        if matches!(
            e,
            TarGuardError::TooManyFiles { .. } | TarGuardError::ArchiveTooLarge { .. }
        ) {
            events::limit_exceeded(archive, member, e.to_string());
        }
    }
    result
}
