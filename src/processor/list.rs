/// Archive listing
use crate::archive::digest::sha256_file;
use crate::archive::ArchiveReader;
use crate::config::types::{ProcessorConfig, Result};
use crate::observability::audit::events;
use crate::processor::audited;
use crate::processor::limits::LimitTracker;
use crate::processor::report::{member_line, ListingReport, SEPARATOR};
use std::io::Write;
use std::path::Path;

/// Walk the archive without touching the filesystem, streaming one line per member.
///
/// Lines already written stay written when a limit trips mid-archive.
pub fn list_archive(
    config: &ProcessorConfig,
    archive: &Path,
    out: &mut dyn Write,
) -> Result<ListingReport> {
    writeln!(out, "Listing contents of: {}", archive.display())?;
    writeln!(out, "{}", SEPARATOR)?;

    let reader = ArchiveReader::open(archive)?;
    let sha256 = sha256_file(archive)?;
    events::processing_start(archive, &sha256, "listing");

    let mut tracker = LimitTracker::new(config.limits);
    let mut entries = Vec::new();

    reader.for_each_member(|member, _payload| {
        audited(archive, &member.name, tracker.admit(member))?;
        writeln!(out, "{}", member_line(member))?;
        entries.push(member.clone());
        Ok(())
    })?;

    writeln!(out, "{}", SEPARATOR)?;
    writeln!(out, "Total files: {}", tracker.file_count())?;
    writeln!(out, "Total size: {} bytes", tracker.total_size())?;

    Ok(ListingReport {
        archive: archive.to_path_buf(),
        sha256,
        entries,
        total_files: tracker.file_count(),
        total_size: tracker.total_size(),
    })
}
