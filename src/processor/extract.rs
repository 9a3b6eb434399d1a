/// Archive extraction confined to a single output directory
use crate::archive::digest::sha256_file;
use crate::archive::ArchiveReader;
use crate::config::types::{MemberInfo, MemberKind, ProcessorConfig, Result, TarGuardError};
use crate::observability::audit::events;
use crate::processor::audited;
use crate::processor::limits::LimitTracker;
use crate::processor::report::{ExtractionReport, SEPARATOR};
use crate::security::{ensure_no_symlink_ancestors, sanitize_member_path};
use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// `<archive stem>_extracted`, relative to the current directory
pub fn default_output_dir(archive: &Path) -> PathBuf {
    let stem = archive
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "archive".to_string());
    PathBuf::from(format!("{}_extracted", stem))
}

/// Create the output directory (not its parents); an existing directory is reused
fn prepare_output_dir(path: &Path) -> Result<()> {
    match fs::create_dir(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(TarGuardError::Io(std::io::Error::new(
            e.kind(),
            format!("Failed to create output directory {}: {}", path.display(), e),
        ))),
    }
}

/// Stream a member payload to `target`, refusing to follow a symlink at the target
fn write_member(target: &Path, payload: &mut dyn Read) -> Result<u64> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.custom_flags(libc::O_NOFOLLOW).mode(0o644);
    }

    let mut file = options.open(target)?;
    let written = std::io::copy(payload, &mut file).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData | std::io::ErrorKind::UnexpectedEof => {
            TarGuardError::Archive(e.to_string())
        }
        _ => TarGuardError::Io(e),
    })?;
    file.flush()?;
    Ok(written)
}

struct Extraction<'a> {
    config: &'a ProcessorConfig,
    archive: &'a Path,
    output_dir: &'a Path,
    tracker: LimitTracker,
    extracted: Vec<String>,
    directories: Vec<String>,
    skipped: Vec<String>,
}

impl Extraction<'_> {
    fn skip(&mut self, member: &MemberInfo, why: &str) {
        log::warn!("Skipping member {}: {}", member.name, why);
        self.skipped.push(member.name.clone());
    }

    /// Links are never written, but their parent directories are, unless a
    /// symlink already sits on the way there
    fn create_link_parent(&self, member: &MemberInfo, rel: &Path) -> Result<()> {
        let Some(parent) = rel.parent().filter(|p| !p.as_os_str().is_empty()) else {
            return Ok(());
        };
        match ensure_no_symlink_ancestors(self.output_dir, &member.name, parent) {
            Ok(()) => fs::create_dir_all(self.output_dir.join(parent))?,
            Err(TarGuardError::UnsafePath { .. }) => {
                log::warn!("Not creating parent of {}: symlink in path", member.name)
            }
            Err(e) => return Err(e),
        }
        Ok(())
    }

    fn handle(
        &mut self,
        member: &MemberInfo,
        payload: &mut dyn Read,
        out: &mut dyn Write,
    ) -> Result<()> {
        audited(self.archive, &member.name, self.tracker.count_member())?;

        let rel = match sanitize_member_path(&member.name) {
            Ok(Some(rel)) => rel,
            Ok(None) => {
                // "./" and friends name the output root itself
                if member.kind == MemberKind::Directory {
                    writeln!(out, "Created directory: {}", member.name)?;
                    self.directories.push(member.name.clone());
                } else {
                    self.skip(member, "name resolves to the output directory");
                }
                return Ok(());
            }
            Err(e) if self.config.strict_paths => return Err(e),
            Err(e) => {
                self.skip(member, &e.to_string());
                return Ok(());
            }
        };

        if member.kind.is_file() {
            audited(self.archive, &member.name, self.tracker.add_payload(member.size))?;
        }

        if !matches!(member.kind, MemberKind::File | MemberKind::Directory) {
            self.create_link_parent(member, &rel)?;
            events::link_skipped(&member.name, &member.kind.to_string());
            self.skip(member, &format!("{} members are not extracted", member.kind));
            return Ok(());
        }

        ensure_no_symlink_ancestors(self.output_dir, &member.name, &rel)?;
        let target = self.output_dir.join(&rel);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        if member.kind.is_file() {
            let written = write_member(&target, payload)?;
            log::debug!("Wrote {} bytes to {}", written, target.display());
            writeln!(out, "Extracted: {}", member.name)?;
            self.extracted.push(member.name.clone());
        } else {
            fs::create_dir_all(&target)?;
            writeln!(out, "Created directory: {}", member.name)?;
            self.directories.push(member.name.clone());
        }

        Ok(())
    }
}

/// Extract every admitted member beneath the output directory.
///
/// Nothing is written outside `output`: unsafe names abort the run (or are
/// skipped when strict path checking is off), existing symlinks inside the
/// output tree are never written through, and link members are not created.
/// Files written before an error are left in place.
pub fn extract_archive(
    config: &ProcessorConfig,
    archive: &Path,
    output: Option<&Path>,
    out: &mut dyn Write,
) -> Result<ExtractionReport> {
    let output_dir = match output {
        Some(dir) => dir.to_path_buf(),
        None => default_output_dir(archive),
    };
    prepare_output_dir(&output_dir)?;

    writeln!(
        out,
        "Extracting {} to {}",
        archive.display(),
        output_dir.display()
    )?;
    writeln!(out, "{}", SEPARATOR)?;

    let reader = ArchiveReader::open(archive)?;
    let sha256 = sha256_file(archive)?;
    events::processing_start(archive, &sha256, "extraction");

    let mut extraction = Extraction {
        config,
        archive,
        output_dir: &output_dir,
        tracker: LimitTracker::new(config.limits),
        extracted: Vec::new(),
        directories: Vec::new(),
        skipped: Vec::new(),
    };

    reader.for_each_member(|member, payload| extraction.handle(member, payload, out))?;

    let total_files = extraction.tracker.file_count();
    let total_size = extraction.tracker.total_size();
    writeln!(out, "{}", SEPARATOR)?;
    writeln!(
        out,
        "Extraction complete: {} files, {} bytes",
        total_files, total_size
    )?;

    Ok(ExtractionReport {
        archive: archive.to_path_buf(),
        sha256,
        output_dir: output_dir.clone(),
        extracted: extraction.extracted,
        directories: extraction.directories,
        skipped: extraction.skipped,
        total_files,
        total_size,
    })
}
