/// Member-count and payload-size accounting
use crate::config::types::{Limits, MemberInfo, Result, TarGuardError};

/// Running totals checked against [`Limits`] as members stream past.
///
/// Both checks are strict `>`: an archive sitting exactly on a limit passes.
#[derive(Debug, Clone)]
pub struct LimitTracker {
    limits: Limits,
    file_count: u64,
    total_size: u64,
}

impl LimitTracker {
    pub fn new(limits: Limits) -> Self {
        Self {
            limits,
            file_count: 0,
            total_size: 0,
        }
    }

    /// Count one member of any kind
    pub fn count_member(&mut self) -> Result<()> {
        self.file_count += 1;
        if self.file_count > self.limits.max_files {
            return Err(TarGuardError::TooManyFiles {
                limit: self.limits.max_files,
            });
        }
        Ok(())
    }

    /// Add regular-file payload bytes
    pub fn add_payload(&mut self, size: u64) -> Result<()> {
        self.total_size = self.total_size.saturating_add(size);
        if self.total_size > self.limits.max_extract_size {
            return Err(TarGuardError::ArchiveTooLarge {
                limit: self.limits.max_extract_size,
            });
        }
        Ok(())
    }

    /// Count the member and, for regular files, its payload
    pub fn admit(&mut self, member: &MemberInfo) -> Result<()> {
        self.count_member()?;
        if member.kind.is_file() {
            self.add_payload(member.size)?;
        }
        Ok(())
    }

    pub fn file_count(&self) -> u64 {
        self.file_count
    }

    pub fn total_size(&self) -> u64 {
        self.total_size
    }
}
