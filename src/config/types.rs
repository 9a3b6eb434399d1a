/// Shared type definitions for targuard
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Default ceiling on total regular-file payload (100 MB)
pub const DEFAULT_MAX_EXTRACT_SIZE: u64 = 100_000_000;

/// Default ceiling on archive members processed
pub const DEFAULT_MAX_FILES: u64 = 1000;

/// Resource limits enforced while walking an archive
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Limits {
    /// Maximum total bytes of regular-file payload
    pub max_extract_size: u64,
    /// Maximum number of members (of any kind)
    pub max_files: u64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_extract_size: DEFAULT_MAX_EXTRACT_SIZE,
            max_files: DEFAULT_MAX_FILES,
        }
    }
}

/// How reports are rendered on stdout
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Effective processor configuration after merging flags, config file and defaults
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    pub limits: Limits,
    pub output_format: OutputFormat,
    /// JSON-lines audit trail destination (log-only when unset)
    pub audit_log: Option<PathBuf>,
    /// Abort on unsafe member names instead of skipping them
    pub strict_paths: bool,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            output_format: OutputFormat::Text,
            audit_log: None,
            strict_paths: true,
        }
    }
}

/// Closed set of member kinds, mirroring the tar type flags we distinguish
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    File,
    Directory,
    HardLink,
    Symlink,
    Other,
}

impl MemberKind {
    /// Single-character tag used in listings
    pub fn type_char(self) -> char {
        match self {
            MemberKind::File => 'f',
            MemberKind::Directory => 'd',
            MemberKind::HardLink => 'l',
            MemberKind::Symlink => 's',
            MemberKind::Other => '?',
        }
    }

    pub fn is_file(self) -> bool {
        self == MemberKind::File
    }

    pub fn is_link(self) -> bool {
        matches!(self, MemberKind::HardLink | MemberKind::Symlink)
    }
}

impl std::fmt::Display for MemberKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MemberKind::File => "file",
            MemberKind::Directory => "directory",
            MemberKind::HardLink => "hardlink",
            MemberKind::Symlink => "symlink",
            MemberKind::Other => "other",
        };
        f.write_str(name)
    }
}

/// One archive member as seen by the processor
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    /// Member name as stored in the archive (directories without trailing '/')
    pub name: String,
    /// Payload size from the header
    pub size: u64,
    pub kind: MemberKind,
    /// Permission bits from the header
    pub mode: u32,
}

/// Custom error types for targuard
#[derive(Error, Debug)]
pub enum TarGuardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive '{0}' not found")]
    ArchiveNotFound(PathBuf),

    #[error("{0}")]
    Archive(String),

    #[error("Too many files (>{limit})")]
    TooManyFiles { limit: u64 },

    #[error("Archive too large (>{limit} bytes)")]
    ArchiveTooLarge { limit: u64 },

    #[error("Unsafe member path '{name}': {reason}")]
    UnsafePath { name: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl TarGuardError {
    /// Errors caused by the archive contents rather than the environment
    pub fn is_archive_error(&self) -> bool {
        matches!(
            self,
            TarGuardError::Archive(_)
                | TarGuardError::TooManyFiles { .. }
                | TarGuardError::ArchiveTooLarge { .. }
                | TarGuardError::UnsafePath { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, TarGuardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limits_default() {
        let limits = Limits::default();
        assert_eq!(limits.max_extract_size, 100_000_000);
        assert_eq!(limits.max_files, 1000);
    }

    #[test]
    fn test_type_chars() {
        assert_eq!(MemberKind::File.type_char(), 'f');
        assert_eq!(MemberKind::Directory.type_char(), 'd');
        assert_eq!(MemberKind::HardLink.type_char(), 'l');
        assert_eq!(MemberKind::Symlink.type_char(), 's');
        assert_eq!(MemberKind::Other.type_char(), '?');
    }

    #[test]
    fn test_limit_error_messages() {
        assert_eq!(
            TarGuardError::TooManyFiles { limit: 3 }.to_string(),
            "Too many files (>3)"
        );
        assert_eq!(
            TarGuardError::ArchiveTooLarge { limit: 10 }.to_string(),
            "Archive too large (>10 bytes)"
        );
    }

    #[test]
    fn test_archive_error_classification() {
        assert!(TarGuardError::Archive("bad header".into()).is_archive_error());
        assert!(TarGuardError::TooManyFiles { limit: 1 }.is_archive_error());
        assert!(TarGuardError::UnsafePath {
            name: "../x".into(),
            reason: "parent directory component".into()
        }
        .is_archive_error());
        assert!(!TarGuardError::Config("x".into()).is_archive_error());
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!TarGuardError::Io(io).is_archive_error());
    }

    #[test]
    fn test_output_format_serde() {
        let json = serde_json::to_string(&OutputFormat::Json).unwrap();
        assert_eq!(json, "\"json\"");
        let kind = serde_json::to_string(&MemberKind::HardLink).unwrap();
        assert_eq!(kind, "\"hard_link\"");
    }
}
