/// Processing reports and their text rendering
use crate::config::types::MemberInfo;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const SEPARATOR: &str = "--------------------------------------------------";

/// Result of listing an archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingReport {
    pub archive: PathBuf,
    pub sha256: String,
    pub entries: Vec<MemberInfo>,
    pub total_files: u64,
    pub total_size: u64,
}

/// Result of extracting an archive
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub archive: PathBuf,
    pub sha256: String,
    pub output_dir: PathBuf,
    /// Regular files written
    pub extracted: Vec<String>,
    /// Directories created
    pub directories: Vec<String>,
    /// Members seen but not written (links, special files, unsafe names)
    pub skipped: Vec<String>,
    pub total_files: u64,
    pub total_size: u64,
}

/// One listing line: type tag, name padded to 40, size right-aligned to 10
pub fn member_line(member: &MemberInfo) -> String {
    format!(
        "{} {:<40} {:>10} bytes",
        member.kind.type_char(),
        member.name,
        member.size
    )
}
