/// Streaming tar reader with transparent gzip, bzip2 and xz support
use crate::config::types::{MemberInfo, MemberKind, Result, TarGuardError};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use tar::EntryType;
use xz2::read::XzDecoder;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];

/// Compression wrapping the tar stream
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Compression {
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl Compression {
    /// Detect compression from the leading bytes of the file
    pub fn sniff(magic: &[u8]) -> Self {
        if magic.starts_with(GZIP_MAGIC) {
            Compression::Gzip
        } else if magic.starts_with(BZIP2_MAGIC) {
            Compression::Bzip2
        } else if magic.starts_with(XZ_MAGIC) {
            Compression::Xz
        } else {
            Compression::None
        }
    }
}

/// Tar archive opened for a single streaming pass per call
#[derive(Debug)]
pub struct ArchiveReader {
    path: PathBuf,
    compression: Compression,
}

impl ArchiveReader {
    /// Open an archive, rejecting empty files up front
    pub fn open(path: &Path) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TarGuardError::ArchiveNotFound(path.to_path_buf())
            } else {
                TarGuardError::Io(e)
            }
        })?;

        if file.metadata()?.len() == 0 {
            return Err(TarGuardError::Archive("empty file".to_string()));
        }

        let mut magic = [0u8; 6];
        let mut filled = 0;
        while filled < magic.len() {
            let n = file.read(&mut magic[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        let compression = Compression::sniff(&magic[..filled]);
        log::debug!(
            "Opened archive {} ({:?} compression)",
            path.display(),
            compression
        );

        Ok(Self {
            path: path.to_path_buf(),
            compression,
        })
    }

    /// Stream members in archive order.
    ///
    /// The callback receives each member's metadata and a reader bounded to its
    /// payload. Returning an error from the callback stops the walk.
    pub fn for_each_member<F>(&self, mut f: F) -> Result<()>
    where
        F: FnMut(&MemberInfo, &mut dyn Read) -> Result<()>,
    {
        let file = BufReader::new(File::open(&self.path)?);
        let stream: Box<dyn Read> = match self.compression {
            Compression::None => Box::new(file),
            Compression::Gzip => Box::new(GzDecoder::new(file)),
            Compression::Bzip2 => Box::new(BzDecoder::new(file)),
            Compression::Xz => Box::new(XzDecoder::new(file)),
        };

        let mut archive = tar::Archive::new(stream);
        let entries = archive.entries().map_err(format_error)?;

        for entry in entries {
            let mut entry = entry.map_err(format_error)?;
            // pax global headers carry archive-wide metadata, not a member
            if entry.header().entry_type() == EntryType::XGlobalHeader {
                continue;
            }
            let info = member_info(&entry);
            f(&info, &mut entry)?;
        }

        Ok(())
    }
}

fn format_error(e: std::io::Error) -> TarGuardError {
    TarGuardError::Archive(e.to_string())
}

fn classify_entry(entry_type: EntryType) -> MemberKind {
    match entry_type {
        EntryType::Regular | EntryType::Continuous | EntryType::GNUSparse => MemberKind::File,
        EntryType::Directory => MemberKind::Directory,
        EntryType::Link => MemberKind::HardLink,
        EntryType::Symlink => MemberKind::Symlink,
        _ => MemberKind::Other,
    }
}

fn member_info<R: Read>(entry: &tar::Entry<'_, R>) -> MemberInfo {
    let header = entry.header();
    let raw_name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();

    // Old-style archives mark directories with a regular type flag and a trailing slash
    let mut kind = classify_entry(header.entry_type());
    if kind == MemberKind::File && raw_name.ends_with('/') {
        kind = MemberKind::Directory;
    }

    let name = if kind == MemberKind::Directory && raw_name.len() > 1 {
        raw_name.trim_end_matches('/').to_string()
    } else {
        raw_name
    };

    MemberInfo {
        name,
        size: entry.size(),
        kind,
        mode: header.mode().unwrap_or(0),
    }
}
