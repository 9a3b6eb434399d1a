/// Path validation for archive member names and extraction targets
use crate::config::types::{Result, TarGuardError};
use crate::observability::audit::events;
use std::path::{Component, Path, PathBuf};

/// Reasons a member name is refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PathViolation {
    #[error("empty member name")]
    Empty,

    #[error("member name contains a NUL byte")]
    NulByte,

    #[error("absolute path")]
    Absolute,

    #[error("drive or UNC prefix")]
    WindowsPrefix,

    #[error("parent directory component")]
    ParentDir,

    #[error("symlink in extraction path")]
    SymlinkInPath,
}

fn unsafe_path(name: &str, violation: PathViolation) -> TarGuardError {
    TarGuardError::UnsafePath {
        name: name.to_string(),
        reason: violation.to_string(),
    }
}

/// `C:\x` and `C:/x` are rooted everywhere; a bare `c:notes.txt` is only a
/// drive-relative path on Windows and an ordinary file name elsewhere
fn has_windows_prefix(name: &str) -> bool {
    let bytes = name.as_bytes();
    let drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
    let rooted = drive && matches!(bytes.get(2), Some(b'/') | Some(b'\\'));
    rooted || (drive && cfg!(windows)) || name.starts_with("\\\\")
}

fn classify(name: &str) -> std::result::Result<Option<PathBuf>, PathViolation> {
    if name.is_empty() {
        return Err(PathViolation::Empty);
    }
    if name.contains('\0') {
        return Err(PathViolation::NulByte);
    }
    if has_windows_prefix(name) {
        return Err(PathViolation::WindowsPrefix);
    }
    if name.starts_with('\\') {
        return Err(PathViolation::Absolute);
    }

    let mut clean = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => {
                // Backslash-separated traversal is only dangerous off unix, but refuse it anyway
                if part.to_string_lossy().split('\\').any(|p| p == "..") {
                    return Err(PathViolation::ParentDir);
                }
                clean.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => return Err(PathViolation::ParentDir),
            Component::RootDir => return Err(PathViolation::Absolute),
            Component::Prefix(_) => return Err(PathViolation::WindowsPrefix),
        }
    }

    if clean.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(clean))
    }
}

/// Turn a member name into a relative path that cannot leave the output root.
///
/// Returns `Ok(None)` for names that reduce to the root itself (`./`, `.`),
/// which carry nothing to extract.
pub fn sanitize_member_path(name: &str) -> Result<Option<PathBuf>> {
    classify(name).map_err(|violation| {
        events::path_traversal_attempt(name, &violation.to_string());
        unsafe_path(name, violation)
    })
}

/// Refuse to create or write anything beneath a symlink inside `root`.
///
/// Walks `root/rel` one component at a time; components that do not exist yet
/// end the walk, since everything below them will be created fresh.
pub fn ensure_no_symlink_ancestors(root: &Path, name: &str, rel: &Path) -> Result<()> {
    let mut current = root.to_path_buf();
    for component in rel.components() {
        current.push(component);
        match std::fs::symlink_metadata(&current) {
            Ok(meta) if meta.file_type().is_symlink() => {
                events::symlink_write_blocked(name, &current);
                return Err(unsafe_path(name, PathViolation::SymlinkInPath));
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => break,
            Err(e) => return Err(TarGuardError::Io(e)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_pass() {
        assert_eq!(
            sanitize_member_path("dir/file.txt").unwrap(),
            Some(PathBuf::from("dir/file.txt"))
        );
        assert_eq!(
            sanitize_member_path("./dir/./file.txt").unwrap(),
            Some(PathBuf::from("dir/file.txt"))
        );
        assert_eq!(sanitize_member_path("..foo").unwrap(), Some(PathBuf::from("..foo")));
    }

    #[test]
    fn test_root_only_names_are_skipped() {
        assert_eq!(sanitize_member_path("./").unwrap(), None);
        assert_eq!(sanitize_member_path(".").unwrap(), None);
    }

    #[test]
    fn test_traversal_rejected() {
        for name in ["../evil", "a/../../evil", "a/..", "..", "a\\..\\b"] {
            let err = sanitize_member_path(name).unwrap_err();
            assert!(
                matches!(err, TarGuardError::UnsafePath { .. }),
                "{} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_absolute_and_prefixed_rejected() {
        assert_eq!(classify("/etc/passwd"), Err(PathViolation::Absolute));
        assert_eq!(classify("\\evil"), Err(PathViolation::Absolute));
        assert_eq!(classify("C:\\evil"), Err(PathViolation::WindowsPrefix));
        assert_eq!(classify("c:/evil"), Err(PathViolation::WindowsPrefix));
        assert_eq!(classify("\\\\server\\share"), Err(PathViolation::WindowsPrefix));
        assert_eq!(classify(""), Err(PathViolation::Empty));
        assert_eq!(classify("a\0b"), Err(PathViolation::NulByte));
    }

    #[cfg(unix)]
    #[test]
    fn test_drive_like_names_are_plain_files_on_unix() {
        assert_eq!(
            sanitize_member_path("c:notes.txt").unwrap(),
            Some(PathBuf::from("c:notes.txt"))
        );
        assert_eq!(
            sanitize_member_path("docs/a:b").unwrap(),
            Some(PathBuf::from("docs/a:b"))
        );
    }

    #[cfg(windows)]
    #[test]
    fn test_drive_relative_rejected_on_windows() {
        assert_eq!(classify("C:evil"), Err(PathViolation::WindowsPrefix));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_ancestor_blocked() {
        let root = tempfile::tempdir().unwrap();
        let outside = tempfile::tempdir().unwrap();
        std::os::unix::fs::symlink(outside.path(), root.path().join("link")).unwrap();

        let rel = PathBuf::from("link/payload.txt");
        let err = ensure_no_symlink_ancestors(root.path(), "link/payload.txt", &rel).unwrap_err();
        assert!(matches!(err, TarGuardError::UnsafePath { .. }));

        let fresh = PathBuf::from("new/dir/file.txt");
        ensure_no_symlink_ancestors(root.path(), "new/dir/file.txt", &fresh).unwrap();
    }
}
