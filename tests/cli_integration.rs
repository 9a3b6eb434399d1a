//! End-to-end tests through the CLI entry point

use clap::Parser;
use std::ffi::OsString;
use std::path::Path;
use targuard::cli::{execute, Cli, EXIT_FAILURE};

fn build_archive(path: &Path) {
    let mut builder = tar::Builder::new(Vec::new());
    let mut header = tar::Header::new_gnu();
    header.set_entry_type(tar::EntryType::Regular);
    header.set_size(5);
    header.set_mode(0o644);
    builder
        .append_data(&mut header, "notes.txt", &b"notes"[..])
        .unwrap();
    std::fs::write(path, builder.into_inner().unwrap()).unwrap();
}

fn cli(args: &[&OsString]) -> Cli {
    let mut argv = vec![OsString::from("targuard")];
    argv.extend(args.iter().map(|a| (*a).clone()));
    Cli::try_parse_from(argv).unwrap()
}

#[test]
fn test_json_listing_report() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("notes.tar");
    build_archive(&archive);

    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = execute(
        &cli(&[&archive.clone().into_os_string(), &OsString::from("--json")]),
        &mut out,
        &mut err,
    )
    .unwrap();
    assert_eq!(code, 0);

    let body: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["total_files"], 1);
    assert_eq!(body["total_size"], 5);
    assert_eq!(body["entries"][0]["name"], "notes.txt");
    assert_eq!(body["entries"][0]["kind"], "file");
}

#[test]
fn test_extract_size_limit_failure() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("notes.tar");
    build_archive(&archive);
    let output = dir.path().join("out");

    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = execute(
        &cli(&[
            &archive.clone().into_os_string(),
            &OsString::from("-x"),
            &OsString::from("-o"),
            &output.clone().into_os_string(),
            &OsString::from("--max-size"),
            &OsString::from("4"),
        ]),
        &mut out,
        &mut err,
    )
    .unwrap();

    assert_eq!(code, EXIT_FAILURE);
    assert!(output.is_dir());
    assert!(!output.join("notes.txt").exists());
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Extracting "));
    assert_eq!(
        String::from_utf8(err).unwrap(),
        "Error extracting tar file: Archive too large (>4 bytes)\n"
    );
}

#[test]
fn test_text_extraction_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("notes.tar");
    build_archive(&archive);
    let output = dir.path().join("out");

    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = execute(
        &cli(&[
            &archive.clone().into_os_string(),
            &OsString::from("--extract"),
            &OsString::from("--output"),
            &output.clone().into_os_string(),
        ]),
        &mut out,
        &mut err,
    )
    .unwrap();

    assert_eq!(code, 0);
    assert_eq!(std::fs::read(output.join("notes.txt")).unwrap(), b"notes");
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("Extracted: notes.txt"));
    assert!(text.ends_with("Extraction complete: 1 files, 5 bytes\n"));
    assert!(err.is_empty());
}

#[test]
fn test_list_failure_goes_to_error_writer() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("garbage.tar");
    std::fs::write(&archive, vec![b'x'; 1024]).unwrap();

    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = execute(&cli(&[&archive.clone().into_os_string()]), &mut out, &mut err).unwrap();

    assert_eq!(code, EXIT_FAILURE);
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("Listing contents of: "));
    assert!(!text.contains("Error"));
    assert!(String::from_utf8(err)
        .unwrap()
        .starts_with("Error reading tar file: "));
}

#[test]
fn test_missing_output_parent_is_unexpected_error() {
    let dir = tempfile::tempdir().unwrap();
    let archive = dir.path().join("notes.tar");
    build_archive(&archive);
    let output = dir.path().join("missing").join("out");

    let mut out = Vec::new();
    let mut err = Vec::new();
    let code = execute(
        &cli(&[
            &archive.clone().into_os_string(),
            &OsString::from("-x"),
            &OsString::from("-o"),
            &output.clone().into_os_string(),
        ]),
        &mut out,
        &mut err,
    )
    .unwrap();

    assert_eq!(code, EXIT_FAILURE);
    assert!(!output.exists());
    assert!(out.is_empty());
    let message = String::from_utf8(err).unwrap();
    assert!(message.starts_with("Unexpected error: "));
    assert!(message.contains("Failed to create output directory"));
}
