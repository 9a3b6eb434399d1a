use crate::config::loader::{FileConfig, Overrides};
use crate::config::types::{OutputFormat, ProcessorConfig, TarGuardError};
use crate::observability::audit::{self, events};
use crate::processor::TarProcessor;
use anyhow::Result;
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;

/// Exit status for processing failures and missing archives
pub const EXIT_FAILURE: i32 = 1;

/// Exit status for invalid configuration
pub const EXIT_CONFIG: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "Secure tar archive processor", long_about = None)]
pub struct Cli {
    /// Path to tar archive (plain, gzip, bzip2 or xz)
    pub archive: PathBuf,
    /// Extract archive (default: list only)
    #[arg(short = 'x', long)]
    pub extract: bool,
    /// Output directory for extraction (default: <archive stem>_extracted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Maximum total extraction size in bytes
    #[arg(long = "max-size", value_name = "BYTES")]
    pub max_size: Option<u64>,
    /// Maximum number of archive members to process
    #[arg(long = "max-files", value_name = "COUNT")]
    pub max_files: Option<u64>,
    /// JSON config file
    #[arg(long, env = "TARGUARD_CONFIG")]
    pub config: Option<PathBuf>,
    /// Emit a JSON report instead of progress lines
    #[arg(long)]
    pub json: bool,
    /// Append security audit events to this file (JSON lines)
    #[arg(long, value_name = "FILE")]
    pub audit_log: Option<PathBuf>,
    /// Skip members with unsafe names instead of aborting the extraction
    #[arg(long)]
    pub allow_unsafe_paths: bool,
}

impl Cli {
    fn operation(&self) -> &'static str {
        if self.extract {
            "extracting"
        } else {
            "reading"
        }
    }
}

extern "C" fn signal_handler(sig: i32) {
    // Only async-signal-safe calls here: raw write(2) and _exit(2)
    let msg = b"targuard: signal received, exiting\n";
    unsafe {
        libc::write(2, msg.as_ptr() as *const libc::c_void, msg.len());
        libc::_exit(128 + sig);
    }
}

fn setup_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGTERM, signal_handler as usize);
        libc::signal(libc::SIGINT, signal_handler as usize);
    }
}

/// Resolve the effective configuration from the config file and flags
pub fn resolve_config(cli: &Cli) -> std::result::Result<ProcessorConfig, TarGuardError> {
    let file = match &cli.config {
        Some(path) => Some(FileConfig::load_from_file(path)?),
        None => None,
    };

    let overrides = Overrides {
        max_extract_size: cli.max_size,
        max_files: cli.max_files,
        audit_log: cli.audit_log.clone(),
        json: cli.json,
        allow_unsafe_paths: cli.allow_unsafe_paths,
    };

    let config = ProcessorConfig::from_sources(file, overrides);
    crate::config::validator::validate_config(&config)?;
    Ok(config)
}

/// Text-mode errors go to `err`; JSON-mode errors are the report on `out`
fn report_error(
    format: OutputFormat,
    message: String,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(err, "{}", message)?,
        OutputFormat::Json => {
            let body = serde_json::json!({ "status": "error", "error": message });
            writeln!(out, "{}", serde_json::to_string_pretty(&body)?)?;
        }
    }
    Ok(())
}

/// Run one invocation and return the process exit status
pub fn execute(cli: &Cli, out: &mut dyn Write, err: &mut dyn Write) -> Result<i32> {
    let config = match resolve_config(cli) {
        Ok(config) => config,
        Err(e) => {
            // The audit file named on the command line still gets the violation
            if let Err(init) = audit::init_security_logger(cli.audit_log.clone()) {
                log::warn!("Audit log unavailable: {}", init);
            }
            events::configuration_violation(e.to_string());
            let format = if cli.json {
                OutputFormat::Json
            } else {
                OutputFormat::Text
            };
            report_error(format, format!("Error: {}", e), out, err)?;
            return Ok(EXIT_CONFIG);
        }
    };
    let format = config.output_format;

    if !cli.archive.exists() {
        report_error(
            format,
            format!("Error: Archive '{}' not found", cli.archive.display()),
            out,
            err,
        )?;
        return Ok(EXIT_FAILURE);
    }

    if let Err(e) = audit::init_security_logger(config.audit_log.clone()) {
        report_error(format, format!("Error: {}", e), out, err)?;
        return Ok(EXIT_CONFIG);
    }

    let processor = TarProcessor::new(config);

    // Progress lines only make sense for humans; JSON mode prints the report alone
    let mut sink = std::io::sink();
    let progress: &mut dyn Write = match format {
        OutputFormat::Text => &mut *out,
        OutputFormat::Json => &mut sink,
    };

    let report = if cli.extract {
        processor
            .extract_archive(&cli.archive, cli.output.as_deref(), progress)
            .map(serde_json::to_value)
    } else {
        processor
            .list_archive(&cli.archive, progress)
            .map(serde_json::to_value)
    };

    match report {
        Ok(value) => {
            if format == OutputFormat::Json {
                let mut value = value?;
                value["status"] = serde_json::json!("ok");
                writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            }
            Ok(0)
        }
        Err(e) => {
            let message = if e.is_archive_error() {
                format!("Error {} tar file: {}", cli.operation(), e)
            } else {
                format!("Unexpected error: {}", e)
            };
            report_error(format, message, out, err)?;
            Ok(EXIT_FAILURE)
        }
    }
}

pub fn run() -> Result<()> {
    setup_signal_handlers();

    // Structured logging; verbosity via RUST_LOG
    env_logger::init();

    let cli = Cli::parse();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut err = std::io::stderr().lock();
    let code = execute(&cli, &mut out, &mut err)?;
    out.flush()?;
    err.flush()?;
    drop(out);
    drop(err);

    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    #[test]
    fn test_parse_short_flags() {
        let cli = Cli::try_parse_from(["targuard", "a.tar", "-x", "-o", "out"]).unwrap();
        assert!(cli.extract);
        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert_eq!(cli.max_size, None);
    }

    #[test]
    fn test_parse_limits() {
        let cli = Cli::try_parse_from([
            "targuard",
            "a.tar",
            "--max-size",
            "2048",
            "--max-files",
            "5",
            "--json",
        ])
        .unwrap();
        let config = resolve_config(&cli).unwrap();
        assert_eq!(config.limits.max_extract_size, 2048);
        assert_eq!(config.limits.max_files, 5);
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_archive_is_required() {
        assert!(Cli::try_parse_from(["targuard"]).is_err());
    }

    #[test]
    fn test_zero_limit_exits_with_config_status() {
        let cli = Cli::try_parse_from(["targuard", "a.tar", "--max-files", "0"]).unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        assert_eq!(execute(&cli, &mut out, &mut err).unwrap(), EXIT_CONFIG);
        assert!(out.is_empty());
        let text = String::from_utf8(err).unwrap();
        assert!(text.starts_with("Error: Configuration error:"));
    }

    #[test]
    fn test_missing_archive_exits_with_failure() {
        let dir = tempfile::tempdir().unwrap();
        let archive = dir.path().join("missing.tar");
        let args = vec![
            OsString::from("targuard"),
            archive.into_os_string(),
            OsString::from("--json"),
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let mut out = Vec::new();
        let mut err = Vec::new();
        assert_eq!(execute(&cli, &mut out, &mut err).unwrap(), EXIT_FAILURE);
        assert!(err.is_empty());

        let body: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(body["status"], "error");
        assert!(body["error"].as_str().unwrap().contains("not found"));
    }
}
