/// Configuration loading from a JSON config file
use crate::config::types::{Limits, OutputFormat, ProcessorConfig, Result, TarGuardError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Limit section of the config file; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileLimits {
    pub max_extract_size: Option<u64>,
    pub max_files: Option<u64>,
}

/// Full config file structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub limits: FileLimits,
    pub audit_log: Option<PathBuf>,
    pub strict_paths: Option<bool>,
    pub output_format: Option<OutputFormat>,
}

impl FileConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TarGuardError::Config(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content).map_err(|e| match e {
            TarGuardError::Config(msg) => {
                TarGuardError::Config(format!("{} ({})", msg, path.display()))
            }
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| TarGuardError::Config(format!("Failed to parse config JSON: {}", e)))
    }
}

/// Values supplied on the command line; `None` means "not given"
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_extract_size: Option<u64>,
    pub max_files: Option<u64>,
    pub audit_log: Option<PathBuf>,
    pub json: bool,
    pub allow_unsafe_paths: bool,
}

impl ProcessorConfig {
    /// Merge sources with precedence: CLI flag > config file > default
    pub fn from_sources(file: Option<FileConfig>, overrides: Overrides) -> Self {
        let defaults = ProcessorConfig::default();
        let file = file.unwrap_or_default();

        let limits = Limits {
            max_extract_size: overrides
                .max_extract_size
                .or(file.limits.max_extract_size)
                .unwrap_or(defaults.limits.max_extract_size),
            max_files: overrides
                .max_files
                .or(file.limits.max_files)
                .unwrap_or(defaults.limits.max_files),
        };

        let output_format = if overrides.json {
            OutputFormat::Json
        } else {
            file.output_format.unwrap_or(defaults.output_format)
        };

        let strict_paths = if overrides.allow_unsafe_paths {
            false
        } else {
            file.strict_paths.unwrap_or(defaults.strict_paths)
        };

        ProcessorConfig {
            limits,
            output_format,
            audit_log: overrides.audit_log.or(file.audit_log),
            strict_paths,
        }
    }
}
