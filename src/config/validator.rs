// Config validation
// Runs before any archive is opened; errors are fatal, warnings are logged

use crate::config::types::{ProcessorConfig, Result, TarGuardError};

/// Member-count ceiling above which a warning is raised
pub const MAX_FILES_CEILING: u64 = 1_000_000;

/// Payload ceiling above which a warning is raised (1 TiB)
pub const MAX_EXTRACT_SIZE_CEILING: u64 = 1 << 40;

/// Validation result with detailed errors
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: String) {
        self.valid = false;
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate config at startup, failing fast on errors
pub fn validate_config(config: &ProcessorConfig) -> Result<ValidationResult> {
    let mut result = ValidationResult::new();

    validate_limits(config, &mut result);
    validate_paths(config, &mut result);

    for warning in &result.warnings {
        log::warn!("Config warning: {}", warning);
    }

    if !result.is_valid() {
        return Err(TarGuardError::Config(format!(
            "Config validation failed:\n{}",
            result.errors.join("\n")
        )));
    }

    Ok(result)
}

fn validate_limits(config: &ProcessorConfig, result: &mut ValidationResult) {
    let limits = &config.limits;

    if limits.max_files == 0 {
        result.add_error("max_files must be greater than 0".to_string());
    } else if limits.max_files > MAX_FILES_CEILING {
        result.add_warning(format!(
            "max_files {} is above the recommended ceiling of {}",
            limits.max_files, MAX_FILES_CEILING
        ));
    }

    if limits.max_extract_size == 0 {
        result.add_error("max_extract_size must be greater than 0".to_string());
    } else if limits.max_extract_size > MAX_EXTRACT_SIZE_CEILING {
        result.add_warning(format!(
            "max_extract_size {} bytes is above the recommended ceiling of {} bytes",
            limits.max_extract_size, MAX_EXTRACT_SIZE_CEILING
        ));
    }

    if !config.strict_paths {
        result.add_warning(
            "strict path checking disabled; unsafe member names will be skipped".to_string(),
        );
    }
}

fn validate_paths(config: &ProcessorConfig, result: &mut ValidationResult) {
    if let Some(audit_log) = &config.audit_log {
        if audit_log.is_dir() {
            result.add_error(format!(
                "audit_log {} is a directory",
                audit_log.display()
            ));
        }
    }
}
