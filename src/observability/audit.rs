/// Security event logging for targuard
/// Provides structured logging of security-relevant archive events for incident response
///
/// Every event is mirrored to the `log` facade; when an audit path is configured
/// it is also appended to that file as one JSON object per line.
use crate::config::types::{Result, TarGuardError};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use uuid::Uuid;

/// Security event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecuritySeverity {
    Critical,
    High,
    Medium,
    Low,
}

/// Types of security events we track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityEventType {
    // Lifecycle events
    ProcessingStart,
    ProcessingEnd,

    // Limit violation events
    LimitExceeded,

    // Filesystem safety events
    PathTraversalAttempt,
    SymlinkWriteBlocked,
    LinkSkipped,

    ConfigurationViolation,
}

impl SecurityEventType {
    /// Get the default severity for this event type
    pub fn default_severity(&self) -> SecuritySeverity {
        match self {
            SecurityEventType::ProcessingStart => SecuritySeverity::Low,
            SecurityEventType::ProcessingEnd => SecuritySeverity::Low,
            SecurityEventType::LimitExceeded => SecuritySeverity::High,
            SecurityEventType::PathTraversalAttempt => SecuritySeverity::Critical,
            SecurityEventType::SymlinkWriteBlocked => SecuritySeverity::Critical,
            SecurityEventType::LinkSkipped => SecuritySeverity::Medium,
            SecurityEventType::ConfigurationViolation => SecuritySeverity::Low,
        }
    }
}

/// Individual security event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityEvent {
    pub event_type: SecurityEventType,
    pub severity: SecuritySeverity,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub details: String,
    pub archive: Option<String>,
    pub archive_sha256: Option<String>,
    pub member: Option<String>,
}

impl SecurityEvent {
    /// Create a new security event with default severity
    pub fn new(event_type: SecurityEventType, details: String) -> Self {
        Self {
            severity: event_type.default_severity(),
            event_type,
            timestamp: chrono::Utc::now(),
            details,
            archive: None,
            archive_sha256: None,
            member: None,
        }
    }

    pub fn with_archive(mut self, archive: &Path) -> Self {
        self.archive = Some(archive.display().to_string());
        self
    }

    pub fn with_archive_sha256(mut self, digest: &str) -> Self {
        self.archive_sha256 = Some(digest.to_string());
        self
    }

    pub fn with_member(mut self, member: &str) -> Self {
        self.member = Some(member.to_string());
        self
    }
}

/// Security logger that handles both structured logging and the audit trail
pub struct SecurityLogger {
    run_id: String,
    audit_file: Option<Mutex<File>>,
    audit_path: Option<PathBuf>,
}

impl SecurityLogger {
    /// Create a new security logger; without a path events only reach `log`
    pub fn new(audit_path: Option<PathBuf>) -> Result<Self> {
        let audit_file = match &audit_path {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        TarGuardError::Config(format!(
                            "Failed to create audit log directory: {}",
                            e
                        ))
                    })?;
                }
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|e| {
                        TarGuardError::Config(format!("Failed to open audit log: {}", e))
                    })?;
                Some(Mutex::new(file))
            }
            None => None,
        };

        Ok(Self {
            run_id: Uuid::new_v4().to_string(),
            audit_file,
            audit_path,
        })
    }

    /// Build the JSON line written to the audit file
    pub fn render(&self, event: &SecurityEvent) -> serde_json::Value {
        let mut entry = serde_json::json!({
            "timestamp": event.timestamp.to_rfc3339(),
            "run_id": self.run_id,
            "event_type": event.event_type,
            "severity": event.severity,
            "details": event.details,
            "process_id": std::process::id(),
        });

        if let Some(archive) = &event.archive {
            entry["archive"] = serde_json::json!(archive);
        }
        if let Some(digest) = &event.archive_sha256 {
            entry["archive_sha256"] = serde_json::json!(digest);
        }
        if let Some(member) = &event.member {
            entry["member"] = serde_json::json!(member);
        }

        entry
    }

    /// Log a security event
    pub fn log_security_event(&self, event: SecurityEvent) {
        log_to_facade(&event);

        let Some(file) = &self.audit_file else {
            return;
        };

        let entry = self.render(&event);
        match file.lock() {
            Ok(mut file) => {
                if let Err(e) = writeln!(file, "{}", entry) {
                    error!("Failed to write to audit log: {}", e);
                }
                if let Err(e) = file.flush() {
                    error!("Failed to flush audit log: {}", e);
                }
            }
            Err(_) => error!("Failed to acquire lock on audit log"),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn audit_path(&self) -> Option<&Path> {
        self.audit_path.as_deref()
    }
}

fn log_to_facade(event: &SecurityEvent) {
    let member = event.member.as_deref().unwrap_or("-");
    match event.severity {
        SecuritySeverity::Critical | SecuritySeverity::High => {
            error!(
                "SECURITY {:?}: {:?} [{}] - {}",
                event.severity, event.event_type, member, event.details
            );
        }
        SecuritySeverity::Medium => {
            warn!(
                "SECURITY {:?}: {:?} [{}] - {}",
                event.severity, event.event_type, member, event.details
            );
        }
        SecuritySeverity::Low => {
            info!(
                "SECURITY {:?}: {:?} [{}] - {}",
                event.severity, event.event_type, member, event.details
            );
        }
    }
}

/// Global security logger instance
static SECURITY_LOGGER: OnceLock<SecurityLogger> = OnceLock::new();

/// Initialize the global security logger
pub fn init_security_logger(audit_path: Option<PathBuf>) -> Result<()> {
    let logger = SecurityLogger::new(audit_path)?;
    let run_id = logger.run_id.clone();
    if SECURITY_LOGGER.set(logger).is_err() {
        warn!("Security logger already initialized");
    } else {
        info!("Security logger initialized (run {})", run_id);
    }
    Ok(())
}

/// Log a security event using the global logger
pub fn log_security_event(event: SecurityEvent) {
    match SECURITY_LOGGER.get() {
        Some(logger) => logger.log_security_event(event),
        None => log_to_facade(&event),
    }
}

/// Convenience functions for common security events
pub mod events {
    use super::*;

    pub fn processing_start(archive: &Path, digest: &str, operation: &str) {
        log_security_event(
            SecurityEvent::new(
                SecurityEventType::ProcessingStart,
                format!("Starting {} of archive", operation),
            )
            .with_archive(archive)
            .with_archive_sha256(digest),
        );
    }

    pub fn processing_end(archive: &Path, outcome: &str) {
        log_security_event(
            SecurityEvent::new(SecurityEventType::ProcessingEnd, outcome.to_string())
                .with_archive(archive),
        );
    }

    pub fn limit_exceeded(archive: &Path, member: &str, details: String) {
        log_security_event(
            SecurityEvent::new(SecurityEventType::LimitExceeded, details)
                .with_archive(archive)
                .with_member(member),
        );
    }

    /// Log a path traversal attempt
    pub fn path_traversal_attempt(member: &str, reason: &str) {
        log_security_event(
            SecurityEvent::new(
                SecurityEventType::PathTraversalAttempt,
                format!("Blocked unsafe member path: {}", reason),
            )
            .with_member(member),
        );
    }

    pub fn symlink_write_blocked(member: &str, path: &Path) {
        log_security_event(
            SecurityEvent::new(
                SecurityEventType::SymlinkWriteBlocked,
                format!("Refused to write through symlink at {}", path.display()),
            )
            .with_member(member),
        );
    }

    pub fn link_skipped(member: &str, kind: &str) {
        log_security_event(
            SecurityEvent::new(
                SecurityEventType::LinkSkipped,
                format!("Skipped {} member; only files and directories are extracted", kind),
            )
            .with_member(member),
        );
    }

    pub fn configuration_violation(details: String) {
        log_security_event(SecurityEvent::new(
            SecurityEventType::ConfigurationViolation,
            details,
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_severity() {
        assert_eq!(
            SecurityEventType::PathTraversalAttempt.default_severity(),
            SecuritySeverity::Critical
        );
        assert_eq!(
            SecurityEventType::ProcessingStart.default_severity(),
            SecuritySeverity::Low
        );
    }

    #[test]
    fn test_audit_file_receives_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("audit.jsonl");
        let logger = SecurityLogger::new(Some(path.clone())).unwrap();

        logger.log_security_event(
            SecurityEvent::new(SecurityEventType::LinkSkipped, "skipped".to_string())
                .with_member("a/link"),
        );
        logger.log_security_event(SecurityEvent::new(
            SecurityEventType::ProcessingEnd,
            "done".to_string(),
        ));

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event_type"], "LinkSkipped");
        assert_eq!(lines[0]["member"], "a/link");
        assert_eq!(lines[0]["run_id"], logger.run_id());
        assert_eq!(lines[1]["severity"], "Low");
    }

    #[test]
    fn test_logger_without_path() {
        let logger = SecurityLogger::new(None).unwrap();
        assert!(logger.audit_path().is_none());
        logger.log_security_event(SecurityEvent::new(
            SecurityEventType::ProcessingStart,
            "start".to_string(),
        ));
    }
}
