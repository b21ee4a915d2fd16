//! Section 3: logging and auditing checks.

use crate::checks::{manual, setting_on, CheckContext, CheckRegistry, Verdict};
use crate::platform::server_conf::parse_octal_mode;
use crate::{AuditError, CheckDescriptor, Scoring};

pub fn register(registry: &mut CheckRegistry) -> Result<(), AuditError> {
    registry.section("3", "Logging and Auditing")?;
    registry.section("3.1", "Log Destination and Collection")?;
    registry.register(
        CheckDescriptor::new("3.1.1", 1, Scoring::Scored, "Ensure the log destination is set"),
        log_destination_set,
    )?;
    registry.register(
        CheckDescriptor::new(
            "3.1.2",
            1,
            Scoring::Scored,
            "Ensure the logging collector is enabled",
        ),
        setting_on("logging_collector"),
    )?;
    registry.register(
        CheckDescriptor::new(
            "3.1.3",
            1,
            Scoring::NotScored,
            "Ensure log files are created with mode 0600",
        ),
        log_file_mode,
    )?;
    registry.register(
        CheckDescriptor::new("3.1.4", 2, Scoring::Scored, "Ensure connections are logged"),
        setting_on("log_connections"),
    )?;
    registry.register(
        CheckDescriptor::new("3.1.5", 2, Scoring::Scored, "Ensure disconnections are logged"),
        setting_on("log_disconnections"),
    )?;
    registry.register(
        CheckDescriptor::new(
            "3.2",
            2,
            Scoring::Skipped,
            "Ensure the pgAudit extension is configured for session auditing",
        ),
        manual,
    )?;
    Ok(())
}

/// 3.1.1: log_destination
fn log_destination_set(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let destination = ctx.setting("log_destination")?.unwrap_or_default();
    Ok(Verdict::from_bool(!destination.trim().is_empty()))
}

/// 3.1.3: log_file_mode, server default 0600
fn log_file_mode(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let mode = match ctx.setting("log_file_mode")? {
        Some(raw) => parse_octal_mode(&raw).ok_or_else(|| AuditError::Parse {
            context: "log_file_mode".to_string(),
            message: format!("'{}' is not an octal mode", raw),
        })?,
        None => 0o600,
    };
    Ok(Verdict::from_bool(mode & 0o077 == 0))
}
