//! Section 2: directory and file permission checks.

use crate::checks::{CheckContext, CheckRegistry, Verdict};
use crate::{AuditError, CheckDescriptor, Scoring};

pub fn register(registry: &mut CheckRegistry) -> Result<(), AuditError> {
    registry.section("2", "Directory and File Permissions")?;
    registry.register(
        CheckDescriptor::new(
            "2.1",
            1,
            Scoring::Scored,
            "Ensure the data directory is accessible only by its owner",
        ),
        data_dir_private,
    )?;
    registry.register(
        CheckDescriptor::new(
            "2.2",
            1,
            Scoring::Scored,
            "Ensure the data directory is owned by the service account",
        ),
        data_dir_owner,
    )?;
    registry.register(
        CheckDescriptor::new(
            "2.3",
            1,
            Scoring::Scored,
            "Ensure the configuration file is owned by the service account",
        ),
        config_owner,
    )?;
    registry.register(
        CheckDescriptor::new(
            "2.4",
            2,
            Scoring::Scored,
            "Ensure the configuration file is not writable by group or readable by others",
        ),
        config_mode,
    )?;
    Ok(())
}

/// 2.1: Data directory mode 0700 or stricter
fn data_dir_private(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let status = ctx.facts().file_status(&ctx.target.data_dir)?;
    Ok(Verdict::from_bool(status.is_dir && status.mode & 0o077 == 0))
}

/// 2.2: Data directory owner
fn data_dir_owner(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let uid = ctx.service_uid()?;
    let status = ctx.facts().file_status(&ctx.target.data_dir)?;
    Ok(Verdict::from_bool(status.uid == uid))
}

/// 2.3: Configuration file owner
fn config_owner(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let uid = ctx.service_uid()?;
    let status = ctx.facts().file_status(&ctx.target.config_file)?;
    Ok(Verdict::from_bool(status.uid == uid))
}

/// 2.4: Configuration file mode 0640 or stricter
fn config_mode(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let status = ctx.facts().file_status(&ctx.target.config_file)?;
    Ok(Verdict::from_bool(status.mode & 0o027 == 0))
}
