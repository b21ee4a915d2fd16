//! Section 1: installation and service account checks.

use crate::checks::{manual, CheckContext, CheckRegistry, Verdict};
use crate::{AuditError, CheckDescriptor, Scoring};

pub fn register(registry: &mut CheckRegistry) -> Result<(), AuditError> {
    registry.section("1", "Installation and Patches")?;
    registry.register(
        CheckDescriptor::new(
            "1.1",
            1,
            Scoring::Skipped,
            "Ensure packages are obtained from authorized repositories",
        ),
        manual,
    )?;
    registry.register(
        CheckDescriptor::new(
            "1.2",
            1,
            Scoring::Scored,
            "Ensure the database server is running",
        ),
        server_running,
    )?;
    registry.register(
        CheckDescriptor::new(
            "1.3",
            1,
            Scoring::Scored,
            "Ensure the database server does not run as root",
        ),
        not_running_as_root,
    )?;
    registry.register(
        CheckDescriptor::new(
            "1.4",
            2,
            Scoring::Scored,
            "Ensure the database server runs as the service account",
        ),
        runs_as_service_user,
    )?;
    Ok(())
}

/// 1.2: Server running
fn server_running(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    ctx.server_processes()?;
    Ok(Verdict::Pass)
}

/// 1.3: Not running as root
fn not_running_as_root(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let processes = ctx.server_processes()?;
    Ok(Verdict::from_bool(processes.iter().all(|p| p.uid != 0)))
}

/// 1.4: Running as the service account
fn runs_as_service_user(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let uid = ctx.service_uid()?;
    let processes = ctx.server_processes()?;
    Ok(Verdict::from_bool(processes.iter().all(|p| p.uid == uid)))
}
