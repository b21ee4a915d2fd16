//! Compliance checks.
//!
//! The bundled catalogue audits a PostgreSQL server and is organized in
//! sections:
//! - 1 Installation: server process and service account
//! - 2 File permissions: data directory and configuration file
//! - 3 Logging: log collection and connection logging
//! - 4 Connections: TLS, listen addresses, password hashing
//!
//! # Graceful Degradation
//!
//! Checks are stateless predicates over [`SystemFacts`]:
//! - Condition met / not met: `Ok(Verdict::Pass)` / `Ok(Verdict::Fail)`
//! - Fact unavailable (process missing, file unreadable): `Err(..)`, which
//!   the engine records as an `Error` row
//! - Manual review items: registered as `Skipped` and never evaluated
//!
//! Checks never panic.

pub mod connection;
pub mod installation;
pub mod logging;
pub mod permissions;
pub mod registry;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::platform::server_conf::{parse_bool, parse_server_settings};
use crate::platform::{ProcessInfo, SystemFacts};
use crate::AuditError;

pub use registry::{CheckRegistry, RegisteredCheck, SectionHeader};

/// Pass/fail answer of an evaluated check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Pass,
    Fail,
}

impl Verdict {
    pub fn from_bool(passed: bool) -> Self {
        if passed {
            Verdict::Pass
        } else {
            Verdict::Fail
        }
    }
}

/// Executable predicate of a catalogue entry.
pub trait Check: Send + Sync {
    fn evaluate(&self, ctx: &CheckContext) -> Result<Verdict, AuditError>;
}

impl<F> Check for F
where
    F: Fn(&CheckContext) -> Result<Verdict, AuditError> + Send + Sync,
{
    fn evaluate(&self, ctx: &CheckContext) -> Result<Verdict, AuditError> {
        self(ctx)
    }
}

/// Where the audited server lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSettings {
    /// Account the server must run as
    pub user: String,
    /// Process name of the server
    pub process_name: String,
    /// Server configuration file
    pub config_file: PathBuf,
    /// Server data directory
    pub data_dir: PathBuf,
}

impl Default for TargetSettings {
    fn default() -> Self {
        TargetSettings {
            user: "postgres".to_string(),
            process_name: "postgres".to_string(),
            config_file: PathBuf::from("/etc/postgresql/postgresql.conf"),
            data_dir: PathBuf::from("/var/lib/postgresql/data"),
        }
    }
}

/// Everything a check may look at.
pub struct CheckContext {
    pub target: TargetSettings,
    facts: Arc<dyn SystemFacts>,
}

impl CheckContext {
    pub fn new(target: TargetSettings, facts: Arc<dyn SystemFacts>) -> Self {
        CheckContext { target, facts }
    }

    pub fn facts(&self) -> &dyn SystemFacts {
        self.facts.as_ref()
    }

    /// Parsed server configuration file.
    pub fn server_settings(&self) -> Result<BTreeMap<String, String>, AuditError> {
        let content = self.facts.read_to_string(&self.target.config_file)?;
        Ok(parse_server_settings(&content))
    }

    /// Value of one server setting, `None` when it is not set.
    pub fn setting(&self, key: &str) -> Result<Option<String>, AuditError> {
        Ok(self.server_settings()?.remove(&key.to_ascii_lowercase()))
    }

    /// Whether a boolean server setting is explicitly on.
    pub fn setting_enabled(&self, key: &str) -> Result<bool, AuditError> {
        Ok(self
            .setting(key)?
            .as_deref()
            .and_then(parse_bool)
            .unwrap_or(false))
    }

    /// Running server processes. Fails when none is running.
    pub fn server_processes(&self) -> Result<Vec<ProcessInfo>, AuditError> {
        let processes: Vec<ProcessInfo> = self
            .facts
            .processes()?
            .into_iter()
            .filter(|p| p.name == self.target.process_name)
            .collect();

        if processes.is_empty() {
            return Err(AuditError::NotFound {
                what: format!("'{}' server process", self.target.process_name),
            });
        }
        Ok(processes)
    }

    /// Uid of the configured service account. Fails when it does not exist.
    pub fn service_uid(&self) -> Result<u32, AuditError> {
        self.facts
            .user_id(&self.target.user)?
            .ok_or_else(|| AuditError::NotFound {
                what: format!("user '{}'", self.target.user),
            })
    }
}

/// Predicate for manual review items. Registered as `Skipped`, so the
/// engine never calls it.
pub(crate) fn manual(_ctx: &CheckContext) -> Result<Verdict, AuditError> {
    Ok(Verdict::Pass)
}

/// Check that passes when the boolean server setting `key` is on.
pub(crate) fn setting_on(key: &'static str) -> impl Check {
    move |ctx: &CheckContext| -> Result<Verdict, AuditError> {
        Ok(Verdict::from_bool(ctx.setting_enabled(key)?))
    }
}

/// Build the bundled catalogue.
pub fn default_registry() -> Result<CheckRegistry, AuditError> {
    let mut registry = CheckRegistry::new();
    installation::register(&mut registry)?;
    permissions::register(&mut registry)?;
    logging::register(&mut registry)?;
    connection::register(&mut registry)?;
    Ok(registry)
}
