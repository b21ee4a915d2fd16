//! Platform abstraction layer.
//!
//! Checks never touch the host directly; they ask a [`SystemFacts`]
//! implementation for:
//! - the process table
//! - file ownership and permission bits
//! - file contents
//! - user account lookups
//!
//! [`linux::LinuxFacts`] answers from `/proc`, file metadata and
//! `/etc/passwd`. Tests substitute their own implementation.

pub mod linux;
pub mod server_conf;

use std::path::Path;

use crate::AuditError;

/// A running process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    /// Real user id
    pub uid: u32,
}

/// Ownership and permission bits of a file or directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileStatus {
    /// Permission bits only (e.g. 0o700)
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub is_dir: bool,
}

/// Source of every host fact a check may inspect.
pub trait SystemFacts: Send + Sync {
    /// All processes visible to the auditor
    fn processes(&self) -> Result<Vec<ProcessInfo>, AuditError>;

    fn file_status(&self, path: &Path) -> Result<FileStatus, AuditError>;

    fn read_to_string(&self, path: &Path) -> Result<String, AuditError>;

    /// Numeric id of a user account, `None` if the account does not exist
    fn user_id(&self, name: &str) -> Result<Option<u32>, AuditError>;
}

/// In-memory host for unit tests. Unknown paths are not found.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct FakeFacts {
    pub processes: Vec<ProcessInfo>,
    pub files: std::collections::HashMap<std::path::PathBuf, FileStatus>,
    pub contents: std::collections::HashMap<std::path::PathBuf, String>,
    pub users: std::collections::HashMap<String, u32>,
}

#[cfg(test)]
impl SystemFacts for FakeFacts {
    fn processes(&self) -> Result<Vec<ProcessInfo>, AuditError> {
        Ok(self.processes.clone())
    }

    fn file_status(&self, path: &Path) -> Result<FileStatus, AuditError> {
        self.files.get(path).copied().ok_or_else(|| AuditError::NotFound {
            what: path.display().to_string(),
        })
    }

    fn read_to_string(&self, path: &Path) -> Result<String, AuditError> {
        self.contents
            .get(path)
            .cloned()
            .ok_or_else(|| AuditError::NotFound {
                what: path.display().to_string(),
            })
    }

    fn user_id(&self, name: &str) -> Result<Option<u32>, AuditError> {
        Ok(self.users.get(name).copied())
    }
}
