//! Linux system interface.
//!
//! Reads host facts via /proc, file metadata and /etc/passwd.
//!
//! # Graceful Degradation
//!
//! - Unreadable process entries: skipped (processes exit while we scan)
//! - Missing files: returned as `AuditError::Io` with the path as context
//! - Unknown users: `Ok(None)`, left to the check to judge
//! - `renice` failures: returned as `AuditError::Command`
//!
//! No function in this module will panic.

use std::fs;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::platform::{FileStatus, ProcessInfo, SystemFacts};
use crate::AuditError;

/// [`SystemFacts`] backed by the live host.
#[derive(Debug, Clone)]
pub struct LinuxFacts {
    proc_root: PathBuf,
    passwd: PathBuf,
}

impl LinuxFacts {
    pub fn new() -> Self {
        LinuxFacts {
            proc_root: PathBuf::from("/proc"),
            passwd: PathBuf::from("/etc/passwd"),
        }
    }

    /// Read from an alternative proc tree and passwd file.
    pub fn with_roots(proc_root: impl Into<PathBuf>, passwd: impl Into<PathBuf>) -> Self {
        LinuxFacts {
            proc_root: proc_root.into(),
            passwd: passwd.into(),
        }
    }
}

impl Default for LinuxFacts {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemFacts for LinuxFacts {
    fn processes(&self) -> Result<Vec<ProcessInfo>, AuditError> {
        let entries = fs::read_dir(&self.proc_root)
            .map_err(|e| AuditError::io(self.proc_root.display().to_string(), e))?;

        let mut processes = Vec::new();
        for entry in entries.flatten() {
            let pid: u32 = match entry.file_name().to_string_lossy().parse() {
                Ok(pid) => pid,
                Err(_) => continue,
            };
            if let Ok(status) = fs::read_to_string(entry.path().join("status")) {
                if let Some(process) = parse_proc_status(pid, &status) {
                    processes.push(process);
                }
            }
        }
        Ok(processes)
    }

    fn file_status(&self, path: &Path) -> Result<FileStatus, AuditError> {
        let metadata =
            fs::metadata(path).map_err(|e| AuditError::io(path.display().to_string(), e))?;
        Ok(FileStatus {
            mode: metadata.mode() & 0o7777,
            uid: metadata.uid(),
            gid: metadata.gid(),
            is_dir: metadata.is_dir(),
        })
    }

    fn read_to_string(&self, path: &Path) -> Result<String, AuditError> {
        fs::read_to_string(path).map_err(|e| AuditError::io(path.display().to_string(), e))
    }

    fn user_id(&self, name: &str) -> Result<Option<u32>, AuditError> {
        let content = fs::read_to_string(&self.passwd)
            .map_err(|e| AuditError::io(self.passwd.display().to_string(), e))?;
        Ok(lookup_passwd_uid(&content, name))
    }
}

/// Parse `/proc/<pid>/status` into a process entry.
pub fn parse_proc_status(pid: u32, status: &str) -> Option<ProcessInfo> {
    let mut name = None;
    let mut uid = None;

    for line in status.lines() {
        if let Some(value) = line.strip_prefix("Name:") {
            name = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("Uid:") {
            uid = value.split_whitespace().next().and_then(|v| v.parse().ok());
        }
    }

    Some(ProcessInfo {
        pid,
        name: name?,
        uid: uid?,
    })
}

/// Find the uid of `name` in passwd-format content.
pub fn lookup_passwd_uid(content: &str, name: &str) -> Option<u32> {
    content
        .lines()
        .filter(|line| !line.starts_with('#'))
        .find_map(|line| {
            let mut fields = line.split(':');
            if fields.next()? != name {
                return None;
            }
            fields.nth(1)?.parse().ok()
        })
}

/// Get the system hostname
pub fn get_hostname() -> Result<String, AuditError> {
    for path in ["/etc/hostname", "/proc/sys/kernel/hostname"] {
        if let Ok(hostname) = fs::read_to_string(path) {
            let hostname = hostname.trim().to_string();
            if !hostname.is_empty() {
                return Ok(hostname);
            }
        }
    }

    Err(AuditError::NotFound {
        what: "hostname in /etc/hostname or /proc".to_string(),
    })
}

/// Lower this process's scheduling priority by `increment` via `renice`.
pub fn lower_priority(increment: i32) -> Result<(), AuditError> {
    let pid = std::process::id().to_string();
    let output = Command::new("renice")
        .args(["-n", &increment.to_string(), "-p", &pid])
        .output()
        .map_err(|e| AuditError::Command {
            command: "renice".to_string(),
            message: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(AuditError::Command {
            command: "renice".to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}
