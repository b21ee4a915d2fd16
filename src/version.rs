//! `cisbench version` output.
//!
//! Values come from environment variables set by build.rs; any of them may be
//! missing when building outside a git checkout.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub commit: Option<&'static str>,
    pub built: Option<&'static str>,
    /// Target triple
    pub target: &'static str,
    pub rustc: Option<&'static str>,
}

impl BuildInfo {
    /// Metadata of the running binary
    pub fn current() -> Self {
        BuildInfo {
            version: env!("CARGO_PKG_VERSION"),
            commit: option_env!("CISBENCH_GIT_HASH"),
            built: option_env!("CISBENCH_BUILD_DATE"),
            target: option_env!("CISBENCH_TARGET").unwrap_or(std::env::consts::ARCH),
            rustc: option_env!("CISBENCH_RUSTC_VERSION"),
        }
    }

    /// `cisbench 0.1.0 (abc1234, 2026-01-02T03:04:05Z)`, with the
    /// parenthesised part trimmed to what is known.
    pub fn headline(&self) -> String {
        let provenance: Vec<&str> = [self.commit, self.built].into_iter().flatten().collect();
        if provenance.is_empty() {
            format!("cisbench {}", self.version)
        } else {
            format!("cisbench {} ({})", self.version, provenance.join(", "))
        }
    }
}

impl fmt::Display for BuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\ntarget: {}", self.headline(), self.target)?;
        if let Some(rustc) = self.rustc {
            write!(f, "\nrustc:  {}", rustc)?;
        }
        Ok(())
    }
}
