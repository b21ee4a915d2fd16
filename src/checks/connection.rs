//! Section 4: connection and login checks.

use crate::checks::{setting_on, CheckContext, CheckRegistry, Verdict};
use crate::platform::server_conf::tls_version;
use crate::{AuditError, CheckDescriptor, Scoring};

/// Addresses that bind every interface
const WILDCARD_ADDRESSES: [&str; 3] = ["*", "0.0.0.0", "::"];

pub fn register(registry: &mut CheckRegistry) -> Result<(), AuditError> {
    registry.section("4", "Connection and Login")?;
    registry.register(
        CheckDescriptor::new("4.1", 1, Scoring::Scored, "Ensure TLS is enabled"),
        setting_on("ssl"),
    )?;
    registry.register(
        CheckDescriptor::new(
            "4.1.1",
            2,
            Scoring::Scored,
            "Ensure the minimum TLS protocol version is 1.2 or newer",
        ),
        min_tls_version,
    )?;
    registry.register(
        CheckDescriptor::new(
            "4.2",
            1,
            Scoring::Scored,
            "Ensure the server does not listen on every interface",
        ),
        listen_addresses_restricted,
    )?;
    registry.register(
        CheckDescriptor::new(
            "4.3",
            1,
            Scoring::NotScored,
            "Ensure passwords are hashed with SCRAM-SHA-256",
        ),
        scram_passwords,
    )?;
    Ok(())
}

/// 4.1.1: ssl_min_protocol_version, server default TLSv1.2
fn min_tls_version(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let raw = match ctx.setting("ssl_min_protocol_version")? {
        Some(raw) => raw,
        None => return Ok(Verdict::Pass),
    };
    let version = tls_version(&raw).ok_or_else(|| AuditError::Parse {
        context: "ssl_min_protocol_version".to_string(),
        message: format!("unknown protocol '{}'", raw),
    })?;
    Ok(Verdict::from_bool(version >= (1, 2)))
}

/// 4.2: listen_addresses, server default localhost
fn listen_addresses_restricted(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let addresses = ctx
        .setting("listen_addresses")?
        .unwrap_or_else(|| "localhost".to_string());
    let wildcard = addresses
        .split(',')
        .map(str::trim)
        .any(|address| WILDCARD_ADDRESSES.contains(&address));
    Ok(Verdict::from_bool(!wildcard))
}

/// 4.3: password_encryption, server default scram-sha-256
fn scram_passwords(ctx: &CheckContext) -> Result<Verdict, AuditError> {
    let method = ctx
        .setting("password_encryption")?
        .unwrap_or_else(|| "scram-sha-256".to_string());
    Ok(Verdict::from_bool(method.eq_ignore_ascii_case("scram-sha-256")))
}
