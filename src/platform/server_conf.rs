//! Server configuration file parsing.
//!
//! Understands the `key = value` format used by PostgreSQL's
//! `postgresql.conf`: `#` starts a comment, the `=` is optional, values may
//! be single-quoted and keys are case-insensitive. A later assignment
//! overrides an earlier one.

use std::collections::BTreeMap;

/// Parse configuration file content into a key/value map.
pub fn parse_server_settings(content: &str) -> BTreeMap<String, String> {
    let mut settings = BTreeMap::new();

    for raw in content.lines() {
        let line = strip_comment(raw).trim();
        if line.is_empty() {
            continue;
        }

        let (key, value) = match line.find(|c: char| c == '=' || c.is_whitespace()) {
            Some(split) => {
                let (key, rest) = line.split_at(split);
                let rest = rest.trim_start();
                (key, rest.strip_prefix('=').unwrap_or(rest))
            }
            None => continue,
        };

        let value = value.trim();
        let value = value
            .strip_prefix('\'')
            .and_then(|v| v.strip_suffix('\''))
            .unwrap_or(value);

        settings.insert(key.trim().to_ascii_lowercase(), value.replace("''", "'"));
    }

    settings
}

/// Cut a line at the first `#` outside single quotes.
fn strip_comment(line: &str) -> &str {
    let mut quoted = false;
    for (i, c) in line.char_indices() {
        match c {
            '\'' => quoted = !quoted,
            '#' if !quoted => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Interpret a boolean setting. Unrecognised values yield `None`.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "yes" | "1" => Some(true),
        "off" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Parse a TLS protocol name such as `TLSv1.2` into `(major, minor)`.
pub fn tls_version(value: &str) -> Option<(u8, u8)> {
    let lower = value.trim().to_ascii_lowercase();
    let version = lower.strip_prefix("tlsv")?;
    let (major, minor) = version.split_once('.')?;
    Some((major.parse().ok()?, minor.parse().ok()?))
}

/// Parse an octal permission value such as `0600`.
pub fn parse_octal_mode(value: &str) -> Option<u32> {
    u32::from_str_radix(value.trim(), 8).ok()
}
