//! Host argument normalization

use crate::error::{Error, Result};

const SCHEMES: [&str; 2] = ["smb://", "cifs://"];

/// Reduce a user-supplied server reference to a bare host name or address.
///
/// Strips one leading `smb://`/`cifs://` (any case) or `\\`/`//`, trailing
/// slashes and backslashes, a trailing `:port`, and `[...]` around IPv6
/// literals. The port is discarded; callers pass it separately.
pub fn normalize_host(input: &str) -> Result<String> {
    let mut host = input.trim();

    if let Some(rest) = strip_scheme(host) {
        host = rest;
    } else if let Some(rest) = host.strip_prefix("\\\\").or_else(|| host.strip_prefix("//")) {
        host = rest;
    }

    host = host.trim_end_matches(['/', '\\']);
    host = strip_port(host);

    if let Some(inner) = host.strip_prefix('[').and_then(|h| h.strip_suffix(']')) {
        host = inner;
    }

    if host.is_empty() {
        return Err(Error::InvalidArguments(format!(
            "host {:?} is empty after normalization",
            input
        )));
    }
    Ok(host.to_string())
}

fn strip_scheme(host: &str) -> Option<&str> {
    SCHEMES.iter().find_map(|scheme| {
        let prefix = host.get(..scheme.len())?;
        if prefix.eq_ignore_ascii_case(scheme) {
            host.get(scheme.len()..)
        } else {
            None
        }
    })
}

/// Drops `:digits` unless the colon belongs to a bare IPv6 literal
fn strip_port(host: &str) -> &str {
    let Some((head, port)) = host.rsplit_once(':') else {
        return host;
    };
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return host;
    }
    let bracketed = head.starts_with('[') && head.ends_with(']');
    if head.contains(':') && !bracketed {
        return host;
    }
    head
}
