//! Input validation helpers
//!
//! Pure functions, no shared state: callers may use them from anywhere.

use crate::error::{Error, Result};
use std::net::Ipv4Addr;

/// Parse a dotted-quad IPv4 address
///
/// Surrounding whitespace is ignored. Anything other than four decimal
/// octets (hostnames, IPv6, partial addresses) is rejected.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr> {
    let text = text.trim();
    text.parse::<Ipv4Addr>()
        .map_err(|_| Error::validation(format!("does not look like an IPv4: {:?}", text)))
}

/// Check that `domain` is a syntactically valid DNS name
///
/// Accepts an optional trailing dot (`example.org.`). Each label must be
/// 1 to 63 ASCII letters, digits or hyphens, and must not start or end with
/// a hyphen; the whole name is capped at 253 characters.
pub fn validate_domain_name(domain: &str) -> Result<()> {
    let name = domain.strip_suffix('.').unwrap_or(domain);

    if name.is_empty() {
        return Err(Error::config("domain is empty"));
    }
    if name.len() > 253 {
        return Err(Error::config(format!(
            "domain {:?} is {} characters long, limit is 253",
            domain,
            name.len()
        )));
    }

    for label in name.split('.') {
        let problem = if label.is_empty() {
            "is empty"
        } else if label.len() > 63 {
            "is longer than 63 characters"
        } else if !label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
            "may only hold letters, digits and hyphens"
        } else if label.starts_with('-') || label.ends_with('-') {
            "starts or ends with a hyphen"
        } else {
            continue;
        };

        return Err(Error::config(format!(
            "domain {:?}: label {:?} {}",
            domain, label, problem
        )));
    }

    Ok(())
}
