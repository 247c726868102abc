//! Address validation

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

/// local@domain.tld with no whitespace and a single `@`
static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
        .expect("email pattern is valid")
});

/// Longest address accepted (RFC 5321 path limit)
const MAX_ADDRESS_LEN: usize = 254;

/// Trim, lowercase and validate an address
pub fn normalize_address(raw: &str) -> Result<String> {
    let address = raw.trim().to_lowercase();

    if address.is_empty() || address.len() > MAX_ADDRESS_LEN || !EMAIL_RE.is_match(&address) {
        return Err(Error::validation(raw.trim()));
    }

    Ok(address)
}
