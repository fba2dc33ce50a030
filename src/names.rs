// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Derived resource naming.
//!
//! Objects of the scheduled-actor bundle are named `<prefix>-<name>-<suffix>`
//! after the `IdlingResource` they belong to. Kubernetes resource names are
//! capped at 63 characters (RFC 1123 label), so overlong names have their
//! middle segment truncated and disambiguated with a short base64 digest of
//! the full name. The mangling is deterministic: the same input always
//! produces the same output.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Maximum allowed length for a Kubernetes resource name
pub const RESOURCE_NAME_LENGTH_LIMIT: usize = 63;

/// Number of base64 characters kept when disambiguating a truncated name
const DIGEST_LENGTH: usize = 6;

/// Create a valid DNS name from a prefix, name and suffix.
///
/// When `<prefix>-<name>-<suffix>` fits in 63 characters it is returned
/// unchanged. Otherwise the name segment is truncated and followed by the
/// first six base64 characters of the full name, keeping the result at
/// exactly 63 characters.
#[must_use]
pub fn to_dns_name(prefix: &str, name: &str, suffix: &str) -> String {
    let suffix = if suffix.is_empty() {
        String::new()
    } else {
        format!("-{suffix}")
    };

    let full = format!("{prefix}-{name}{suffix}");
    if full.len() <= RESOURCE_NAME_LENGTH_LIMIT {
        return full;
    }

    let reserved = format!("{prefix}-{suffix}").len();
    let left = RESOURCE_NAME_LENGTH_LIMIT - reserved;
    let digest = base64_prefix(name, DIGEST_LENGTH);
    format!("{prefix}-{}-{}{suffix}", &name[..left - DIGEST_LENGTH - 1], digest).to_lowercase()
}

/// Return the first `length` characters of the base64 encoding of `src`,
/// or the full encoding when `length` is 0.
#[must_use]
pub fn base64_prefix(src: &str, length: usize) -> String {
    let encoded = STANDARD.encode(src.as_bytes());
    if length == 0 {
        return encoded;
    }
    encoded[..length.min(encoded.len())].to_string()
}

#[cfg(test)]
#[path = "names_tests.rs"]
mod names_tests;
