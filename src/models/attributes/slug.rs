//! Slug derivation for attribute definitions.

use std::collections::HashSet;

use crate::error::ConflictError;

/// How many numeric suffixes to try before giving up.
///
/// Guaranteed to terminate long before this in practice: attribute
/// definitions are finite and each probe strictly increases the suffix.
/// The cap just keeps the loop bounded.
pub const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Lowercases, collapses every non-alphanumeric run to a single hyphen,
/// and trims hyphens off both ends.
pub fn slugify(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut pending_hyphen = false;

    for c in input.chars() {
        if c.is_alphanumeric() {
            if pending_hyphen && !out.is_empty() {
                out.push('-');
            }
            pending_hyphen = false;
            out.extend(c.to_lowercase());
        } else {
            pending_hyphen = true;
        }
    }

    out
}

/// Finds the first free slug: `base`, then `base-1`, `base-2`, ...
///
/// Exhausting the cap is a conflict error rather than an endless loop.
pub fn next_free_slug(base: &str, taken: &HashSet<String>) -> Result<String, ConflictError> {
    if !taken.contains(base) {
        return Ok(base.to_string());
    }

    for n in 1..=MAX_SLUG_ATTEMPTS {
        let candidate = format!("{base}-{n}");
        if !taken.contains(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ConflictError::SlugAttemptsExhausted {
        base: base.to_string(),
    })
}
