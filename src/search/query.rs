//! Query input normalization and record predicates.
//!
//! This module holds the matching rules used by the engine:
//! - Street names compare case-insensitively against either the
//!   canonical name or the short alias.
//! - A house number matches a record only when its parity equals the
//!   record's side of the street and it falls within the inclusive
//!   `[street_no_min, street_no_max]` range.
//! - Raw house numbers such as `"12A"` are reduced to their digits
//!   before matching; inputs without digits mean "no number".

use std::collections::BTreeSet;

use anyhow::{bail, Result};

use crate::models::{AddressRecord, Parity};

/// Normalize a free-text street query for comparison.
pub fn normalize_street(input: &str) -> String {
    input.trim().to_uppercase()
}

/// Whether a record belongs to the (already normalized) street.
pub fn street_matches(record: &AddressRecord, normalized_street: &str) -> bool {
    if record.street_name.to_uppercase() == normalized_street {
        return true;
    }

    record
        .street_name_short
        .as_deref()
        .map(|short| short.to_uppercase() == normalized_street)
        .unwrap_or(false)
}

/// Keep only the ASCII digits of a raw house number.
pub fn strip_non_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Numeric portion of a raw house number.
///
/// Returns `None` when the input has no digits, which callers treat
/// as "no number supplied". Digit strings too large for `u64`
/// saturate to `u64::MAX` so they match no range.
pub fn house_number(raw: &str) -> Option<u64> {
    let digits = strip_non_digits(raw);
    if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<u64>().unwrap_or(u64::MAX))
    }
}

/// Whether `number` lies on the record's side of the street and
/// within its inclusive range.
pub fn number_in_range(record: &AddressRecord, number: u64) -> bool {
    record.parity == Parity::of(number)
        && u64::from(record.street_no_min) <= number
        && number <= u64::from(record.street_no_max)
}

/// Full address predicate: street plus optional number.
///
/// Without a number every record for the street matches (browse).
pub fn address_matches(
    record: &AddressRecord,
    normalized_street: &str,
    number: Option<u64>,
) -> bool {
    if !street_matches(record, normalized_street) {
        return false;
    }

    match number {
        Some(n) => number_in_range(record, n),
        None => true,
    }
}

/// Parse a single id or a comma-separated batch of ids.
///
/// Blank entries are skipped; anything else that is not a
/// non-negative integer is rejected.
pub fn parse_id_list(input: &str) -> Result<BTreeSet<u64>> {
    let mut ids = BTreeSet::new();

    for raw in input.split(',') {
        let token = raw.trim();
        if token.is_empty() {
            continue;
        }
        match token.parse::<u64>() {
            Ok(id) => {
                ids.insert(id);
            }
            Err(_) => bail!("invalid id `{token}`: ids must be whole numbers"),
        }
    }

    if ids.is_empty() {
        bail!("at least one id is required");
    }

    Ok(ids)
}
