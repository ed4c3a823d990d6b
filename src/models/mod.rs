//! Shared data models for records, queries, and lookup results.
//!
//! These types form the stable JSON API surface used by the CLI's
//! `--format json` output.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Schema version for `LookupResult` JSON payloads.
///
/// This version follows semver semantics (MAJOR.MINOR.PATCH):
/// - MAJOR: Breaking changes to required fields or field semantics.
/// - MINOR: Backward-compatible additions (new optional fields).
/// - PATCH: Documentation or internal changes only.
pub const LOOKUP_RESULT_VERSION: &str = "1.0.0";

/// Side of the street a numbering range lies on.
///
/// Odd and even house numbers sit on opposite sides of a street and
/// are tracked as distinct ranges in the source data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Parity {
    Odd,
    Even,
}

impl Parity {
    /// Parity of a street number.
    pub fn of(number: u64) -> Parity {
        if number % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    /// Decode the `EvenOdd` column value (`1` = odd, `2` = even).
    pub fn from_code(code: u8) -> Option<Parity> {
        match code {
            1 => Some(Parity::Odd),
            2 => Some(Parity::Even),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Parity::Odd => "Odd",
            Parity::Even => "Even",
        }
    }
}

/// One row of the reference table: a contiguous range of house
/// numbers on one side of one street, assigned to a beat and team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressRecord {
    /// Canonical street name (e.g. "ASHBY AVENUE").
    pub street_name: String,
    /// Optional abbreviated alias (e.g. "ASHBY AV").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_name_short: Option<String>,
    /// Lowest house number in the range (inclusive).
    pub street_no_min: u32,
    /// Highest house number in the range (inclusive).
    pub street_no_max: u32,
    pub parity: Parity,
    pub beat_no: u32,
    pub team_no: u32,
    pub suburb: String,
    pub postcode: String,
    /// Unique record identifier, when the dataset carries one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

/// The loaded table plus the lookup lists derived from it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Records in file order.
    pub records: Vec<AddressRecord>,
    /// Distinct canonical street names, sorted.
    pub street_names: BTreeSet<String>,
    /// Distinct suburbs, sorted.
    pub suburbs: BTreeSet<String>,
}

impl Dataset {
    /// Build a dataset from records, deriving the distinct lists.
    pub fn from_records(records: Vec<AddressRecord>) -> Self {
        let street_names = records.iter().map(|r| r.street_name.clone()).collect();
        let suburbs = records.iter().map(|r| r.suburb.clone()).collect();

        Dataset {
            records,
            street_names,
            suburbs,
        }
    }

    /// Street names a free-text scan may recognize: canonical names
    /// plus any short aliases.
    pub fn known_street_names(&self) -> BTreeSet<&str> {
        let mut names: BTreeSet<&str> = self.street_names.iter().map(String::as_str).collect();
        names.extend(
            self.records
                .iter()
                .filter_map(|r| r.street_name_short.as_deref())
                .filter(|s| !s.is_empty()),
        );
        names
    }
}

/// High-level search mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchMode {
    Address,
    Id,
    Beat,
    Suburb,
}

/// A lookup request; one variant per search mode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum LookupQuery {
    /// Street name (full or short form) with an optional raw house
    /// number such as `"12A"`.
    Address {
        street: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        house_no: Option<String>,
    },
    #[serde(rename = "id")]
    Ids { ids: BTreeSet<u64> },
    Beat { beat: u32 },
    Suburb { suburb: String },
}

impl LookupQuery {
    pub fn mode(&self) -> SearchMode {
        match self {
            LookupQuery::Address { .. } => SearchMode::Address,
            LookupQuery::Ids { .. } => SearchMode::Id,
            LookupQuery::Beat { .. } => SearchMode::Beat,
            LookupQuery::Suburb { .. } => SearchMode::Suburb,
        }
    }
}

/// A record decorated with its derived map link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(flatten)]
    pub record: AddressRecord,
    /// Google Maps search URL for the record's address.
    pub map_link: String,
}

/// Why a lookup returned no rows.
///
/// An empty result is an expected outcome, not an error; this only
/// selects the message shown to the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoMatch {
    /// Browse lookup found no records for the street at all.
    StreetNotFound,
    /// The street may exist but no range covers this number on the
    /// number's side of the street.
    NumberNotOnStreet,
    NoIds,
    NoBeat,
    NoSuburb,
}

impl fmt::Display for NoMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            NoMatch::StreetNotFound => "No records found for this street.",
            NoMatch::NumberNotOnStreet => "No entry found for this number on this street.",
            NoMatch::NoIds => "No records found for the given ID(s).",
            NoMatch::NoBeat => "No records found for this beat.",
            NoMatch::NoSuburb => "No records found for this suburb.",
        };
        f.write_str(msg)
    }
}

/// Summary information for a lookup result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupSummary {
    pub total: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_match: Option<NoMatch>,
}

/// Top-level result for a lookup invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupResult {
    /// Schema version for this result payload.
    pub version: String,
    pub query: LookupQuery,
    /// Matching rows, sorted by suburb, street name, then range start.
    pub rows: Vec<ResultRow>,
    pub summary: LookupSummary,
}
