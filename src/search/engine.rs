//! Core lookup entry point.
//!
//! `run_lookup` is the "lookup as a function" API used by the CLI:
//! it filters the loaded records for one search mode, sorts the
//! matches, and decorates each with its map link.

use log::debug;

use crate::models::{
    AddressRecord, LookupQuery, LookupResult, LookupSummary, NoMatch, ResultRow,
    LOOKUP_RESULT_VERSION,
};
use crate::search::link::map_link;
use crate::search::query::{address_matches, house_number, normalize_street};

/// Execute a lookup against the loaded records.
///
/// Overlapping ranges in the source data may produce more than one
/// match for a single address; all of them are returned.
pub fn run_lookup(records: &[AddressRecord], query: &LookupQuery) -> LookupResult {
    let (matches, display_number, no_match) = match query {
        LookupQuery::Address { street, house_no } => {
            let street = normalize_street(street);
            // A number without digits is treated as no number at all.
            let raw_no = house_no
                .as_deref()
                .filter(|raw| house_number(raw).is_some());
            let number = raw_no.and_then(house_number);

            let matches = filter(records, |r| address_matches(r, &street, number));
            let no_match = if number.is_some() {
                NoMatch::NumberNotOnStreet
            } else {
                NoMatch::StreetNotFound
            };
            (matches, raw_no, no_match)
        }
        LookupQuery::Ids { ids } => (
            filter(records, |r| r.id.map(|id| ids.contains(&id)).unwrap_or(false)),
            None,
            NoMatch::NoIds,
        ),
        LookupQuery::Beat { beat } => (
            filter(records, |r| r.beat_no == *beat),
            None,
            NoMatch::NoBeat,
        ),
        LookupQuery::Suburb { suburb } => (
            filter(records, |r| r.suburb == *suburb),
            None,
            NoMatch::NoSuburb,
        ),
    };

    let mut matches = matches;
    sort_records(&mut matches);

    debug!(
        "{:?} lookup matched {} of {} records",
        query.mode(),
        matches.len(),
        records.len()
    );

    let rows: Vec<ResultRow> = matches
        .into_iter()
        .map(|record| ResultRow {
            map_link: map_link(display_number, record),
            record: record.clone(),
        })
        .collect();

    let summary = LookupSummary {
        total: rows.len(),
        no_match: if rows.is_empty() { Some(no_match) } else { None },
    };

    LookupResult {
        version: LOOKUP_RESULT_VERSION.to_string(),
        query: query.clone(),
        rows,
        summary,
    }
}

fn filter<'a, P>(records: &'a [AddressRecord], predicate: P) -> Vec<&'a AddressRecord>
where
    P: Fn(&AddressRecord) -> bool,
{
    records.iter().filter(|r| predicate(*r)).collect()
}

/// Stable sort by suburb, street name, then range start.
pub fn sort_records(records: &mut [&AddressRecord]) {
    records.sort_by(|a, b| {
        a.suburb
            .cmp(&b.suburb)
            .then_with(|| a.street_name.cmp(&b.street_name))
            .then_with(|| a.street_no_min.cmp(&b.street_no_min))
    });
}
