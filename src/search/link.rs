//! Map-link construction for result rows.

use crate::models::AddressRecord;

const MAP_SEARCH_URL: &str = "https://www.google.com/maps/search/?api=1&query=";

/// Human-readable postal address for a record at `number`.
pub fn postal_address(number: &str, record: &AddressRecord) -> String {
    format!(
        "{} {}, {}, NSW {}, Australia",
        number, record.street_name, record.suburb, record.postcode
    )
}

/// Google Maps search URL for a record.
///
/// `house_no` is the raw number the operator typed, when there was
/// one; otherwise the start of the record's range is used.
pub fn map_link(house_no: Option<&str>, record: &AddressRecord) -> String {
    let number = match house_no {
        Some(raw) => raw.trim().to_string(),
        None => record.street_no_min.to_string(),
    };

    let address = postal_address(&number, record);
    format!("{MAP_SEARCH_URL}{}", urlencoding::encode(&address))
}
