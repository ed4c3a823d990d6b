//! CSV export of lookup results.
//!
//! Exports carry the display columns only: internal keys (`id`, the
//! short street alias, the raw `EvenOdd` code) are left out and the
//! derived map link is included.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::ResultRow;

/// Header row written at the top of every export.
pub const EXPORT_HEADERS: &[&str] = &[
    "Street Name",
    "From No",
    "To No",
    "Side",
    "Beat No",
    "Team No",
    "Suburb",
    "Postcode",
    "Map Link",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export file {path}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write CSV export")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV export")]
    Io(#[from] std::io::Error),
}

/// One exported line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(rename = "Street Name")]
    pub street_name: String,
    #[serde(rename = "From No")]
    pub from_no: u32,
    #[serde(rename = "To No")]
    pub to_no: u32,
    #[serde(rename = "Side")]
    pub side: String,
    #[serde(rename = "Beat No")]
    pub beat_no: u32,
    #[serde(rename = "Team No")]
    pub team_no: u32,
    #[serde(rename = "Suburb")]
    pub suburb: String,
    #[serde(rename = "Postcode")]
    pub postcode: String,
    #[serde(rename = "Map Link")]
    pub map_link: String,
}

impl From<&ResultRow> for ExportRow {
    fn from(row: &ResultRow) -> Self {
        let record = &row.record;
        ExportRow {
            street_name: record.street_name.clone(),
            from_no: record.street_no_min,
            to_no: record.street_no_max,
            side: record.parity.label().to_string(),
            beat_no: record.beat_no,
            team_no: record.team_no,
            suburb: record.suburb.clone(),
            postcode: record.postcode.clone(),
            map_link: row.map_link.clone(),
        }
    }
}

/// Write `rows` as CSV with a header row.
///
/// The header is written even when `rows` is empty.
pub fn write_csv<W: Write>(rows: &[ResultRow], writer: W) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    writer.write_record(EXPORT_HEADERS)?;
    for row in rows {
        writer.serialize(ExportRow::from(row))?;
    }
    writer.flush()?;

    Ok(())
}

/// Render `rows` as an in-memory CSV document.
pub fn to_csv_bytes(rows: &[ResultRow]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    write_csv(rows, &mut buf)?;
    Ok(buf)
}

/// Write `rows` to a CSV file at `path`, replacing any existing file.
pub fn export_to_path(rows: &[ResultRow], path: &Path) -> Result<(), ExportError> {
    let file = File::create(path).map_err(|source| ExportError::Create {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(rows, file)?;

    info!("exported {} rows to {}", rows.len(), path.display());
    Ok(())
}

/// Parse a previously exported CSV document.
pub fn read_export<R: Read>(reader: R) -> Result<Vec<ExportRow>, ExportError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut rows = Vec::new();
    for row in reader.deserialize() {
        rows.push(row?);
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressRecord, Parity};
    use crate::search::link::map_link;
    use tempfile::tempdir;

    fn row(street: &str, min: u32, max: u32, parity: Parity, suburb: &str) -> ResultRow {
        let record = AddressRecord {
            street_name: street.to_string(),
            street_name_short: Some("SHORT".to_string()),
            street_no_min: min,
            street_no_max: max,
            parity,
            beat_no: 1011,
            team_no: 3,
            suburb: suburb.to_string(),
            postcode: "2163".to_string(),
            id: Some(42),
        };
        ResultRow {
            map_link: map_link(None, &record),
            record,
        }
    }

    fn sample() -> Vec<ResultRow> {
        vec![
            row("ASHBY AVENUE", 1, 49, Parity::Odd, "LEIGHTONFIELD"),
            row("O'CONNELL STREET, NORTH", 2, 40, Parity::Even, "CARRAMAR"),
        ]
    }

    #[test]
    fn export_writes_display_columns_only() {
        let bytes = to_csv_bytes(&sample()).expect("csv");
        let text = String::from_utf8(bytes).expect("utf-8");
        let mut lines = text.lines();

        assert_eq!(
            lines.next(),
            Some("Street Name,From No,To No,Side,Beat No,Team No,Suburb,Postcode,Map Link")
        );
        assert_eq!(
            lines.next(),
            Some("ASHBY AVENUE,1,49,Odd,1011,3,LEIGHTONFIELD,2163,https://www.google.com/maps/search/?api=1&query=1%20ASHBY%20AVENUE%2C%20LEIGHTONFIELD%2C%20NSW%202163%2C%20Australia")
        );
        assert!(!text.contains("SHORT"));
        assert!(!text.contains("42"));
    }

    #[test]
    fn export_round_trips_rows() {
        let rows = sample();
        let bytes = to_csv_bytes(&rows).expect("csv");
        let parsed = read_export(bytes.as_slice()).expect("parse");

        let expected: Vec<ExportRow> = rows.iter().map(ExportRow::from).collect();
        assert_eq!(parsed, expected);
        assert_eq!(parsed[1].street_name, "O'CONNELL STREET, NORTH");
    }

    #[test]
    fn export_is_byte_stable() {
        let first = to_csv_bytes(&sample()).expect("csv");
        let second = to_csv_bytes(&sample()).expect("csv");
        assert_eq!(first, second);
    }

    #[test]
    fn empty_export_still_has_header() {
        let bytes = to_csv_bytes(&[]).expect("csv");
        assert_eq!(
            String::from_utf8(bytes).expect("utf-8"),
            "Street Name,From No,To No,Side,Beat No,Team No,Suburb,Postcode,Map Link\n"
        );
        assert!(read_export(&b"Street Name,From No,To No,Side,Beat No,Team No,Suburb,Postcode,Map Link\n"[..])
            .expect("parse")
            .is_empty());
    }

    #[test]
    fn export_to_path_writes_file() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("results.csv");

        export_to_path(&sample(), &path).expect("export");

        let file = File::open(&path).expect("open");
        assert_eq!(read_export(file).expect("parse").len(), 2);
    }

    #[test]
    fn export_to_missing_directory_fails_with_path() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("results.csv");

        let err = export_to_path(&sample(), &path).expect_err("missing dir");
        assert!(err.to_string().contains("results.csv"));
    }
}
