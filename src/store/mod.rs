//! Record store: loads the address-range table and caches it.
//!
//! The table is read once per `RecordStore` and kept for the lifetime
//! of the store. `invalidate` and `reload_if_stale` are the only points
//! where a cached dataset is dropped.

use std::cell::OnceCell;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use log::debug;
use serde::Deserialize;
use thiserror::Error;

use crate::models::{AddressRecord, Dataset, Parity};

/// Default dataset file name, resolved against the working directory.
pub const DEFAULT_DATA_FILE: &str = "SortCart.csv";

/// Columns every dataset must carry.
pub const REQUIRED_COLUMNS: &[&str] = &[
    "StreetName",
    "StreetNoMin",
    "StreetNoMax",
    "EvenOdd",
    "BeatNo",
    "TeamNo",
    "Suburb",
    "Postcode",
];

/// Fatal errors raised while loading the dataset.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to read data file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed data file {path}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("data file {path} is missing required column(s): {}", columns.join(", "))]
    MissingColumns { path: PathBuf, columns: Vec<String> },
    #[error("data file {path}, line {line}: StreetNoMin {min} is greater than StreetNoMax {max}")]
    InvalidRange {
        path: PathBuf,
        line: u64,
        min: u32,
        max: u32,
    },
    #[error("data file {path}, line {line}: EvenOdd must be 1 (odd) or 2 (even), got {code}")]
    InvalidParity { path: PathBuf, line: u64, code: u8 },
}

/// Raw CSV row as it appears in the source file.
#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "StreetName")]
    street_name: String,
    #[serde(rename = "StreetNameShort", default)]
    street_name_short: Option<String>,
    #[serde(rename = "StreetNoMin")]
    street_no_min: u32,
    #[serde(rename = "StreetNoMax")]
    street_no_max: u32,
    #[serde(rename = "EvenOdd")]
    even_odd: u8,
    #[serde(rename = "BeatNo")]
    beat_no: u32,
    #[serde(rename = "TeamNo")]
    team_no: u32,
    #[serde(rename = "Suburb")]
    suburb: String,
    #[serde(rename = "Postcode")]
    postcode: String,
    #[serde(rename = "id", default)]
    id: Option<u64>,
}

/// Load and validate the dataset at `path`.
pub fn load_dataset(path: &Path) -> Result<Dataset, DataLoadError> {
    let file = File::open(path).map_err(|source| DataLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_dataset_from_reader(file, path)
}

/// Load and validate a dataset from any reader. `origin` is used only
/// for error messages.
pub fn load_dataset_from_reader<R: Read>(
    reader: R,
    origin: &Path,
) -> Result<Dataset, DataLoadError> {
    let csv_error = |source: csv::Error| DataLoadError::Csv {
        path: origin.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .map(|column| column.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(DataLoadError::MissingColumns {
            path: origin.to_path_buf(),
            columns: missing,
        });
    }

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        // Physical line where the row starts; quoted fields may span lines.
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRecord = row.deserialize(Some(&headers)).map_err(csv_error)?;
        records.push(validate(raw, origin, line)?);
    }

    debug!("loaded {} records from {}", records.len(), origin.display());

    Ok(Dataset::from_records(records))
}

fn validate(raw: RawRecord, origin: &Path, line: u64) -> Result<AddressRecord, DataLoadError> {
    if raw.street_no_min > raw.street_no_max {
        return Err(DataLoadError::InvalidRange {
            path: origin.to_path_buf(),
            line,
            min: raw.street_no_min,
            max: raw.street_no_max,
        });
    }

    let parity = Parity::from_code(raw.even_odd).ok_or_else(|| DataLoadError::InvalidParity {
        path: origin.to_path_buf(),
        line,
        code: raw.even_odd,
    })?;

    Ok(AddressRecord {
        street_name: raw.street_name,
        street_name_short: raw.street_name_short.filter(|s| !s.is_empty()),
        street_no_min: raw.street_no_min,
        street_no_max: raw.street_no_max,
        parity,
        beat_no: raw.beat_no,
        team_no: raw.team_no,
        suburb: raw.suburb,
        postcode: raw.postcode,
        id: raw.id,
    })
}

struct CachedDataset {
    dataset: Dataset,
    modified: Option<SystemTime>,
}

/// Lazily loaded, explicitly invalidated view of the dataset file.
pub struct RecordStore {
    path: PathBuf,
    cache: OnceCell<CachedDataset>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        RecordStore {
            path: path.into(),
            cache: OnceCell::new(),
        }
    }

    /// Return the dataset, reading the file on first use only.
    pub fn load(&self) -> Result<&Dataset, DataLoadError> {
        if let Some(cached) = self.cache.get() {
            return Ok(&cached.dataset);
        }

        let modified = file_modified(&self.path);
        let dataset = load_dataset(&self.path)?;
        let cached = self.cache.get_or_init(|| CachedDataset { dataset, modified });
        Ok(&cached.dataset)
    }

    pub fn is_loaded(&self) -> bool {
        self.cache.get().is_some()
    }

    /// Drop the cached dataset; the next `load` re-reads the file.
    pub fn invalidate(&mut self) {
        if self.cache.take().is_some() {
            debug!("invalidated cached dataset for {}", self.path.display());
        }
    }

    /// Whether the file changed since the cached copy was read.
    ///
    /// An unloaded store is never stale.
    pub fn is_stale(&self) -> bool {
        match self.cache.get() {
            Some(cached) => file_modified(&self.path) != cached.modified,
            None => false,
        }
    }

    /// Invalidate the cache when the file changed on disk. Returns
    /// whether the cache was dropped.
    pub fn reload_if_stale(&mut self) -> bool {
        if self.is_stale() {
            self.invalidate();
            true
        } else {
            false
        }
    }
}

fn file_modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}
