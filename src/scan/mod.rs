//! Best-effort address pre-fill from a photo.
//!
//! An external text recognizer turns an image into positioned text
//! fragments. The fragments are assembled into one uppercase string,
//! the longest known street name found in it becomes the street, and
//! a short window of text before that street is searched for a house
//! number. Recognition failures never propagate: they leave the
//! pre-fill blank so the operator can type the address instead.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use log::{debug, warn};
use regex::Regex;
use serde::Serialize;
use thiserror::Error;

use crate::models::Dataset;

mod tesseract;

pub use tesseract::{TesseractRecognizer, DEFAULT_COMMAND as DEFAULT_RECOGNIZER_COMMAND};

/// Default number of characters searched before a street name.
pub const DEFAULT_NUMBER_WINDOW: usize = 20;

/// Fragments whose tops differ by at most this many pixels are
/// treated as one line of text.
const ROW_TOLERANCE_PX: u32 = 12;

/// A piece of recognized text and its position on the image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextFragment {
    pub text: String,
    pub left: u32,
    pub top: u32,
}

impl TextFragment {
    pub fn new(text: impl Into<String>, left: u32, top: u32) -> Self {
        TextFragment {
            text: text.into(),
            left,
            top,
        }
    }
}

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error("image not found: {0}")]
    ImageMissing(PathBuf),
    #[error("text recognizer `{command}` is unavailable")]
    Unavailable {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("text recognizer exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
    #[error("could not parse text recognizer output")]
    Parse(#[from] csv::Error),
}

/// External text-recognition service.
pub trait TextRecognizer {
    /// Recognize text fragments in the image at `image`.
    fn recognize(&self, image: &Path) -> Result<Vec<TextFragment>, RecognitionError>;
}

/// Tuning for the pre-fill heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Order fragments top to bottom, then left to right, before
    /// joining them. When false the recognizer's order is kept.
    pub order_by_position: bool,
    /// Characters before the street name searched for a number.
    pub window: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions {
            order_by_position: true,
            window: DEFAULT_NUMBER_WINDOW,
        }
    }
}

/// Result of a scan: fields to pre-fill an address lookup with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressPrefill {
    pub street: Option<String>,
    pub house_no: Option<String>,
    /// Full assembled text, kept for display.
    pub recognized_text: String,
}

/// Join fragments into one uppercase string.
pub fn assemble_text(fragments: &[TextFragment], order_by_position: bool) -> String {
    let mut ordered: Vec<&TextFragment> = fragments.iter().collect();

    if order_by_position {
        ordered.sort_by_key(|f| f.top);

        let mut rows: Vec<Vec<&TextFragment>> = Vec::new();
        for fragment in ordered {
            match rows.last_mut() {
                Some(row) if fragment.top - row[0].top <= ROW_TOLERANCE_PX => row.push(fragment),
                _ => rows.push(vec![fragment]),
            }
        }

        ordered = rows
            .into_iter()
            .flat_map(|mut row| {
                row.sort_by_key(|f| f.left);
                row
            })
            .collect();
    }

    ordered
        .iter()
        .map(|f| f.text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Find the longest known street name occurring in `text`.
///
/// Returns the name and the byte offset of its first occurrence.
/// Longer names win over shorter ones they contain (e.g. "KING
/// STREET NORTH" over "KING STREET"); equal lengths resolve
/// alphabetically.
pub fn find_street<'a, I>(text: &str, known_names: I) -> Option<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut candidates: Vec<String> = known_names
        .into_iter()
        .map(|name| name.trim().to_uppercase())
        .filter(|name| !name.is_empty())
        .collect();
    candidates.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    candidates
        .into_iter()
        .find_map(|name| text.find(&name).map(|start| (name, start)))
}

fn number_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // 1/2: unit and street number of an `N/M` form; 3: a unit
        // number with no street number; 4: a bare number.
        Regex::new(concat!(
            r"(?:\b(?:UNIT|APT|FLAT|SHOP|U)\s*)?([0-9]+[A-Z]?)\s*/\s*([0-9]+[A-Z]?)",
            r"|\b(?:UNIT|APT|FLAT|SHOP|U)\s*([0-9]+[A-Z]?)\b",
            r"|([0-9]+[A-Z]?)\b",
        ))
        .expect("house number pattern is valid")
    })
}

/// Search the `window` characters before `street_start` for a house
/// number.
///
/// The token closest to the street wins. For `N/M` forms (a unit
/// number and a street number) the post-slash number is returned;
/// a unit number on its own (`SHOP 2`) is never a house number.
pub fn find_house_number(text: &str, street_start: usize, window: usize) -> Option<String> {
    let before = text.get(..street_start)?;
    let window_start = before
        .char_indices()
        .rev()
        .take(window)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(street_start);
    let haystack = &before[window_start..];

    number_pattern()
        .captures_iter(haystack)
        .filter_map(|captures| captures.get(2).or_else(|| captures.get(4)))
        .last()
        .map(|m| m.as_str().to_string())
}

/// Run the recognizer on `image` and derive an address pre-fill.
pub fn prefill_from_image(
    recognizer: &dyn TextRecognizer,
    image: &Path,
    dataset: &Dataset,
    options: ScanOptions,
) -> AddressPrefill {
    let fragments = match recognizer.recognize(image) {
        Ok(fragments) => fragments,
        Err(err) => {
            warn!("text recognition failed for {}: {err}", image.display());
            return AddressPrefill::default();
        }
    };

    prefill_from_fragments(&fragments, dataset, options)
}

/// Derive an address pre-fill from already recognized fragments.
pub fn prefill_from_fragments(
    fragments: &[TextFragment],
    dataset: &Dataset,
    options: ScanOptions,
) -> AddressPrefill {
    let text = assemble_text(fragments, options.order_by_position);
    debug!("recognized text: {text}");

    let Some((street, start)) = find_street(&text, dataset.known_street_names()) else {
        return AddressPrefill {
            recognized_text: text,
            ..AddressPrefill::default()
        };
    };

    let house_no = find_house_number(&text, start, options.window);

    AddressPrefill {
        street: Some(street),
        house_no,
        recognized_text: text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AddressRecord, Parity};

    struct FixedRecognizer(Vec<TextFragment>);

    impl TextRecognizer for FixedRecognizer {
        fn recognize(&self, _image: &Path) -> Result<Vec<TextFragment>, RecognitionError> {
            Ok(self.0.clone())
        }
    }

    struct BrokenRecognizer;

    impl TextRecognizer for BrokenRecognizer {
        fn recognize(&self, _image: &Path) -> Result<Vec<TextFragment>, RecognitionError> {
            Err(RecognitionError::Failed {
                status: "exit status: 1".to_string(),
                stderr: "boom".to_string(),
            })
        }
    }

    fn dataset() -> Dataset {
        let record = |street: &str, short: Option<&str>| AddressRecord {
            street_name: street.to_string(),
            street_name_short: short.map(str::to_string),
            street_no_min: 1,
            street_no_max: 99,
            parity: Parity::Odd,
            beat_no: 1011,
            team_no: 3,
            suburb: "LEIGHTONFIELD".to_string(),
            postcode: "2163".to_string(),
            id: None,
        };
        Dataset::from_records(vec![
            record("ASHBY AVENUE", Some("ASHBY AV")),
            record("KING STREET", Some("KING ST")),
            record("KING STREET NORTH", None),
        ])
    }

    #[test]
    fn assemble_orders_rows_then_columns() {
        let fragments = vec![
            TextFragment::new("avenue", 220, 52),
            TextFragment::new("leightonfield", 10, 100),
            TextFragment::new("15", 10, 50),
            TextFragment::new("ashby", 80, 48),
        ];

        assert_eq!(
            assemble_text(&fragments, true),
            "15 ASHBY AVENUE LEIGHTONFIELD"
        );
        assert_eq!(
            assemble_text(&fragments, false),
            "AVENUE LEIGHTONFIELD 15 ASHBY"
        );
    }

    #[test]
    fn assemble_skips_blank_fragments() {
        let fragments = vec![
            TextFragment::new("  ", 0, 0),
            TextFragment::new("king", 10, 0),
            TextFragment::new("", 20, 0),
            TextFragment::new("st", 30, 0),
        ];
        assert_eq!(assemble_text(&fragments, true), "KING ST");
    }

    #[test]
    fn longest_street_wins_over_contained_names() {
        let data = dataset();
        let text = "MR SMITH 7 KING STREET NORTH VILLAWOOD";

        let (street, start) = find_street(text, data.known_street_names()).expect("street");
        assert_eq!(street, "KING STREET NORTH");
        assert_eq!(start, 11);
    }

    #[test]
    fn short_alias_is_recognized_when_full_name_is_absent() {
        let data = dataset();
        let (street, _) = find_street("22 ASHBY AV", data.known_street_names()).expect("street");
        assert_eq!(street, "ASHBY AV");
    }

    #[test]
    fn no_known_street_yields_none() {
        let data = dataset();
        assert!(find_street("HELLO WORLD", data.known_street_names()).is_none());
    }

    #[test]
    fn house_number_prefers_token_closest_to_street() {
        let text = "PO BOX 99 15 ASHBY AVENUE";
        let start = text.find("ASHBY").expect("street");
        assert_eq!(find_house_number(text, start, 20).as_deref(), Some("15"));
    }

    #[test]
    fn house_number_prefers_post_slash_number() {
        let text = "UNIT 3/15 ASHBY AVENUE";
        let start = text.find("ASHBY").expect("street");
        assert_eq!(find_house_number(text, start, 20).as_deref(), Some("15"));

        let text = "U4 / 27A KING STREET";
        let start = text.find("KING").expect("street");
        assert_eq!(find_house_number(text, start, 20).as_deref(), Some("27A"));
    }

    #[test]
    fn standalone_unit_number_is_not_a_house_number() {
        let text = "SHOP 2 ASHBY AVENUE";
        let start = text.find("ASHBY").expect("street");
        assert_eq!(find_house_number(text, start, 20), None);

        let text = "SHOP 2, 15 ASHBY AVENUE";
        let start = text.find("ASHBY").expect("street");
        assert_eq!(find_house_number(text, start, 20).as_deref(), Some("15"));
    }

    #[test]
    fn house_number_ignores_non_ascii_digits() {
        let text = "\u{0661}\u{0665} ASHBY AVENUE";
        let start = text.find("ASHBY").expect("street");
        assert_eq!(find_house_number(text, start, 20), None);
    }

    #[test]
    fn house_number_keeps_letter_suffix() {
        let text = "12A ASHBY AVENUE";
        assert_eq!(find_house_number(text, 4, 20).as_deref(), Some("12A"));
    }

    #[test]
    fn house_number_outside_window_is_ignored() {
        let text = "15 SOME VERY LONG NOISE TEXT HERE ASHBY AVENUE";
        let start = text.find("ASHBY").expect("street");
        assert_eq!(find_house_number(text, start, 20), None);
        assert_eq!(find_house_number(text, start, 40).as_deref(), Some("15"));
    }

    #[test]
    fn prefill_combines_street_and_number() {
        let recognizer = FixedRecognizer(vec![
            TextFragment::new("Unit 3/15", 10, 40),
            TextFragment::new("Ashby Avenue", 120, 42),
            TextFragment::new("Leightonfield NSW 2163", 10, 90),
        ]);

        let prefill = prefill_from_image(
            &recognizer,
            Path::new("photo.jpg"),
            &dataset(),
            ScanOptions::default(),
        );

        assert_eq!(prefill.street.as_deref(), Some("ASHBY AVENUE"));
        assert_eq!(prefill.house_no.as_deref(), Some("15"));
        assert_eq!(
            prefill.recognized_text,
            "UNIT 3/15 ASHBY AVENUE LEIGHTONFIELD NSW 2163"
        );
    }

    #[test]
    fn prefill_without_street_keeps_text_only() {
        let recognizer = FixedRecognizer(vec![TextFragment::new("42 Wallaby Way", 0, 0)]);
        let prefill = prefill_from_image(
            &recognizer,
            Path::new("photo.jpg"),
            &dataset(),
            ScanOptions::default(),
        );

        assert_eq!(prefill.street, None);
        assert_eq!(prefill.house_no, None);
        assert_eq!(prefill.recognized_text, "42 WALLABY WAY");
    }

    #[test]
    fn recognizer_failure_degrades_to_blank_prefill() {
        let prefill = prefill_from_image(
            &BrokenRecognizer,
            Path::new("photo.jpg"),
            &dataset(),
            ScanOptions::default(),
        );
        assert_eq!(prefill, AddressPrefill::default());
    }
}
