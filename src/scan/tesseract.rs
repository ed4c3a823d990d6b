//! Text recognizer backed by the `tesseract` command-line tool.
//!
//! Runs `tesseract <image> stdout [-l <lang>] tsv` and reads the
//! word-level rows of its tab-separated output.

use std::path::Path;
use std::process::Command;

use log::debug;
use serde::Deserialize;

use super::{RecognitionError, TextFragment, TextRecognizer};

/// Default recognizer executable.
pub const DEFAULT_COMMAND: &str = "tesseract";

#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    command: String,
    language: Option<String>,
}

impl TesseractRecognizer {
    pub fn new(command: impl Into<String>, language: Option<String>) -> Self {
        TesseractRecognizer {
            command: command.into(),
            language,
        }
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, image: &Path) -> Result<Vec<TextFragment>, RecognitionError> {
        if !image.is_file() {
            return Err(RecognitionError::ImageMissing(image.to_path_buf()));
        }

        let mut cmd = Command::new(&self.command);
        cmd.arg(image).arg("stdout");
        if let Some(lang) = &self.language {
            cmd.arg("-l").arg(lang);
        }
        cmd.arg("tsv");

        debug!("running {:?}", cmd);
        let output = cmd.output().map_err(|source| RecognitionError::Unavailable {
            command: self.command.clone(),
            source,
        })?;

        if !output.status.success() {
            return Err(RecognitionError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        parse_tsv(&output.stdout)
    }
}

/// One row of tesseract's TSV output. Only the columns used for
/// fragment assembly are kept.
#[derive(Debug, Deserialize)]
struct TsvRow {
    left: u32,
    top: u32,
    conf: f32,
    #[serde(default)]
    text: Option<String>,
}

/// Parse tesseract TSV output into fragments.
///
/// Structural rows (pages, blocks, lines) carry a confidence of `-1`
/// and no text; they are dropped along with blank words.
pub(crate) fn parse_tsv(bytes: &[u8]) -> Result<Vec<TextFragment>, RecognitionError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quoting(false)
        .flexible(true)
        .from_reader(bytes);

    let mut fragments = Vec::new();
    for row in reader.deserialize::<TsvRow>() {
        let row = row?;
        if row.conf < 0.0 {
            continue;
        }
        let Some(text) = row.text.filter(|t| !t.trim().is_empty()) else {
            continue;
        };
        fragments.push(TextFragment::new(text, row.left, row.top));
    }

    Ok(fragments)
}
