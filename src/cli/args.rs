use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::models::LookupQuery;
use crate::scan::ScanOptions;
use crate::search::query::parse_id_list;

/// Top-level CLI entrypoint for `beatlookup`.
#[derive(Parser, Debug)]
#[command(
    name = "beatlookup",
    about = "Find the beat and team covering a street address",
    author = "beatlookup developers",
    subcommand_required = false,
    arg_required_else_help = false
)]
pub struct Cli {
    /// Print the JSON schema version used for `--format=json` output
    /// and exit.
    #[arg(long = "schema-version")]
    pub schema_version: bool,

    /// Path to the address-range dataset (CSV).
    ///
    /// Defaults to `SortCart.csv` in the current directory, or the
    /// `[data] path` entry of a project config when present.
    #[arg(long = "data", global = true, env = "BEATLOOKUP_DATA")]
    pub data: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Look up a street address (street name plus optional number).
    Address(AddressArgs),
    /// Look up records by id (single id or comma-separated list).
    Id(IdArgs),
    /// List every range assigned to a beat.
    Beat(BeatArgs),
    /// List every range in a suburb.
    Suburb(SuburbArgs),
    /// Print the distinct street names in the dataset.
    Streets,
    /// Print the distinct suburbs in the dataset.
    Suburbs,
    /// Recognize an address in a photo and look it up.
    Scan(ScanArgs),
}

/// CLI representation of output format.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Text,
    Table,
    Json,
    Csv,
}

/// Output flags shared by every lookup subcommand.
#[derive(Args, Debug, Clone)]
pub struct OutputArgs {
    /// Output format (text, table, json, or csv).
    #[arg(long = "format", value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Also write the results to this CSV file.
    ///
    /// The file always uses the export column layout, whatever
    /// `--format` is used for stdout.
    #[arg(long = "export")]
    pub export: Option<PathBuf>,
}

/// Arguments specific to the `address` subcommand.
#[derive(Args, Debug)]
pub struct AddressArgs {
    /// Street name, full or abbreviated (e.g. "Ashby Avenue", "Ashby Av").
    pub street: String,

    /// House number; letters are ignored (e.g. "12A" is looked up as 12).
    ///
    /// When omitted every range on the street is listed.
    pub number: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments specific to the `id` subcommand.
#[derive(Args, Debug)]
pub struct IdArgs {
    /// One id, or several separated by commas (e.g. "5,9,12").
    pub ids: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments specific to the `beat` subcommand.
#[derive(Args, Debug)]
pub struct BeatArgs {
    /// Beat number.
    pub beat: u32,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments specific to the `suburb` subcommand.
#[derive(Args, Debug)]
pub struct SuburbArgs {
    /// Suburb, exactly as listed by `beatlookup suburbs`.
    pub suburb: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Arguments specific to the `scan` subcommand.
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Photo of an address label or envelope.
    pub image: PathBuf,

    /// Text recognizer executable (tesseract-compatible).
    #[arg(long = "recognizer")]
    pub recognizer: Option<String>,

    /// Recognizer language code (e.g. "eng").
    #[arg(long = "language")]
    pub language: Option<String>,

    /// Keep the recognizer's fragment order instead of reading the
    /// image top to bottom, left to right.
    #[arg(long = "keep-order")]
    pub keep_order: bool,

    /// Number of characters before the street name searched for a
    /// house number.
    #[arg(long = "window")]
    pub window: Option<usize>,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Build an address `LookupQuery` from CLI `AddressArgs`.
pub fn address_query_from_args(args: &AddressArgs) -> Result<LookupQuery> {
    let street = args.street.trim();
    if street.is_empty() {
        bail!("street name must not be empty");
    }

    Ok(LookupQuery::Address {
        street: street.to_string(),
        house_no: args
            .number
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
    })
}

/// Build an id `LookupQuery` from CLI `IdArgs`.
pub fn id_query_from_args(args: &IdArgs) -> Result<LookupQuery> {
    Ok(LookupQuery::Ids {
        ids: parse_id_list(&args.ids)?,
    })
}

/// Build a beat `LookupQuery` from CLI `BeatArgs`.
pub fn beat_query_from_args(args: &BeatArgs) -> LookupQuery {
    LookupQuery::Beat { beat: args.beat }
}

/// Build a suburb `LookupQuery`, checking the value against the
/// dataset's suburb list.
pub fn suburb_query_from_args(args: &SuburbArgs, suburbs: &BTreeSet<String>) -> Result<LookupQuery> {
    if !suburbs.contains(&args.suburb) {
        bail!(
            "unknown suburb `{}`; run `beatlookup suburbs` to list valid values",
            args.suburb
        );
    }

    Ok(LookupQuery::Suburb {
        suburb: args.suburb.clone(),
    })
}

/// Build `ScanOptions` from CLI `ScanArgs`.
pub fn scan_options_from_args(args: &ScanArgs) -> ScanOptions {
    let defaults = ScanOptions::default();
    ScanOptions {
        order_by_position: !args.keep_order,
        window: args.window.unwrap_or(defaults.window),
    }
}
