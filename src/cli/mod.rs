use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use serde::Serialize;

use crate::export;
use crate::models::{LookupQuery, LookupResult, LOOKUP_RESULT_VERSION};
use crate::scan::{self, AddressPrefill, TesseractRecognizer, DEFAULT_RECOGNIZER_COMMAND};
use crate::search::engine;
use crate::store::{RecordStore, DEFAULT_DATA_FILE};

mod args;
mod config;
mod format;

pub use args::{
    AddressArgs, BeatArgs, Cli, Commands, IdArgs, OutputArgs, OutputFormat, ScanArgs, SuburbArgs,
};

use config::{
    apply_data_config_default, apply_output_config_defaults, apply_scan_config_defaults,
    load_cli_config,
};

/// JSON payload for `scan --format json`.
#[derive(Serialize)]
struct ScanReport<'a> {
    version: &'static str,
    prefill: &'a AddressPrefill,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<&'a LookupResult>,
}

/// Entry point for the CLI binary.
pub fn run() -> Result<()> {
    let mut cli = Cli::parse();

    if cli.schema_version {
        println!("Lookup result JSON schema version: {}", LOOKUP_RESULT_VERSION);
        return Ok(());
    }

    let cli_config = load_cli_config()?;
    if let Some(ref config) = cli_config {
        apply_data_config_default(config, &mut cli);
    }

    let data_path = cli
        .data
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_FILE));
    let store = RecordStore::new(data_path);

    match cli.command {
        Some(Commands::Address(mut address_args)) => {
            if let Some(ref config) = cli_config {
                apply_output_config_defaults(config, &mut address_args.output);
            }

            let query = args::address_query_from_args(&address_args)?;
            lookup_and_emit(&store, &query, &address_args.output)
        }
        Some(Commands::Id(mut id_args)) => {
            if let Some(ref config) = cli_config {
                apply_output_config_defaults(config, &mut id_args.output);
            }

            let query = args::id_query_from_args(&id_args)?;
            lookup_and_emit(&store, &query, &id_args.output)
        }
        Some(Commands::Beat(mut beat_args)) => {
            if let Some(ref config) = cli_config {
                apply_output_config_defaults(config, &mut beat_args.output);
            }

            let query = args::beat_query_from_args(&beat_args);
            lookup_and_emit(&store, &query, &beat_args.output)
        }
        Some(Commands::Suburb(mut suburb_args)) => {
            if let Some(ref config) = cli_config {
                apply_output_config_defaults(config, &mut suburb_args.output);
            }

            let dataset = store.load()?;
            let query = args::suburb_query_from_args(&suburb_args, &dataset.suburbs)?;
            lookup_and_emit(&store, &query, &suburb_args.output)
        }
        Some(Commands::Streets) => format::print_list(&store.load()?.street_names),
        Some(Commands::Suburbs) => format::print_list(&store.load()?.suburbs),
        Some(Commands::Scan(mut scan_args)) => {
            if let Some(ref config) = cli_config {
                apply_scan_config_defaults(config, &mut scan_args);
            }

            run_scan(&store, &scan_args)
        }
        None => {
            let mut cmd = Cli::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

fn lookup_and_emit(store: &RecordStore, query: &LookupQuery, output: &OutputArgs) -> Result<()> {
    let dataset = store.load()?;
    let result = engine::run_lookup(&dataset.records, query);

    export_if_requested(&result, output)?;

    match output.format {
        OutputFormat::Text => format::print_text(&result),
        OutputFormat::Table => format::print_table(&result),
        OutputFormat::Json => format::print_json(&result),
        OutputFormat::Csv => format::print_csv(&result),
    }
}

fn run_scan(store: &RecordStore, scan_args: &ScanArgs) -> Result<()> {
    let dataset = store.load()?;

    let command = scan_args
        .recognizer
        .clone()
        .unwrap_or_else(|| DEFAULT_RECOGNIZER_COMMAND.to_string());
    let recognizer = TesseractRecognizer::new(command, scan_args.language.clone());
    let options = args::scan_options_from_args(scan_args);
    let prefill = scan::prefill_from_image(&recognizer, &scan_args.image, dataset, options);

    // Lookups only run once a street has been recognized; otherwise the
    // operator falls back to `beatlookup address`.
    let result = prefill.street.as_ref().map(|street| {
        let query = LookupQuery::Address {
            street: street.clone(),
            house_no: prefill.house_no.clone(),
        };
        engine::run_lookup(&dataset.records, &query)
    });

    if let Some(result) = &result {
        export_if_requested(result, &scan_args.output)?;
    }

    match scan_args.output.format {
        OutputFormat::Json => format::print_json(&ScanReport {
            version: LOOKUP_RESULT_VERSION,
            prefill: &prefill,
            result: result.as_ref(),
        }),
        OutputFormat::Csv => match &result {
            Some(result) => format::print_csv(result),
            None => {
                export::write_csv(&[], std::io::stdout().lock())?;
                Ok(())
            }
        },
        OutputFormat::Text | OutputFormat::Table => {
            format::print_prefill_text(&prefill)?;
            match &result {
                Some(result) if matches!(scan_args.output.format, OutputFormat::Table) => {
                    format::print_table(result)
                }
                Some(result) => format::print_text(result),
                None => Ok(()),
            }
        }
    }
}

fn export_if_requested(result: &LookupResult, output: &OutputArgs) -> Result<()> {
    if let Some(path) = &output.export {
        export::export_to_path(&result.rows, path)?;
        eprintln!("Exported {} row(s) to {}", result.rows.len(), path.display());
    }
    Ok(())
}
