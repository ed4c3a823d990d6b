use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::cli::args::OutputFormat;
use crate::cli::{Cli, OutputArgs, ScanArgs};

/// Top-level representation of `.beatlookup/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub data: Option<DataSection>,

    #[serde(default)]
    pub output: Option<OutputSection>,

    #[serde(default)]
    pub scan: Option<ScanSection>,

    /// Directory containing `.beatlookup/`; relative paths in the
    /// config resolve against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
pub struct DataSection {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OutputSection {
    #[serde(default)]
    pub format: Option<OutputFormat>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ScanSection {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub order_by_position: Option<bool>,
    #[serde(default)]
    pub window: Option<usize>,
}

/// Discover and load a project-local `.beatlookup/config.toml` (or
/// `.beatlookup/beatlookup.toml`) starting from the current working
/// directory and walking up parent directories.
pub fn load_cli_config() -> Result<Option<CliConfig>> {
    let cwd = std::env::current_dir().context("failed to read current directory")?;
    let config_path = find_project_config(&cwd);

    let Some(path) = config_path else {
        return Ok(None);
    };

    let contents = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let mut config: CliConfig = toml::from_str(&contents)
        .with_context(|| format!("failed to parse TOML config at {}", path.display()))?;

    // `<base>/.beatlookup/config.toml` -> `<base>`
    config.base_dir = path
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or(cwd);

    Ok(Some(config))
}

fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);

    while let Some(current) = dir {
        let config_dir = current.join(".beatlookup");
        let config_toml = config_dir.join("config.toml");
        if config_toml.is_file() {
            return Some(config_toml);
        }

        let named_toml = config_dir.join("beatlookup.toml");
        if named_toml.is_file() {
            return Some(named_toml);
        }

        dir = current.parent();
    }

    None
}

pub fn apply_data_config_default(config: &CliConfig, cli: &mut Cli) {
    if cli.data.is_some() {
        return;
    }

    if let Some(path) = config.data.as_ref().and_then(|d| d.path.as_ref()) {
        cli.data = Some(if path.is_relative() {
            config.base_dir.join(path)
        } else {
            path.clone()
        });
    }
}

pub fn apply_output_config_defaults(config: &CliConfig, args: &mut OutputArgs) {
    if let Some(output) = &config.output {
        if matches!(args.format, OutputFormat::Text) {
            if let Some(format) = output.format {
                args.format = format;
            }
        }
    }
}

pub fn apply_scan_config_defaults(config: &CliConfig, args: &mut ScanArgs) {
    apply_output_config_defaults(config, &mut args.output);

    if let Some(scan) = &config.scan {
        if args.recognizer.is_none() {
            if let Some(command) = &scan.command {
                args.recognizer = Some(command.clone());
            }
        }

        if args.language.is_none() {
            if let Some(language) = &scan.language {
                args.language = Some(language.clone());
            }
        }

        if !args.keep_order {
            if let Some(false) = scan.order_by_position {
                args.keep_order = true;
            }
        }

        if args.window.is_none() {
            if let Some(window) = scan.window {
                args.window = Some(window);
            }
        }
    }
}
