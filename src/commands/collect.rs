use anyhow::{Context, Result};
use std::fs;

use crate::cli::{Cli, OutputFormat};
use py_license_collector::archive::PipArchiver;
use py_license_collector::collect::{collect, CollectOptions};
use py_license_collector::config::load_config;
use py_license_collector::environment::{enumerate_installed, find_site_packages_path};
use py_license_collector::fetch::HttpFetcher;
use py_license_collector::output::{format_missing, format_table_output, Progress};
use py_license_collector::registry::Registry;

/// Run a collection. Returns `false` when packages were left without a
/// license.
pub fn handle_collect(cli: Cli) -> Result<bool> {
    // Load configuration from pyproject.toml
    let config = load_config()?;

    // Determine output format
    let format = cli.format.clone().unwrap_or_else(|| match config.format.as_deref() {
        Some("json") => OutputFormat::Json,
        _ => OutputFormat::Table,
    });

    // stdout carries only the report when it is JSON
    let progress = match format {
        OutputFormat::Json => Progress::new(cli.quiet, cli.verbose).on_stderr(),
        OutputFormat::Table => Progress::new(cli.quiet, cli.verbose),
    };

    // CLI arguments override config values
    let python = cli.python.clone().unwrap_or_else(|| config.python().to_string());
    let site_packages_arg = cli.site_packages.clone().or_else(|| config.site_packages.clone());

    let site_packages = find_site_packages_path(site_packages_arg.as_deref(), &python)?;
    progress.detail(format!("Inspecting {}", site_packages.display()));
    let packages = enumerate_installed(&site_packages)?;
    progress.detail(format!("Found {} installed packages", packages.len()));

    let registry = Registry::load(&cli.registry)?;
    progress.detail(format!(
        "Loaded {} registry entries from {}",
        registry.entries().len(),
        registry.origin()
    ));

    let options = CollectOptions {
        branch: cli.branch.clone().unwrap_or_else(|| config.branch().to_string()),
        license_file: config.license_file().to_string(),
        copyleft_marker: config.copyleft_marker().to_string(),
        archive_sources: !cli.no_sources && config.archive_sources(),
    };

    let report = collect(
        &packages,
        &registry,
        &cli.output,
        &HttpFetcher::new(),
        &PipArchiver::new(python),
        &options,
        &progress,
    )?;

    if let Some(path) = &cli.report {
        fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
    }

    if !progress.is_quiet() {
        match format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Table => {
                println!();
                println!("{}", format_table_output(&report, cli.verbose));
            }
        }
    }

    if !report.is_complete() {
        eprint!("{}", format_missing(&report));
        return Ok(false);
    }

    Ok(true)
}
