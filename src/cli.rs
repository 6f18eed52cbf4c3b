use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "py-license-collector")]
#[command(about = "Collect LICENSE files for installed Python packages")]
#[command(version)]
pub struct Cli {
    /// Registry CSV (package_name,license_url,license_type)
    pub registry: PathBuf,

    /// Directory receiving <package>.LICENSE files and source/
    pub output: PathBuf,

    /// Path to site-packages directory or virtual environment
    #[arg(long)]
    pub site_packages: Option<PathBuf>,

    /// Python interpreter used to locate site-packages and run pip
    #[arg(long)]
    pub python: Option<String>,

    /// Branch used when guessing license locations on GitHub
    #[arg(long)]
    pub branch: Option<String>,

    /// Do not archive sources of GPL-licensed packages
    #[arg(long)]
    pub no_sources: bool,

    /// Summary format
    #[arg(short, long)]
    pub format: Option<OutputFormat>,

    /// Also write the JSON collection report to this file
    #[arg(short = 'o', long)]
    pub report: Option<PathBuf>,

    /// Show errors only
    #[arg(short, long)]
    pub quiet: bool,

    /// Show detailed information
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}
