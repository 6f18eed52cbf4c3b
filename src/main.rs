use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let complete = commands::handle_collect(cli)?;
    if !complete {
        std::process::exit(1);
    }

    Ok(())
}
