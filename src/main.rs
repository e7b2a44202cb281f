use anyhow::Result;
use clap::Parser;

use polyunion::cli::{init_tracing, Cli, Commands};
use polyunion::commands::union;

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match &cli.command {
        Commands::Union(args) => union::run(&cli, args),
    }
}
