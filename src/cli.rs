use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::geom::Domain;

/// Row-wise multipolygon union CLI
#[derive(Parser, Debug)]
#[command(name = "polyunion", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Union two multipolygon JSON files row by row (forbids stdout)
    Union(UnionArgs),
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
pub enum DomainArg { Cartesian, Geographic }

impl From<DomainArg> for Domain {
    fn from(arg: DomainArg) -> Self {
        match arg {
            DomainArg::Cartesian => Domain::Cartesian,
            DomainArg::Geographic => Domain::Geographic,
        }
    }
}

#[derive(Args, Debug)]
pub struct UnionArgs {
    /// Coordinate domain of the inputs
    #[arg(long, value_enum, default_value_t = DomainArg::Cartesian)]
    pub domain: DomainArg,

    /// First argument: a JSON array of multipolygons, or a single multipolygon
    #[arg(value_hint = ValueHint::FilePath)]
    pub a: PathBuf,

    /// Second argument, same format as the first
    #[arg(value_hint = ValueHint::FilePath)]
    pub b: PathBuf,

    /// Output file (must be a file path; "-" is rejected)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// JSON configuration file (tolerances, strict mode, row error policy)
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Reject self-intersecting input rings
    #[arg(long)]
    pub strict: bool,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,
}

/// Install the global tracing subscriber.  `RUST_LOG` wins over `-v`.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("polyunion={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
