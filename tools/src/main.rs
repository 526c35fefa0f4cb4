use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use furnace_tools::export::{export, ExportArgs};
use furnace_tools::inspect::{inspect, InspectArgs};
use furnace_tools::pack::{pack, unpack, PackArgs};

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// Log what the decoder is doing (overridden by RUST_LOG)
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Inspect(InspectArgs),
    Export(ExportArgs),
    Pack(PackArgs),
    Unpack(PackArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(wild::args());

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Inspect(args) => inspect(&args),
        Command::Export(args) => export(args),
        Command::Pack(args) => pack(&args),
        Command::Unpack(args) => unpack(&args),
    }
}
