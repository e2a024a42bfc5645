mod cmd;
mod core;

use clap::{Parser, Subcommand};
use cmd::filter::FilterCommand;
use cmd::parse::ParseCommand;
use cmd::returns::ReturnsCommand;
use cmd::schema::SchemaCommand;
use cmd::validate::ValidateCommand;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(
    name = "remanent",
    version,
    about = "Round-up savings ledger and inflation-adjusted return projections"
)]
struct Cli {
    /// Worker threads used to normalize transactions (defaults to one per core)
    #[arg(long, global = true, env = "REMANENT_WORKERS")]
    workers: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute ceiling and remanent for each expense
    Parse(ParseCommand),
    /// Reject duplicate, negative and over-cap transactions
    Validate(ValidateCommand),
    /// Validate with Q/P/K temporal rules applied
    Filter(FilterCommand),
    /// Project real returns per K window for NPS or an index fund
    Returns(ReturnsCommand),
    /// Print the expected input formats
    Schema(SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let options = crate::core::NormalizeOptions {
        workers: cli.workers,
    };

    let started = Instant::now();
    let result = match &cli.command {
        Command::Parse(cmd) => cmd.exec(options),
        Command::Validate(cmd) => cmd.exec(options),
        Command::Filter(cmd) => cmd.exec(options),
        Command::Returns(cmd) => cmd.exec(options),
        Command::Schema(cmd) => cmd.exec(),
    };
    log::info!("Completed in {:.3?}", started.elapsed());
    result
}
