#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]
#![deny(missing_docs)]

//! Command-line driver for exercising and benchmarking `snapset`.

mod cli;
mod logging;
mod sample;
mod workload;

use cli::Subcommands;

fn main() -> anyhow::Result<()> {
    let cli = <cli::Cli as clap::Parser>::parse();
    logging::init(cli.verbose);

    match cli.subcommand {
        Subcommands::Bench { ops, universe, seed, config } => {
            let config = workload::WorkloadConfig::resolve(
                config.as_deref(),
                workload::Overrides { ops, universe, seed },
            )?;
            let report = workload::run(&config)?;
            println!("{report}");
        }
        Subcommands::Sample { draws, seed, delete, values } => {
            let report = sample::run(values, &delete, draws, seed)?;
            println!("{report}");
        }
    }

    Ok(())
}
