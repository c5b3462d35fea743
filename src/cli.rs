use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

#[derive(Parser)]
#[clap(author, version, about)]
pub struct Cli {
    /// Raise the log level; repeat for more detail (-v info, -vv debug, -vvv trace)
    #[clap(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[clap(subcommand)]
    pub subcommand: Subcommands,
}

#[derive(Subcommand)]
pub enum Subcommands {
    /// Run a mixed insert/delete/lookup/sample workload and report throughput.
    Bench {
        /// Number of operations to perform
        #[clap(long, value_name = "N")]
        ops: Option<u64>,
        /// Values are drawn from 0..UNIVERSE
        #[clap(long, value_name = "UNIVERSE")]
        universe: Option<u64>,
        /// Seed for both the workload driver and the set; omit for a clock seed
        #[clap(long, value_name = "SEED")]
        seed: Option<u64>,
        /// A TOML workload file; command-line flags take precedence over it
        #[clap(long, value_name = "PATH")]
        config: Option<PathBuf>,
    },
    /// Insert VALUES, optionally delete some, then draw samples and tabulate them.
    Sample {
        /// Number of samples to draw
        #[clap(short = 'n', long, value_name = "N", default_value = "1000")]
        draws: u64,
        /// Seed for the set's random source; omit for a clock seed
        #[clap(long, value_name = "SEED")]
        seed: Option<u64>,
        /// A value to delete after inserting; can be passed multiple times
        #[clap(short, long, value_name = "VALUE")]
        delete: Vec<String>,
        /// Values to insert, in order
        values: Vec<String>,
    },
}
