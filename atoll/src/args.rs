//! The command line args for the atoll demo driver

use clap::Parser;

/// A consistent hashing ring demo
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// The path to the config file for atoll
    #[clap(short, long, default_value = "atoll.yml")]
    pub conf: String,
}
