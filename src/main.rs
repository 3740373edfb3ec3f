/// Kvdrive - concurrent load generation for TCP key-value stores.
mod cli;
mod error;
mod keys;
mod output;
mod protocol;
mod report;
mod simulator;
mod target;
mod transport;

use clap::Parser;
use cli::Cli;

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(e) = cli.run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
