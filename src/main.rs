//! `srs` turns documented technical functions into a software requirements
//! specification.

use clap::Parser;

mod cli;

fn main() -> anyhow::Result<()> {
    cli::Cli::parse().run()
}
