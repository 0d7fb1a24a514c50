use std::process::ExitCode;

use clap::Parser;

use strata::cli::{self, CliArgs};
use strata::logger;

fn main() -> ExitCode {
    logger::init();
    cli::run(CliArgs::parse())
}
