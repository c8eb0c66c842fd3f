use sbu_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Initialize logging as early as possible; fall back to stderr when the
    // log directory is not writable.
    if let Err(err) = logging::init_logging() {
        eprintln!("sbu: file logging unavailable ({err:#}), logging to stderr");
        logging::init_logging_stderr();
    }

    // Parse CLI and dispatch.
    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("sbu error: {:#}", err);
        std::process::exit(1);
    }
}
