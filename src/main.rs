//! Entry point for the dupescan CLI.

use clap::Parser;
use dupescan::cli::Cli;
use dupescan::duplicates::FinderError;
use dupescan::logging::init_logging;
use dupescan::signal::EXIT_CODE_INTERRUPTED;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match dupescan::run_app(cli) {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            let interrupted = err
                .downcast_ref::<FinderError>()
                .is_some_and(|e| matches!(e, FinderError::Interrupted));
            if interrupted {
                eprintln!("Scan interrupted");
                std::process::exit(EXIT_CODE_INTERRUPTED);
            }
            eprintln!("Error: {err:#}");
            std::process::exit(1);
        }
    }
}
