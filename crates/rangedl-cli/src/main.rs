use std::process::ExitCode;

use rangedl_core::logging;

mod cli;

use crate::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = logging::init_logging() {
        logging::init_logging_stderr();
        tracing::warn!("file logging unavailable, using stderr: {:#}", e);
    }

    match Cli::run_from_args().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("rangedl error: {:#}", err);
            ExitCode::from(1)
        }
    }
}
