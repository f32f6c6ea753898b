//! `rangedl get <url>` – download with Ctrl-C cancellation.

use anyhow::Result;
use rangedl_core::config::DownloaderConfig;
use rangedl_core::{url_model, CancelToken, DownloadSession, SessionOutcome};
use std::path::PathBuf;

use crate::cli::progress::ProgressPrinter;

pub async fn run_get(
    cfg: DownloaderConfig,
    url: &str,
    output: Option<PathBuf>,
) -> Result<SessionOutcome> {
    let destination = match output {
        Some(p) => p,
        None => url_model::default_destination(url, &std::env::current_dir()?),
    };
    tracing::info!(url, destination = %destination.display(), "starting download");

    let cancel = CancelToken::new();
    let on_signal = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\ninterrupted, saving progress...");
            on_signal.cancel();
        }
    });

    let session = DownloadSession::new(url, destination.clone(), cfg, ProgressPrinter::new());
    let run_cancel = cancel.clone();
    let outcome = tokio::task::spawn_blocking(move || session.run(&run_cancel)).await??;
    signal_task.abort();

    match outcome {
        SessionOutcome::Finished => println!("Saved {}", destination.display()),
        SessionOutcome::Cancelled => {
            println!("Paused. Run the same command again to resume.")
        }
        SessionOutcome::Incomplete { pending_blocks } => println!(
            "{pending_blocks} block(s) still pending. Run the same command again to retry."
        ),
        SessionOutcome::NotFound => println!("Could not access {url}"),
        SessionOutcome::FileError => println!(
            "Downloaded size does not match; temp file kept at {}",
            rangedl_core::storage::temp_path(&destination).display()
        ),
        SessionOutcome::Failed => println!("Could not move the download into place"),
    }
    Ok(outcome)
}
