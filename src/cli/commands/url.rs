//! URL command - process explicit URLs.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::Orchestrator;
use anyhow::Result;

/// Run the url command.
pub async fn run_url(urls: &[String], settings: Settings) -> Result<()> {
    preflight::check_pipeline(&settings)?;

    let mut orchestrator = Orchestrator::new(&settings)?;

    let total = urls.len();
    let pb = Output::spinner("");
    let report = orchestrator
        .process_urls(urls, |i, url| {
            pb.set_message(format!("[{}/{}] {}", i + 1, total, url));
        })
        .await;
    pb.finish_and_clear();

    for outcome in &report.outcomes {
        Output::outcome(outcome);
    }
    Output::report(&report);

    Ok(())
}
