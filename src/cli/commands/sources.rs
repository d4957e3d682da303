//! Sources command implementation.

use crate::cli::Output;
use crate::config::Settings;
use anyhow::Result;
use console::style;

/// Run the sources command.
pub fn run_sources(settings: &Settings) -> Result<()> {
    if settings.sources.is_empty() {
        Output::info("No sources configured. Add [[sources]] entries to your config.");
        return Ok(());
    }

    Output::header(&format!("Sources ({})", settings.sources.len()));
    println!();

    for source in &settings.sources {
        let status = if source.enabled {
            style("enabled").green()
        } else {
            style("disabled").dim()
        };
        Output::list_item(&format!(
            "{} [{}] {}",
            style(&source.name).bold(),
            source.source_type,
            status
        ));
        println!("    {}", style(&source.url).dim());
    }

    println!();
    Output::kv("Enabled", &settings.enabled_sources().count().to_string());

    Ok(())
}
