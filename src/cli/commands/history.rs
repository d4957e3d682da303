//! History command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::media_source::SourceType;
use crate::state::ProcessedSet;
use anyhow::Result;
use console::style;

/// Run the history command.
pub fn run_history(source: Option<SourceType>, settings: &Settings) -> Result<()> {
    let processed = ProcessedSet::load(&settings.state_path())?;

    if processed.is_empty() {
        Output::info("Nothing processed yet. Use 'summarist batch' or 'summarist url <URL>'.");
        return Ok(());
    }

    let types: Vec<SourceType> = match source {
        Some(t) => vec![t],
        None => SourceType::ALL.to_vec(),
    };

    for source_type in types {
        let records = processed.records(source_type);
        if records.is_empty() {
            continue;
        }

        Output::header(&format!("{} ({})", source_type, records.len()));
        println!();
        for record in records {
            Output::list_item(&format!(
                "{} ({}) {}",
                style(&record.title).bold(),
                style(record.item_id()).dim(),
                style(&record.processed_at).dim()
            ));
        }
    }

    println!();
    Output::kv("Total items", &processed.len().to_string());
    if let Some(scan) = processed.last_scan() {
        Output::kv("Last scan", scan);
    }

    Ok(())
}
