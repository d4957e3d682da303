//! CLI output formatting utilities.

use crate::orchestrator::{BatchReport, ItemOutcome};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print a numbered candidate for selection.
    pub fn candidate(index: usize, source: &str, title: &str, published: &str, duration: Option<u32>, url: &str) {
        let duration_str = duration.map(|d| format!(", {}", format_duration(d))).unwrap_or_default();
        println!(
            "{:>3}. {} {}",
            index,
            style(format!("[{}]", source)).cyan(),
            style(title).bold()
        );
        println!("     {}{}", style(published).dim(), style(duration_str).dim());
        println!("     {}", style(url).dim());
    }

    /// Print the terminal state of one item.
    pub fn outcome(outcome: &ItemOutcome) {
        match outcome {
            ItemOutcome::Recorded { title, folder, .. } => {
                Self::success(&format!("{} -> {}", title, folder.display()));
            }
            ItemOutcome::Skipped { source_type, id } => {
                Self::info(&format!("Skipped {} {} (already processed)", source_type, id));
            }
            ItemOutcome::Failed { url, stage, error, .. } => {
                Self::error(&format!("{} failed at {}: {}", url, stage, error));
            }
        }
    }

    /// Print the per-run totals.
    pub fn report(report: &BatchReport) {
        println!();
        Output::kv("Recorded", &report.recorded().to_string());
        Output::kv("Skipped", &report.skipped().to_string());
        Output::kv("Failed", &report.failed().to_string());
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap(),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Format duration in seconds to a human-readable string.
fn format_duration(seconds: u32) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, minutes, secs)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(95), "1m 35s");
        assert_eq!(format_duration(3723), "1h 2m 3s");
    }
}
