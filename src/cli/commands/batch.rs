//! Batch command - scan sources and process selected new items.

use crate::cli::{preflight, Output};
use crate::config::Settings;
use crate::orchestrator::{Candidate, Orchestrator};
use anyhow::Result;
use console::style;
use std::io::{self, BufRead, Write};

/// What the user picked from the candidate list.
#[derive(Debug, PartialEq)]
pub enum Selection {
    All,
    Quit,
    /// Zero-based indices, in the order given.
    Items(Vec<usize>),
}

/// Parse `all`, `q`, or a comma-separated list of 1-based numbers.
///
/// Numbers outside `1..=count` are ignored. Anything else that is not a
/// number is rejected.
pub fn parse_selection(input: &str, count: usize) -> Option<Selection> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("q") {
        return Some(Selection::Quit);
    }
    if input.eq_ignore_ascii_case("all") {
        return Some(Selection::All);
    }

    let mut indices = Vec::new();
    for part in input.split(',') {
        let n: usize = part.trim().parse().ok()?;
        if (1..=count).contains(&n) {
            indices.push(n - 1);
        }
    }
    Some(Selection::Items(indices))
}

/// Run the batch command.
pub async fn run_batch(all: bool, settings: Settings) -> Result<()> {
    preflight::check_pipeline(&settings)?;

    if settings.enabled_sources().next().is_none() {
        Output::warning("No enabled sources configured. Add [[sources]] entries to your config.");
        return Ok(());
    }

    let mut orchestrator = Orchestrator::new(&settings)?;

    let spinner = Output::spinner("Scanning sources...");
    let candidates = orchestrator.scan_sources(&settings.sources).await;
    spinner.finish_and_clear();

    if candidates.is_empty() {
        Output::success("No new items to process.");
        return Ok(());
    }

    Output::header(&format!("New Items ({})", candidates.len()));
    println!();
    for (i, c) in candidates.iter().enumerate() {
        Output::candidate(
            i + 1,
            &c.source_name,
            &c.item.title,
            &c.item.published_at,
            c.item.duration_seconds,
            &c.item.url,
        );
    }
    println!();

    let selected: Vec<Candidate> = if all {
        candidates
    } else {
        match prompt_selection(candidates.len())? {
            Selection::Quit => {
                Output::info("Exited without processing.");
                return Ok(());
            }
            Selection::All => candidates,
            Selection::Items(indices) => indices.into_iter().map(|i| candidates[i].clone()).collect(),
        }
    };

    if selected.is_empty() {
        Output::info("Nothing selected.");
        return Ok(());
    }

    Output::info(&format!("Processing {} item(s)...", selected.len()));

    let total = selected.len();
    let pb = Output::spinner("");
    let report = orchestrator
        .process_batch(&selected, |i, c| {
            pb.set_message(format!("[{}/{}] {}", i + 1, total, c.item.title));
        })
        .await;
    pb.finish_and_clear();

    for outcome in &report.outcomes {
        Output::outcome(outcome);
    }
    Output::report(&report);

    Ok(())
}

fn prompt_selection(count: usize) -> Result<Selection> {
    println!("Select items to process, e.g. {}", style("1,3,5").cyan());
    println!("Enter {} for everything or {} to quit", style("all").cyan(), style("q").cyan());

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style(">").green().bold());
        stdout.flush()?;

        let mut input = String::new();
        if stdin.lock().read_line(&mut input)? == 0 {
            return Ok(Selection::Quit);
        }

        match parse_selection(&input, count) {
            Some(selection) => return Ok(selection),
            None => Output::warning("Invalid selection, try again."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords() {
        assert_eq!(parse_selection("all", 3), Some(Selection::All));
        assert_eq!(parse_selection(" ALL\n", 3), Some(Selection::All));
        assert_eq!(parse_selection("q", 3), Some(Selection::Quit));
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_selection("1, 3", 3), Some(Selection::Items(vec![0, 2])));
        assert_eq!(parse_selection("2,9", 3), Some(Selection::Items(vec![1])));
        assert_eq!(parse_selection("0", 3), Some(Selection::Items(vec![])));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert_eq!(parse_selection("1,x", 3), None);
        assert_eq!(parse_selection("", 3), None);
    }
}
