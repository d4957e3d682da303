//! CLI module for Summarist.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use crate::media_source::SourceType;
use clap::{Parser, Subcommand};

/// Summarist - Video and podcast summaries
///
/// Follows YouTube channels, Bilibili uploaders and Xiaoyuzhou shows, and
/// archives each new item with its transcript and an AI-written summary.
#[derive(Parser, Debug)]
#[command(name = "summarist")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan configured sources and process selected new items
    Batch {
        /// Process every new item without asking
        #[arg(short, long)]
        all: bool,
    },

    /// Process the given URLs directly
    Url {
        /// YouTube, Bilibili or Xiaoyuzhou URLs
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// List configured sources
    Sources,

    /// List processed items
    History {
        /// Only show one source type (youtube, bilibili, xiaoyuzhou)
        #[arg(short, long)]
        source: Option<SourceType>,
    },

    /// Check system requirements and configuration
    Doctor,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_url_command() {
        let cli = Cli::parse_from(["summarist", "url", "https://youtu.be/dQw4w9WgXcQ", "https://b23.tv/abc"]);
        match cli.command {
            Commands::Url { urls } => assert_eq!(urls.len(), 2),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_url_command_requires_urls() {
        assert!(Cli::try_parse_from(["summarist", "url"]).is_err());
    }

    #[test]
    fn test_history_source_filter() {
        let cli = Cli::parse_from(["summarist", "-v", "history", "--source", "bilibili"]);
        assert_eq!(cli.verbose, 1);
        assert!(matches!(
            cli.command,
            Commands::History {
                source: Some(SourceType::Bilibili)
            }
        ));
        assert!(Cli::try_parse_from(["summarist", "history", "--source", "vimeo"]).is_err());
    }
}
