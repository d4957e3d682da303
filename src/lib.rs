//! Summarist - Video and podcast summaries
//!
//! A CLI tool that follows video channels and podcasts, pulls transcripts
//! of new items and archives them alongside an AI-written summary.
//!
//! # Overview
//!
//! Summarist allows you to:
//! - Scan YouTube channels, Bilibili uploaders and Xiaoyuzhou shows for new items
//! - Fetch metadata, cover images and subtitle transcripts through yt-dlp
//! - Summarize transcripts with an OpenAI-compatible chat model
//! - Archive each item as Markdown and JSON, remembering what was processed
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `downloader` - yt-dlp invocation and subtitle reading
//! - `media_source` - Per-platform fetchers (YouTube, Bilibili, Xiaoyuzhou)
//! - `summarizer` - Prompting and lenient response parsing
//! - `archive` - Per-item archive folders
//! - `state` - The processed set
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use summarist::config::Settings;
//! use summarist::orchestrator::{ItemOutcome, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let mut orchestrator = Orchestrator::new(&settings)?;
//!
//!     let outcome = orchestrator
//!         .process_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ")
//!         .await;
//!     if let ItemOutcome::Recorded { folder, .. } = outcome {
//!         println!("Archived to {}", folder.display());
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod cli;
pub mod config;
pub mod downloader;
pub mod error;
pub mod media_source;
pub mod openai;
pub mod orchestrator;
pub mod state;
pub mod summarizer;

pub use error::{Result, SummaristError};
