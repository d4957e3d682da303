//! Configuration module for Summarist.
//!
//! Handles loading application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, SummaryPrompts};
pub use settings::{
    AiSettings, DownloaderSettings, GeneralSettings, OutputSettings, PromptSettings, Settings,
    SourceConfig, SummaryLength, SummarySettings,
};
