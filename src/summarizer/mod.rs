//! Transcript summarization.
//!
//! A [`CompletionModel`] turns a rendered prompt into free-form text; the
//! [`Summarizer`] builds the prompt and extracts a [`SummaryResult`] from
//! whatever the model returns.

mod openai;
mod parser;

pub use openai::OpenAiModel;
pub use parser::parse_response;

use crate::config::{Prompts, SummarySettings};
use crate::error::{Result, SummaristError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// A speaker or guest mentioned in the summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Guest {
    Name(String),
    Profile {
        #[serde(default, deserialize_with = "lenient_text")]
        name: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        role: Option<String>,
        #[serde(default, deserialize_with = "lenient_text")]
        views: Option<String>,
    },
}

/// Accept a string, a list (joined with `; `) or a scalar for a guest field.
/// Objects and blank values become `None`.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    fn text(value: &serde_json::Value) -> Option<String> {
        match value {
            serde_json::Value::String(s) => Some(s.trim().to_string()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            serde_json::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let joined = match value {
        Some(serde_json::Value::Array(items)) => {
            let parts: Vec<String> = items.iter().filter_map(text).filter(|s| !s.is_empty()).collect();
            Some(parts.join("; "))
        }
        Some(other) => text(&other),
        None => None,
    };
    Ok(joined.filter(|s| !s.is_empty()))
}

/// Structured summary of one transcript.
///
/// Every field is always present; missing parts are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryResult {
    /// Generated title, distinct from the original media title.
    pub title: String,
    pub core_points: Vec<String>,
    pub insights: Vec<String>,
    pub quotes: Vec<String>,
    pub guests: Vec<Guest>,
    /// Summary body. Never empty for a non-empty model response.
    pub summary: String,
}

/// A chat model that answers one prompt with one text response.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Send a system and user prompt and return the response text.
    async fn complete(&self, system: &str, prompt: &str) -> Result<String>;
}

/// Builds summary prompts and parses model output.
pub struct Summarizer {
    model: Arc<dyn CompletionModel>,
    prompts: Prompts,
    target_words: u32,
}

impl Summarizer {
    pub fn new(model: Arc<dyn CompletionModel>, prompts: Prompts, settings: &SummarySettings) -> Self {
        Self {
            model,
            prompts,
            target_words: settings.target_words(),
        }
    }

    /// Render the user prompt for a transcript.
    pub fn build_prompt(&self, transcript: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("length".to_string(), self.target_words.to_string());
        vars.insert("transcript".to_string(), transcript.to_string());
        self.prompts.render_with_custom(&self.prompts.summary.user, &vars)
    }

    /// Summarize a transcript.
    #[instrument(skip_all, fields(model = %self.model.model(), chars = transcript.len()))]
    pub async fn summarize(&self, transcript: &str) -> Result<SummaryResult> {
        let prompt = self.build_prompt(transcript);
        let system = self.prompts.render_with_custom(&self.prompts.summary.system, &HashMap::new());

        let response = self
            .model
            .complete(&system, &prompt)
            .await
            .map_err(|e| match e {
                SummaristError::Summarization(_) => e,
                other => SummaristError::Summarization(other.to_string()),
            })?;

        if response.trim().is_empty() {
            return Err(SummaristError::Summarization("empty response from model".to_string()));
        }

        let summary = parse_response(&response);
        info!("Summary generated: {}", summary.title);
        Ok(summary)
    }
}
