//! Pre-flight checks before expensive operations.
//!
//! Validates that required tools and configuration are available
//! before starting a run that would otherwise fail on every item.

use crate::config::Settings;
use crate::error::{Result, SummaristError};
use std::process::Command;

/// Check everything the fetch-and-summarize pipeline needs.
pub fn check_pipeline(settings: &Settings) -> Result<()> {
    check_api_key(settings)?;
    check_tool(&settings.downloader.binary)?;
    Ok(())
}

/// Check if an API key is configured.
fn check_api_key(settings: &Settings) -> Result<()> {
    match settings.api_key() {
        Some(_) => Ok(()),
        None => Err(SummaristError::Config(
            "API key not set. Set it with: export OPENAI_API_KEY='sk-...' or ai.api_key in config".to_string(),
        )),
    }
}

/// Check if an external tool is available.
fn check_tool(name: &str) -> Result<()> {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(_) => Err(SummaristError::ToolNotFound(format!(
            "{} is installed but not working correctly",
            name
        ))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(SummaristError::ToolNotFound(name.to_string()))
        }
        Err(e) => Err(SummaristError::ToolNotFound(format!("{}: {}", name, e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        assert!(matches!(
            check_tool("summarist-no-such-binary"),
            Err(SummaristError::ToolNotFound(_))
        ));
    }

    #[test]
    fn test_configured_key_passes() {
        let mut settings = Settings::default();
        settings.ai.api_key = "sk-test".to_string();
        assert!(check_api_key(&settings).is_ok());
    }
}
