//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
///
/// `settings` is `None` when the configuration file could not be loaded;
/// `config_error` then explains why.
pub fn run_doctor(config_path: &Path, settings: Option<&Settings>, config_error: Option<String>) -> anyhow::Result<()> {
    Output::header("Summarist Doctor");
    println!();
    println!("Checking system requirements and configuration...\n");

    let defaults = Settings::default();
    let effective = settings.unwrap_or(&defaults);
    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let config_check = check_config_file(config_path, config_error);
    config_check.print();
    checks.push(config_check);

    println!();

    println!("{}", style("External Tools").bold());
    let tool_check = check_tool(&effective.downloader.binary, install_hint_ytdlp());
    tool_check.print();
    checks.push(tool_check);

    println!();

    println!("{}", style("API Configuration").bold());
    let api_check = check_api_key(effective);
    api_check.print();
    checks.push(api_check);

    println!();

    println!("{}", style("Directories").bold());
    let dir_checks = check_directories(effective);
    for check in &dir_checks {
        check.print();
    }
    checks.extend(dir_checks);

    if let Some(settings) = settings {
        let source_check = check_sources(settings);
        source_check.print();
        checks.push(source_check);
    }

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Summarist.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Summarist is ready to use.");
    }

    Ok(())
}

/// Check if an external tool is available.
fn check_tool(name: &str, hint: &str) -> CheckResult {
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .to_string();

            let version_display = if version.chars().count() > 50 {
                format!("{}...", version.chars().take(50).collect::<String>())
            } else {
                version
            };

            CheckResult::ok(name, &version_display)
        }
        Ok(_) => CheckResult::error(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckResult::error(name, "not found", hint),
        Err(e) => CheckResult::error(name, &format!("error: {}", e), hint),
    }
}

/// Check if an API key is configured.
fn check_api_key(settings: &Settings) -> CheckResult {
    match settings.api_key() {
        Some(key) if key.len() > 20 => {
            let masked = format!("{}...{}", &key[..7], &key[key.len() - 4..]);
            CheckResult::ok("API key", &format!("configured ({})", masked))
        }
        Some(_) => CheckResult::warning(
            "API key",
            "set but looks unusually short",
            "Check ai.api_key or OPENAI_API_KEY",
        ),
        None => CheckResult::error(
            "API key",
            "not set",
            "Set with: export OPENAI_API_KEY='sk-...' or ai.api_key in config",
        ),
    }
}

/// Check data and output directories.
fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    for (name, dir) in [("Data directory", settings.data_dir()), ("Output directory", settings.output_root())] {
        if dir.exists() {
            results.push(CheckResult::ok(name, &dir.display().to_string()));
        } else {
            results.push(CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            ));
        }
    }

    let state = settings.state_path();
    if state.exists() {
        results.push(CheckResult::ok("State file", &state.display().to_string()));
    } else {
        results.push(CheckResult::warning(
            "State file",
            &format!("{} (not created yet)", state.display()),
            "State file will be created after the first processed item",
        ));
    }

    results
}

fn check_sources(settings: &Settings) -> CheckResult {
    let enabled = settings.enabled_sources().count();
    if enabled > 0 {
        CheckResult::ok("Sources", &format!("{} enabled of {}", enabled, settings.sources.len()))
    } else {
        CheckResult::warning(
            "Sources",
            "none enabled",
            "Add [[sources]] entries to use batch mode",
        )
    }
}

/// Check if config file loads.
fn check_config_file(path: &Path, error: Option<String>) -> CheckResult {
    match error {
        None => CheckResult::ok("Config file", &path.display().to_string()),
        Some(e) => CheckResult::error("Config file", &e, "Create it, then run: summarist config show"),
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}
