//! Doctor command - verify configuration and external requirements.

use crate::agent::AgentKind;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use console::style;

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
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("askbox Doctor");
    println!();

    let checks = vec![
        check_api_key(settings),
        check_speech(settings),
        check_log(settings),
    ];
    for check in &checks {
        check.print();
    }

    Output::header("Configuration");
    Output::kv("Config file", &Settings::default_config_path().display().to_string());
    Output::kv("API base", &settings.model.api_base);
    Output::kv("Model", &settings.model.model);
    Output::kv("Default agent", settings.agents.default_agent.label());
    Output::kv("Answer log", &settings.log_path().display().to_string());

    Output::header("Agents");
    for kind in AgentKind::ALL {
        Output::list_item(&format!("{} ({})", kind.label(), kind));
    }
    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();
    if errors > 0 {
        Output::error(&format!("{} error(s), {} warning(s)", errors, warnings));
    } else if warnings > 0 {
        Output::warning(&format!("Ready with {} warning(s)", warnings));
    } else {
        Output::success("All checks passed");
    }

    Ok(())
}

fn check_api_key(settings: &Settings) -> CheckResult {
    match preflight::check_api_key(settings) {
        Ok(()) => CheckResult::ok("API key", &format!("{} is set", settings.model.api_key_env)),
        // Agents still start without a key; every query then fails to authenticate
        Err(e) => CheckResult::error(
            "API key",
            &e.to_string(),
            &format!("echo '{}=...' >> .env", settings.model.api_key_env),
        ),
    }
}

fn check_speech(settings: &Settings) -> CheckResult {
    if !settings.speech.enabled {
        return CheckResult::ok("Speech", "disabled");
    }
    match preflight::check_speech(settings) {
        Ok(()) => CheckResult::ok("Speech", &format!("{} found", settings.speech.program)),
        Err(e) => CheckResult::warning(
            "Speech",
            &e.to_string(),
            "Install espeak (Linux) or set [speech] program",
        ),
    }
}

fn check_log(settings: &Settings) -> CheckResult {
    match preflight::check_log_path(settings) {
        Ok(()) => CheckResult::ok("Answer log", "writable"),
        Err(e) => CheckResult::error(
            "Answer log",
            &e.to_string(),
            "Set [log] path to a writable location",
        ),
    }
}
