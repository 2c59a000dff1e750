//! Ask command implementation.

use crate::agent::AgentKind;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::speech;
use anyhow::Result;
use console::style;

/// Run the ask command: one dispatch, printed and spoken.
pub async fn run_ask(question: &str, agent: Option<AgentKind>, settings: Settings) -> Result<()> {
    let dispatcher = Dispatcher::from_settings(&settings)?;

    let query = match dispatcher.validate(question) {
        Ok(query) => query,
        Err(e) => {
            Output::warning(&e.to_string());
            return Ok(());
        }
    };

    if let Err(e) = preflight::check_api_key(&settings) {
        Output::warning(&e.to_string());
    }

    let agent = agent.unwrap_or(settings.agents.default_agent);
    println!("{} {}", style("You:").green().bold(), query);

    let spinner = Output::spinner(&format!("{} working...", agent.label()));
    let dispatch = dispatcher.dispatch(agent, &query).await;
    spinner.finish_and_clear();

    println!("\n{} {}\n", style("Assistant:").cyan().bold(), dispatch.answer);
    if dispatch.persisted {
        Output::info(&format!("Saved to {}", settings.log_path().display()));
    }

    // Speaking is the last step, so wait for it rather than racing process exit
    if let Err(e) = speech::from_settings(&settings.speech).speak(&dispatch.answer).await {
        tracing::warn!("{}", e);
    }

    Ok(())
}
