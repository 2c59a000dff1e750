//! Interactive session command.

use crate::agent::AgentKind;
use crate::cli::preflight;
use crate::cli::Output;
use crate::config::Settings;
use crate::dispatch::Dispatcher;
use crate::session::Session;
use crate::speech;
use anyhow::Result;
use std::sync::Arc;

/// Run the interactive session.
pub async fn run_chat(agent: Option<AgentKind>, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check_api_key(&settings) {
        Output::warning(&e.to_string());
        Output::info("Run 'askbox doctor' for detailed diagnostics.");
    }

    let dispatcher = Arc::new(Dispatcher::from_settings(&settings)?);
    let speaker = speech::from_settings(&settings.speech);
    let agent = agent.unwrap_or(settings.agents.default_agent);

    let session = Session::new(dispatcher, speaker, settings.session.clone(), agent, true);
    session.run().await?;

    Ok(())
}
