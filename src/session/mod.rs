//! Interactive session: the presentation surface.
//!
//! One task owns the transcript and the agent selection. Each submitted query
//! is echoed at once and dispatched on its own task; the answer comes back as
//! a [`SessionEvent::Answered`] on the session channel, so answers land in
//! arrival order. Speech runs on separate tasks and never delays the transcript.

mod transcript;

pub use transcript::{Role, Transcript, TranscriptLine};

use crate::agent::AgentKind;
use crate::cli::Output;
use crate::config::SessionSettings;
use crate::dispatch::{Dispatch, Dispatcher};
use crate::error::Result;
use crate::speech::Speaker;
use console::style;
use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

const FAREWELL_SAVED: &str = "All our conversation has been saved...Goodbye!";
const FAREWELL: &str = "...Goodbye!";

/// Something that happened to the session.
#[derive(Debug)]
pub enum SessionEvent {
    /// A line typed by the user.
    Input(String),
    /// A dispatch finished.
    Answered { id: Uuid, dispatch: Dispatch },
    /// The input stream ended.
    Closed,
}

/// What the session loop should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Query waiting for its answer.
#[derive(Debug, Clone)]
pub struct Pending {
    pub query: String,
    pub agent: AgentKind,
}

/// The interactive transcript with its in-flight dispatches.
pub struct Session {
    dispatcher: Arc<Dispatcher>,
    speaker: Arc<dyn Speaker>,
    settings: SessionSettings,
    transcript: Transcript,
    selection: AgentKind,
    pending: HashMap<Uuid, Pending>,
    saved_any: bool,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Session {
    /// Create a session; `render` prints the transcript to stdout as it grows.
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        speaker: Arc<dyn Speaker>,
        settings: SessionSettings,
        selection: AgentKind,
        render: bool,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            dispatcher,
            speaker,
            settings,
            transcript: Transcript::new(render),
            selection,
            pending: HashMap::new(),
            saved_any: false,
            events_tx,
            events_rx,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn selection(&self) -> AgentKind {
        self.selection
    }

    pub fn select(&mut self, kind: AgentKind) {
        debug!("Selected {} agent", kind);
        self.selection = kind;
    }

    /// Queries still waiting for an answer.
    pub fn pending(&self) -> &HashMap<Uuid, Pending> {
        &self.pending
    }

    /// Whether any answer in this session reached the log.
    pub fn saved_any(&self) -> bool {
        self.saved_any
    }

    /// Sender for feeding events (user input) into the session.
    pub fn sender(&self) -> mpsc::UnboundedSender<SessionEvent> {
        self.events_tx.clone()
    }

    /// Show and speak the welcome message.
    pub fn start(&mut self) {
        let welcome = self.settings.welcome.clone();
        self.say(&welcome);
    }

    /// Validate, echo and dispatch a query with the current selection.
    ///
    /// Invalid input only produces a warning.
    pub fn submit(&mut self, input: &str) -> Result<Uuid> {
        let query = match self.dispatcher.validate(input) {
            Ok(query) => query,
            Err(e) => {
                Output::warning(&e.to_string());
                return Err(e);
            }
        };

        self.transcript.push(Role::User, &query);

        let id = Uuid::new_v4();
        let agent = self.selection;
        self.pending.insert(
            id,
            Pending {
                query: query.clone(),
                agent,
            },
        );

        let dispatcher = self.dispatcher.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let dispatch = dispatcher.dispatch(agent, &query).await;
            // The receiver is gone only when the session has ended.
            let _ = tx.send(SessionEvent::Answered { id, dispatch });
        });

        Ok(id)
    }

    /// Wait for the next event.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        self.events_rx.recv().await
    }

    /// Apply one event to the session.
    pub fn handle_event(&mut self, event: SessionEvent) -> Flow {
        match event {
            SessionEvent::Input(line) => self.handle_input(&line),
            SessionEvent::Answered { id, dispatch } => {
                if self.pending.remove(&id).is_none() {
                    warn!("Answer for unknown dispatch {}", id);
                }
                self.saved_any |= dispatch.persisted;
                self.say(&dispatch.answer);
                Flow::Continue
            }
            SessionEvent::Closed => Flow::Exit,
        }
    }

    fn handle_input(&mut self, line: &str) -> Flow {
        let trimmed = line.trim();
        let mut parts = trimmed.splitn(2, char::is_whitespace);

        match parts.next() {
            Some("/exit") | Some("/quit") => Flow::Exit,
            Some("/agent") => {
                match parts.next().map(str::parse::<AgentKind>) {
                    Some(Ok(kind)) => {
                        self.select(kind);
                        Output::info(&format!("Using the {}", kind.label()));
                    }
                    Some(Err(e)) => Output::warning(&e),
                    None => Output::info(&format!("Current agent: {}", self.selection.label())),
                }
                Flow::Continue
            }
            Some("/help") => {
                print_help();
                Flow::Continue
            }
            _ => {
                let _ = self.submit(trimmed);
                Flow::Continue
            }
        }
    }

    /// Append an assistant line and speak it in the background.
    pub fn say(&mut self, text: &str) {
        self.transcript.push(Role::Assistant, text);

        let speaker = self.speaker.clone();
        let text = text.to_string();
        tokio::spawn(async move {
            if let Err(e) = speaker.speak(&text).await {
                warn!("{}", e);
            }
        });
    }

    /// Farewell text, depending on whether anything was saved.
    pub fn farewell(&self) -> &'static str {
        if self.saved_any {
            FAREWELL_SAVED
        } else {
            FAREWELL
        }
    }

    /// Show and speak the farewell, then wait so speech can finish.
    pub async fn shutdown(&mut self) {
        let farewell = self.farewell();
        self.say(farewell);
        tokio::time::sleep(Duration::from_millis(self.settings.exit_delay_ms)).await;
    }

    /// Run the interactive loop on stdin until the user exits.
    pub async fn run(mut self) -> Result<()> {
        println!("\n{}", style("askbox").bold().cyan());
        println!(
            "{}\n",
            style("Commands: /agent research|chat|math, /help, /exit").dim()
        );

        self.start();
        spawn_stdin_reader(self.sender());
        self.prompt()?;

        while let Some(event) = self.next_event().await {
            if self.handle_event(event) == Flow::Exit {
                break;
            }
            self.prompt()?;
        }

        if !self.pending.is_empty() {
            debug!("Exiting with {} unanswered dispatch(es)", self.pending.len());
        }

        self.shutdown().await;
        Ok(())
    }

    fn prompt(&self) -> Result<()> {
        print!(
            "{} {} ",
            style(format!("[{}]", self.selection)).dim(),
            style(&self.settings.placeholder).dim()
        );
        io::stdout().flush()?;
        Ok(())
    }
}

/// Read stdin lines on a plain thread so a pending read never holds up shutdown.
fn spawn_stdin_reader(tx: mpsc::UnboundedSender<SessionEvent>) {
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(SessionEvent::Input(line)).is_err() {
                        return;
                    }
                }
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            }
        }
        let _ = tx.send(SessionEvent::Closed);
    });
}

fn print_help() {
    Output::header("Commands");
    Output::kv("/agent <name>", "switch to research, chat or math");
    Output::kv("/agent", "show the current agent");
    Output::kv("/exit", "say goodbye and quit");
}
