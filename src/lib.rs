//! askbox - ask research, chat, and math agents from the terminal
//!
//! A user picks one of three preconfigured language-model agents, types a
//! question, and gets a written answer in a running transcript plus a spoken
//! rendition. Successful answers are appended to a plain-text log.
//!
//! # Architecture
//!
//! - `agent` - the three agents behind the `Respond` trait, and the research tools
//! - `dispatch` - routes a query to the selected agent and turns any outcome into text
//! - `answer_log` - append-only question/answer log
//! - `session` - interactive transcript with asynchronous answers
//! - `speech` - text-to-speech through an external program
//! - `config` - settings and prompt templates
//!
//! # Example
//!
//! ```rust,no_run
//! use askbox::agent::AgentKind;
//! use askbox::config::Settings;
//! use askbox::dispatch::Dispatcher;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let dispatcher = Dispatcher::from_settings(&settings)?;
//!
//!     let answer = dispatcher.handle(AgentKind::Math, "What is 17 * 23?").await;
//!     println!("{}", answer);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod answer_log;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod openai;
pub mod session;
pub mod speech;

pub use error::{AssistantError, Result};
