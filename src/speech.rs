//! Text-to-speech through an external program.

use crate::config::SpeechSettings;
use crate::error::{AssistantError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Something that can read text aloud.
#[async_trait]
pub trait Speaker: Send + Sync {
    async fn speak(&self, text: &str) -> Result<()>;
}

/// Speaker that runs `espeak`, `say` or a compatible program.
pub struct CommandSpeaker {
    program: String,
    rate: u32,
    voice: Option<String>,
}

impl CommandSpeaker {
    pub fn new(settings: &SpeechSettings) -> Self {
        Self {
            program: settings.program.clone(),
            rate: settings.rate,
            voice: settings.voice.clone(),
        }
    }

    /// Command-line arguments for the configured program.
    fn args(&self, text: &str) -> Vec<String> {
        let mut args = Vec::new();
        match self.program.as_str() {
            "say" => {
                args.push("-r".to_string());
                args.push(self.rate.to_string());
            }
            _ => {
                args.push("-s".to_string());
                args.push(self.rate.to_string());
            }
        }
        if let Some(voice) = &self.voice {
            args.push("-v".to_string());
            args.push(voice.clone());
        }
        args.push("--".to_string());
        args.push(text.to_string());
        args
    }
}

#[async_trait]
impl Speaker for CommandSpeaker {
    #[instrument(skip(self, text), fields(program = %self.program, chars = text.len()))]
    async fn speak(&self, text: &str) -> Result<()> {
        let result = Command::new(&self.program)
            .args(self.args(text))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await;

        let output = match result {
            Ok(o) => o,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AssistantError::Speech(format!(
                    "{} not found. Please install it and ensure it's in your PATH.",
                    self.program
                )));
            }
            Err(e) => {
                return Err(AssistantError::Speech(format!(
                    "{} execution failed: {}",
                    self.program, e
                )));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AssistantError::Speech(format!("{} failed: {}", self.program, stderr)));
        }

        debug!("Spoke {} chars", text.len());
        Ok(())
    }
}

/// Build the configured speaker.
pub fn from_settings(settings: &SpeechSettings) -> Arc<dyn Speaker> {
    if settings.enabled {
        Arc::new(CommandSpeaker::new(settings))
    } else {
        Arc::new(SilentSpeaker)
    }
}

/// Speaker used when speech is disabled.
pub struct SilentSpeaker;

#[async_trait]
impl Speaker for SilentSpeaker {
    async fn speak(&self, _text: &str) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(program: &str, voice: Option<&str>) -> SpeechSettings {
        SpeechSettings {
            enabled: true,
            program: program.to_string(),
            rate: 160,
            voice: voice.map(str::to_string),
        }
    }

    #[test]
    fn test_espeak_args() {
        let speaker = CommandSpeaker::new(&settings("espeak", Some("en-us")));
        assert_eq!(
            speaker.args("-hello"),
            vec!["-s", "160", "-v", "en-us", "--", "-hello"]
        );
    }

    #[test]
    fn test_say_args() {
        let speaker = CommandSpeaker::new(&settings("say", None));
        assert_eq!(speaker.args("hi"), vec!["-r", "160", "--", "hi"]);
    }

    #[tokio::test]
    async fn test_missing_program_is_speech_error() {
        let speaker = CommandSpeaker::new(&settings("askbox-no-such-speech-program", None));
        let err = speaker.speak("hello").await.unwrap_err();
        assert!(matches!(err, AssistantError::Speech(_)));
    }

    #[tokio::test]
    async fn test_silent_speaker() {
        assert!(SilentSpeaker.speak("anything").await.is_ok());
    }
}
