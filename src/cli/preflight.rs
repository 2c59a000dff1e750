//! Pre-flight checks before talking to the model.
//!
//! A missing key is reported but never blocks a command: each dispatch then
//! fails on its own with an authentication error shown as the answer.

use crate::config::Settings;
use crate::error::{AssistantError, Result};
use std::path::Path;
use std::process::Command;

/// Check if the model API key is configured.
pub fn check_api_key(settings: &Settings) -> Result<()> {
    let var = &settings.model.api_key_env;
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(()),
        Ok(_) => Err(AssistantError::Config(format!(
            "{} is empty. Set it in your environment or in a .env file.",
            var
        ))),
        Err(_) => Err(AssistantError::Config(format!(
            "{} not set. Set it in your environment or in a .env file.",
            var
        ))),
    }
}

/// Check if the speech program is available.
pub fn check_speech(settings: &Settings) -> Result<()> {
    let program = &settings.speech.program;
    // `say` has no version flag; a missing binary is what we care about
    let version_arg = match program.as_str() {
        "say" => "-v?",
        _ => "--version",
    };
    match Command::new(program).arg(version_arg).output() {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AssistantError::Speech(format!(
            "{} not found. Install it or disable speech with [speech] enabled = false.",
            program
        ))),
        Err(e) => Err(AssistantError::Speech(format!("{}: {}", program, e))),
    }
}

/// Check that the answer log could be appended to, without creating anything.
///
/// An existing log must open for appending; a missing one needs its nearest
/// existing ancestor to be a writable directory.
pub fn check_log_path(settings: &Settings) -> Result<()> {
    let path = settings.log_path();
    if path.is_dir() {
        return Err(AssistantError::Config(format!(
            "{} is a directory",
            path.display()
        )));
    }
    if path.exists() {
        std::fs::OpenOptions::new().append(true).open(&path)?;
        return Ok(());
    }

    let dir = path
        .ancestors()
        .skip(1)
        .find(|p| p.exists())
        .unwrap_or_else(|| Path::new("."));
    let metadata = std::fs::metadata(dir)?;
    if !metadata.is_dir() {
        return Err(AssistantError::Config(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    if metadata.permissions().readonly() {
        return Err(AssistantError::Config(format!(
            "{} is not writable",
            dir.display()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_api_key() {
        let mut settings = Settings::default();
        settings.model.api_key_env = "ASKBOX_TEST_KEY_THAT_IS_NEVER_SET".to_string();
        assert!(check_api_key(&settings).is_err());
    }

    #[test]
    fn test_missing_speech_program() {
        let mut settings = Settings::default();
        settings.speech.program = "askbox-no-such-speech-program".to_string();
        assert!(matches!(
            check_speech(&settings),
            Err(AssistantError::Speech(_))
        ));
    }

    fn settings_with_log(path: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.log.path = path.to_string_lossy().to_string();
        settings
    }

    #[test]
    fn test_missing_log_path_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_with_log(&dir.path().join("logs").join("answers.txt"));

        assert!(check_log_path(&settings).is_ok());
        assert!(!settings.log_path().exists());
        assert!(!dir.path().join("logs").exists());
    }

    #[test]
    fn test_existing_log_is_left_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.txt");
        std::fs::write(&path, "--- Research Entry ---\n").unwrap();

        assert!(check_log_path(&settings_with_log(&path)).is_ok());
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "--- Research Entry ---\n"
        );
    }

    #[test]
    fn test_unusable_log_paths() {
        let dir = tempfile::tempdir().unwrap();
        assert!(check_log_path(&settings_with_log(dir.path())).is_err());

        let file = dir.path().join("not-a-dir");
        std::fs::write(&file, "").unwrap();
        assert!(check_log_path(&settings_with_log(&file.join("answers.txt"))).is_err());
    }
}
