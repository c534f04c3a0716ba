use std::env;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent},
    terminal,
};
use tracing::{debug, warn};

use crate::error::TutorError;

pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// How long the interactive key prompt waits for input.
pub const KEY_PROMPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for clients whose API key lives in a well-known environment variable.
///
/// Resolution order is the secret store first (process environment, then `.env`),
/// then a manually entered value, then an interactive prompt.
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Look the key up in the secret store. Empty values count as absent.
    fn find_key() -> Option<String> {
        // Missing .env is fine
        let _ = dotenvy::dotenv();

        env::var(Self::KEY_NAME)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Secret store first, then the manually entered value.
    fn resolve_key(manual: Option<&str>) -> Result<String, TutorError> {
        if let Some(key) = Self::find_key() {
            debug!(key_name = Self::KEY_NAME, "API key resolved from environment");
            return Ok(key);
        }

        manual
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .ok_or(TutorError::MissingCredential(Self::KEY_NAME))
    }

    /// Like `resolve_key`, but asks on stdin as a last resort and offers to
    /// persist the answer into `.env`.
    fn resolve_key_with_user(manual: Option<&str>) -> Result<String, TutorError> {
        match Self::resolve_key(manual) {
            Err(TutorError::MissingCredential(_)) => {}
            other => return other,
        }

        print!("{} not found. Enter the API key: ", Self::KEY_NAME);
        io::stdout().flush()?;

        let (sender, receiver) = std::sync::mpsc::channel();
        thread::spawn(move || {
            let mut input = String::new();
            if io::stdin().read_line(&mut input).is_ok() {
                let _ = sender.send(input.trim().to_string());
            }
        });

        let api_key = match receiver.recv_timeout(KEY_PROMPT_TIMEOUT) {
            Ok(input) if !input.is_empty() => input,
            _ => return Err(TutorError::MissingCredential(Self::KEY_NAME)),
        };

        if Self::prompt_save_to_env()? {
            match Self::save_to_env_file(Path::new(".env"), &api_key) {
                Ok(()) => println!("API key saved to .env"),
                Err(e) => warn!(error = %e, "Failed to save API key to .env"),
            }
        }

        Ok(api_key)
    }

    /// Single keystroke y/N question, falling back to a line read when raw mode is unavailable.
    fn prompt_save_to_env() -> Result<bool, TutorError> {
        print!("Add {} to .env? (y/N): ", Self::KEY_NAME);
        io::stdout().flush()?;

        if let Ok(answer) = read_single_key() {
            println!("{}", if answer { "y" } else { "n" });
            return Ok(answer);
        }

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    }

    /// Append `KEY_NAME=value` to the given env file unless the key is already there.
    fn save_to_env_file(path: &Path, api_key: &str) -> io::Result<()> {
        if let Ok(content) = std::fs::read_to_string(path) {
            let prefix = format!("{}=", Self::KEY_NAME);
            if content.lines().any(|line| line.starts_with(&prefix)) {
                return Ok(());
            }
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}={}", Self::KEY_NAME, api_key)
    }
}

fn read_single_key() -> io::Result<bool> {
    terminal::enable_raw_mode()?;
    let answer = poll_yes();
    // Restore the terminal even when polling failed
    terminal::disable_raw_mode()?;
    answer
}

fn poll_yes() -> io::Result<bool> {
    if !event::poll(KEY_PROMPT_TIMEOUT)? {
        return Ok(false);
    }
    Ok(matches!(
        event::read()?,
        Event::Key(KeyEvent { code: KeyCode::Char('y' | 'Y'), .. })
    ))
}

/// Tunables shared by every mode.
#[derive(Debug, Clone, PartialEq)]
pub struct TutorConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub base_url: String,
    /// When set, every completed exchange is saved here as markdown.
    pub transcript_dir: Option<PathBuf>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 2048,
            temperature: 0.7,
            base_url: DEFAULT_BASE_URL.to_string(),
            transcript_dir: None,
        }
    }
}

impl TutorConfig {
    /// Defaults overridden by `TUTOR_*` / `OPENAI_BASE_URL` variables (after loading `.env`).
    /// Unparseable numbers are ignored with a warning.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(model) = lookup("TUTOR_MODEL").filter(|v| !v.trim().is_empty()) {
            config.model = model.trim().to_string();
        }
        if let Some(raw) = lookup("TUTOR_MAX_TOKENS") {
            match raw.trim().parse() {
                Ok(value) => config.max_tokens = value,
                Err(_) => warn!(value = %raw, "Ignoring invalid TUTOR_MAX_TOKENS"),
            }
        }
        if let Some(raw) = lookup("TUTOR_TEMPERATURE") {
            match raw.trim().parse() {
                Ok(value) => config.temperature = value,
                Err(_) => warn!(value = %raw, "Ignoring invalid TUTOR_TEMPERATURE"),
            }
        }
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(dir) = lookup("TUTOR_TRANSCRIPT_DIR").filter(|v| !v.trim().is_empty()) {
            config.transcript_dir = Some(PathBuf::from(dir.trim()));
        }

        config
    }

    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    #[must_use]
    pub fn with_transcript_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.transcript_dir = Some(dir.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct TestKey;

    impl KeyFromEnv for TestKey {
        const KEY_NAME: &'static str = "AI_TUTOR_TEST_KEY_THAT_IS_NEVER_SET";
    }

    #[test]
    fn manual_key_used_when_secret_store_is_empty() {
        let key = TestKey::resolve_key(Some("  sk-manual  ")).unwrap();
        assert_eq!(key, "sk-manual");
    }

    #[test]
    fn missing_key_is_a_credential_error() {
        assert!(matches!(
            TestKey::resolve_key(None),
            Err(TutorError::MissingCredential("AI_TUTOR_TEST_KEY_THAT_IS_NEVER_SET"))
        ));
        assert!(matches!(
            TestKey::resolve_key(Some("   ")),
            Err(TutorError::MissingCredential(_))
        ));
    }

    #[test]
    fn save_to_env_file_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");

        TestKey::save_to_env_file(&path, "first").unwrap();
        TestKey::save_to_env_file(&path, "second").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "AI_TUTOR_TEST_KEY_THAT_IS_NEVER_SET=first\n");
    }

    #[test]
    fn config_overrides_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("TUTOR_MODEL", "gpt-4o-mini"),
            ("TUTOR_MAX_TOKENS", "512"),
            ("TUTOR_TEMPERATURE", "not-a-number"),
            ("OPENAI_BASE_URL", "http://localhost:8080/v1/"),
        ]
        .into_iter()
        .collect();

        let config = TutorConfig::from_lookup(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.temperature, TutorConfig::default().temperature);
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert!(config.transcript_dir.is_none());
    }
}
