use std::{
    collections::BTreeMap,
    fmt, fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use serde::Deserialize;
use storage::DEFAULT_DATABASE_URL;
use thiserror::Error;
use wizard_core::{http::DEFAULT_API_BASE, mock::DEFAULT_MOCK_DELAY, Locale};

pub const DEFAULT_CONFIG_PATH: &str = "student.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmitMode {
    #[default]
    Mock,
    Http,
}

impl FromStr for SubmitMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "mock" => Ok(SubmitMode::Mock),
            "http" => Ok(SubmitMode::Http),
            other => Err(format!("unknown submit mode '{other}' (expected mock or http)")),
        }
    }
}

impl fmt::Display for SubmitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubmitMode::Mock => "mock",
            SubmitMode::Http => "http",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_base: String,
    pub store_url: String,
    pub submit_mode: SubmitMode,
    pub mock_delay_ms: u64,
    pub locale: Locale,
    pub reset_token: Option<String>,
    pub messages: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.into(),
            store_url: DEFAULT_DATABASE_URL.into(),
            submit_mode: SubmitMode::Mock,
            mock_delay_ms: DEFAULT_MOCK_DELAY.as_millis() as u64,
            locale: Locale::En,
            reset_token: None,
            messages: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base: Option<String>,
    store_url: Option<String>,
    submit_mode: Option<String>,
    mock_delay_ms: Option<u64>,
    locale: Option<String>,
    reset_token: Option<String>,
    #[serde(default)]
    messages: BTreeMap<String, String>,
}

/// Defaults, then the config file (if present), then the environment.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let mut settings = Settings::default();

    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &path, &raw)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && !required => {}
        Err(source) => return Err(ConfigError::Read { path, source }),
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, path: &Path, raw: &str) -> Result<(), ConfigError> {
    let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(v) = file_cfg.api_base {
        settings.api_base = v;
    }
    if let Some(v) = file_cfg.store_url {
        settings.store_url = v;
    }
    if let Some(v) = file_cfg.submit_mode {
        settings.submit_mode = parse_mode(&v)?;
    }
    if let Some(v) = file_cfg.mock_delay_ms {
        settings.mock_delay_ms = v;
    }
    if let Some(v) = file_cfg.locale {
        settings.locale = parse_locale(&v)?;
    }
    if let Some(v) = file_cfg.reset_token {
        settings.reset_token = Some(v);
    }
    settings.messages.extend(file_cfg.messages);
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(v) = lookup("API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = lookup("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = lookup("STORE_URL") {
        settings.store_url = v;
    }
    if let Some(v) = lookup("APP__STORE_URL") {
        settings.store_url = v;
    }

    if let Some(v) = lookup("APP__SUBMIT_MODE") {
        settings.submit_mode = parse_mode(&v)?;
    }

    if let Some(v) = lookup("APP__MOCK_DELAY_MS") {
        settings.mock_delay_ms = v.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: "mock_delay_ms",
            value: v.clone(),
        })?;
    }

    if let Some(v) = lookup("APP__LOCALE") {
        settings.locale = parse_locale(&v)?;
    }

    if let Some(v) = lookup("APP__RESET_TOKEN") {
        settings.reset_token = Some(v);
    }

    Ok(())
}

fn parse_mode(raw: &str) -> Result<SubmitMode, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key: "submit_mode",
        value: raw.to_string(),
    })
}

fn parse_locale(raw: &str) -> Result<Locale, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        key: "locale",
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn empty_environment_keeps_defaults() {
        let mut settings = Settings::default();
        apply_env(&mut settings, |_| None).expect("env");
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.api_base, "http://localhost:8000");
        assert_eq!(settings.mock_delay_ms, 600);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = load_settings(Some(&dir.path().join("nope.toml"))).expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn file_values_and_message_overrides_apply() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("student.toml");
        fs::write(
            &path,
            r#"
api_base = "https://api.example.com"
submit_mode = "http"
locale = "ar"
mock_delay_ms = 10

[messages]
email = "Check the email address"
"#,
        )
        .expect("write");

        let mut settings = Settings::default();
        let raw = fs::read_to_string(&path).expect("read");
        apply_file(&mut settings, &path, &raw).expect("apply");
        assert_eq!(settings.api_base, "https://api.example.com");
        assert_eq!(settings.submit_mode, SubmitMode::Http);
        assert_eq!(settings.locale, Locale::Ar);
        assert_eq!(settings.mock_delay_ms, 10);
        assert_eq!(
            settings.messages.get("email").map(String::as_str),
            Some("Check the email address")
        );
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let mut settings = Settings::default();
        let err = apply_file(&mut settings, Path::new("student.toml"), "api_base = [")
            .expect_err("bad toml");
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn prefixed_env_wins_over_plain_env() {
        let env = HashMap::from([
            ("API_BASE", "http://plain:1"),
            ("APP__API_BASE", "http://prefixed:2"),
            ("STORE_URL", "sqlite::memory:"),
            ("APP__SUBMIT_MODE", "HTTP"),
            ("APP__MOCK_DELAY_MS", "25"),
        ]);
        let mut settings = Settings::default();
        apply_env(&mut settings, |key| env.get(key).map(|v| v.to_string())).expect("env");
        assert_eq!(settings.api_base, "http://prefixed:2");
        assert_eq!(settings.store_url, "sqlite::memory:");
        assert_eq!(settings.submit_mode, SubmitMode::Http);
        assert_eq!(settings.mock_delay_ms, 25);
    }

    #[test]
    fn bad_env_values_are_rejected() {
        let mut settings = Settings::default();
        let err = apply_env(&mut settings, |key| {
            (key == "APP__MOCK_DELAY_MS").then(|| "soon".to_string())
        })
        .expect_err("not a number");
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "mock_delay_ms",
                ..
            }
        ));

        let err = apply_env(&mut Settings::default(), |key| {
            (key == "APP__LOCALE").then(|| "fr".to_string())
        })
        .expect_err("unknown locale");
        assert!(matches!(err, ConfigError::InvalidValue { key: "locale", .. }));
    }
}
