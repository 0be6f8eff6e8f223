use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{bail, Context};
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "account.toml";
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_base_url: String,
    pub data_dir: PathBuf,
    /// `0` turns the client-side avatar size check off.
    pub max_avatar_bytes: usize,
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("account_console");
        Self {
            api_base_url: DEFAULT_API_BASE_URL.into(),
            data_dir,
            max_avatar_bytes: client_core::account_form::DEFAULT_MAX_AVATAR_BYTES,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    pub fn max_avatar_limit(&self) -> Option<usize> {
        (self.max_avatar_bytes > 0).then_some(self.max_avatar_bytes)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then the toml file, then environment overrides.
///
/// An explicitly named config file must exist; the default `account.toml`
/// in the working directory is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let (path, required) = match config_path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", path.display()))?,
        Err(err) if !required && err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config '{}'", path.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok())?;

    settings.api_base_url = normalize_base_url(&settings.api_base_url)?;
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(raw)?;

    if let Some(v) = file_cfg.get("api_base_url") {
        settings.api_base_url = value_text(v);
    }
    if let Some(v) = file_cfg.get("data_dir") {
        settings.data_dir = PathBuf::from(value_text(v));
    }
    if let Some(v) = file_cfg.get("max_avatar_bytes") {
        settings.max_avatar_bytes = parse_number("max_avatar_bytes", &value_text(v))?;
    }
    if let Some(v) = file_cfg.get("request_timeout_secs") {
        settings.request_timeout_secs = parse_number("request_timeout_secs", &value_text(v))?;
    }
    Ok(())
}

fn apply_env(
    settings: &mut Settings,
    var: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<()> {
    if let Some(v) = var("API_BASE_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = var("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = var("APP__DATA_DIR") {
        settings.data_dir = PathBuf::from(v);
    }

    if let Some(v) = var("APP__MAX_AVATAR_BYTES") {
        settings.max_avatar_bytes = parse_number("APP__MAX_AVATAR_BYTES", &v)?;
    }
    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = parse_number("APP__REQUEST_TIMEOUT_SECS", &v)?;
    }
    Ok(())
}

fn value_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, raw: &str) -> anyhow::Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{name} must be a non-negative integer, got '{raw}'"))
}

/// Trims whitespace and trailing slashes and insists on an http(s) URL with a
/// host. Endpoint paths (which start with `/api`) are appended verbatim.
pub fn normalize_base_url(raw: &str) -> anyhow::Result<String> {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok(DEFAULT_API_BASE_URL.to_string());
    }

    let parsed = Url::parse(trimmed).with_context(|| format!("invalid api base url '{raw}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("api base url must use http or https, got '{}'", parsed.scheme());
    }
    if parsed.host_str().is_none() {
        bail!("api base url '{raw}' has no host");
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
