use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::tasks::DEFAULT_PAGE_SIZE;
use crate::tomlfile::{self, Visibility};

pub const API_URL_ENV: &str = "TASKDECK_API_URL";

const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api/v1";
const MIN_PAGE_SIZE: usize = 1;
const MAX_PAGE_SIZE: usize = 100;
const MIN_FETCH_LIMIT: u64 = 1;
const MAX_FETCH_LIMIT: u64 = 1_000;
const DEFAULT_FETCH_LIMIT: u64 = 100;
const MAX_REQUEST_TIMEOUT_SECS: u64 = 300;

pub const SETTING_KEYS: [&str; 4] = [
    "api_base_url",
    "page_size",
    "fetch_limit",
    "request_timeout_secs",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub page_size: usize,
    pub fetch_limit: u64,
    /// 0 disables the client timeout.
    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            fetch_limit: DEFAULT_FETCH_LIMIT,
            request_timeout_secs: 0,
        }
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("taskdeck").join("settings.toml"))
    }

    /// Settings from the config file, or defaults when there is none.
    /// Out-of-range values are clamped on the way in.
    pub fn load() -> Self {
        Self::config_path()
            .map(|path| Self::load_from_path(&path))
            .unwrap_or_default()
    }

    fn load_from_path(path: &Path) -> Self {
        let mut settings: Self = tomlfile::read(path).unwrap_or_default();
        settings.validate();
        settings
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path().ok_or_else(|| anyhow!("unable to determine config path"))?;
        self.save_to_path(&path)
    }

    fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        let mut clamped = self.clone();
        clamped.validate();
        tomlfile::write(path, &clamped, Visibility::Shared)
            .with_context(|| format!("failed to save settings to '{}'", path.display()))
    }

    /// API base URL after overrides: the CLI flag wins over the environment,
    /// which wins over the settings file.
    pub fn resolve_api_url(&self, cli_override: Option<&str>) -> String {
        let env_value = std::env::var(API_URL_ENV).ok();
        self.resolve_api_url_with(cli_override, env_value.as_deref())
    }

    fn resolve_api_url_with(&self, cli_override: Option<&str>, env_value: Option<&str>) -> String {
        [cli_override, env_value]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(normalize_base_url)
            .unwrap_or_else(|| self.api_base_url.clone())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0).then(|| Duration::from_secs(self.request_timeout_secs))
    }

    pub fn get(&self, key: &str) -> anyhow::Result<String> {
        let value = match key {
            "api_base_url" => self.api_base_url.clone(),
            "page_size" => self.page_size.to_string(),
            "fetch_limit" => self.fetch_limit.to_string(),
            "request_timeout_secs" => self.request_timeout_secs.to_string(),
            other => bail!(
                "unknown setting '{other}' (expected one of: {})",
                SETTING_KEYS.join(", ")
            ),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        let value = value.trim();
        match key {
            "api_base_url" => {
                if !value.starts_with("http://") && !value.starts_with("https://") {
                    bail!("api_base_url must start with http:// or https://");
                }
                self.api_base_url = value.to_string();
            }
            "page_size" => {
                self.page_size = value
                    .parse()
                    .with_context(|| format!("invalid page_size '{value}'"))?;
            }
            "fetch_limit" => {
                self.fetch_limit = value
                    .parse()
                    .with_context(|| format!("invalid fetch_limit '{value}'"))?;
            }
            "request_timeout_secs" => {
                self.request_timeout_secs = value
                    .parse()
                    .with_context(|| format!("invalid request_timeout_secs '{value}'"))?;
            }
            other => bail!(
                "unknown setting '{other}' (expected one of: {})",
                SETTING_KEYS.join(", ")
            ),
        }
        self.validate();
        Ok(())
    }

    fn validate(&mut self) {
        self.page_size = self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        self.fetch_limit = self.fetch_limit.clamp(MIN_FETCH_LIMIT, MAX_FETCH_LIMIT);
        self.request_timeout_secs = self.request_timeout_secs.min(MAX_REQUEST_TIMEOUT_SECS);

        let trimmed = self.api_base_url.trim();
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            self.api_base_url = normalize_base_url(trimmed);
        } else {
            warn!(
                "invalid api_base_url '{}' in settings config; falling back to {}",
                self.api_base_url, DEFAULT_API_BASE_URL
            );
            self.api_base_url = DEFAULT_API_BASE_URL.to_string();
        }
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
