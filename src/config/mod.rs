//! Configuration for talking to the patient service
//!
//! Values are layered: built-in defaults, then a TOML file, then
//! `TRIAGE_*` environment variables, then command-line overrides.
//! Credentials are never defaulted; [`TriageConfig::validate`] rejects a
//! configuration without them before any request is made.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::client::RetryPolicy;
use crate::error::{Error, Result};

pub const ENV_API_KEY: &str = "TRIAGE_API_KEY";
pub const ENV_BASE_URL: &str = "TRIAGE_BASE_URL";
pub const ENV_PAGE_LIMIT: &str = "TRIAGE_PAGE_LIMIT";

/// Default location of the config file, if the platform has one
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "patient-triage", "patient-triage")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Records requested per page
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,

    /// Fixed pause before each page after the first
    #[serde(default = "default_inter_page_delay", with = "humantime_serde")]
    pub inter_page_delay: Duration,

    /// Per-request timeout
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_page_limit() -> u32 {
    20
}

fn default_inter_page_delay() -> Duration {
    Duration::from_millis(500)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            page_limit: default_page_limit(),
            inter_page_delay: default_inter_page_delay(),
            request_timeout: default_request_timeout(),
            retry: RetryPolicy::default(),
        }
    }
}

impl TriageConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load defaults, then the config file, then the process environment.
    ///
    /// An explicit `path` must exist; the default location is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(default) => {
                    debug!("Loading config from {}", default.display());
                    Self::from_file(&default)?
                }
                None => Self::default(),
            },
        };

        config.merge_env_vars();
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_env_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable source.
    pub fn merge_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(api_key) = lookup(ENV_API_KEY) {
            self.api_key = Some(api_key);
        }

        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.base_url = Some(base_url);
        }

        if let Some(limit) = lookup(ENV_PAGE_LIMIT) {
            if let Ok(value) = limit.trim().parse::<u32>() {
                self.page_limit = value;
            }
        }
    }

    /// Apply command-line overrides; `None` leaves a value untouched.
    pub fn apply_overrides(
        &mut self,
        api_key: Option<String>,
        base_url: Option<String>,
        page_limit: Option<u32>,
    ) {
        if api_key.is_some() {
            self.api_key = api_key;
        }
        if base_url.is_some() {
            self.base_url = base_url;
        }
        if let Some(limit) = page_limit {
            self.page_limit = limit;
        }
    }

    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config(format!("API key is required (set {ENV_API_KEY})")))
    }

    /// Base URL without a trailing slash
    pub fn base_url(&self) -> Result<&str> {
        self.base_url
            .as_deref()
            .map(|u| u.trim().trim_end_matches('/'))
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config(format!("Base URL is required (set {ENV_BASE_URL})")))
    }

    /// Check every precondition for talking to the service.
    pub fn validate(&self) -> Result<()> {
        self.api_key()?;

        let base_url = self.base_url()?;
        let parsed = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Base URL must use http or https: {base_url}"
            )));
        }

        if self.page_limit == 0 {
            return Err(Error::Config("page_limit must be at least 1".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config("retry.max_attempts must be at least 1".into()));
        }

        Ok(())
    }
}
