use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image";

/// Runtime settings for the generation tools.
///
/// Built once at startup and handed to [`GeminiApi`](crate::llm::GeminiApi)
/// by reference; nothing else reads the environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// API credential. Required by every remote tool.
    pub api_key: Option<String>,
    /// Base URL of the generative API.
    pub base_url: String,
    /// Model used for drawings and layouts.
    pub text_model: String,
    /// Model used for renders and edits.
    pub image_model: String,
    /// Per request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Additional attempts after a transient failure.
    pub max_retries: usize,
    /// Delay between attempts in milliseconds.
    pub retry_delay_ms: u64,
    /// Upper bound on a single rasterization in seconds.
    pub raster_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.into(),
            text_model: DEFAULT_TEXT_MODEL.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            request_timeout_secs: 120,
            max_retries: 1,
            retry_delay_ms: 500,
            raster_timeout_secs: 30,
        }
    }
}

impl Config {
    /// Defaults plus the credential from [`API_KEY_ENV`], if set.
    pub fn from_env() -> Self {
        Self::default().with_env()
    }

    /// Load a [`Config`] from a TOML file. Missing fields keep their defaults
    /// and an unset `api_key` is filled from the environment.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use archigen::Config;
    /// # tokio_test::block_on(async {
    /// let cfg = Config::load("archigen.toml").await.unwrap();
    /// assert_eq!(cfg.max_retries, 1);
    /// # });
    /// ```
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = tokio::fs::read_to_string(path).await?;
        Ok(Self::parse(&text)?.with_env())
    }

    /// Parse TOML text without consulting the environment.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    fn with_env(mut self) -> Self {
        if self.api_key.is_none() {
            self.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|k| !k.trim().is_empty());
        }
        self
    }

    /// Override the credential, e.g. from a command line flag.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// The credential, or [`ConfigError::MissingCredential`] when absent.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(ConfigError::MissingCredential)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn raster_timeout(&self) -> Duration {
        Duration::from_secs(self.raster_timeout_secs)
    }
}
