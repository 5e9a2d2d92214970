use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use screenshot_validator::azure::{DEFAULT_API_VERSION, DEFAULT_DEPLOYMENT};
use screenshot_validator::validator::{DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT};
use screenshot_validator::AzureConfig;

pub const DEFAULT_CONFIG_DIR: &str = "configs";

/// Runtime settings for an audit service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Directory holding `<CUSTOMER>_config.json` files
    pub config_dir: PathBuf,
    /// Vision backend credentials; `None` disables screenshot analysis
    pub azure: Option<AzureConfig>,
    pub vision_max_concurrency: usize,
    pub vision_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            azure: None,
            vision_max_concurrency: DEFAULT_MAX_CONCURRENCY,
            vision_timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Settings {
    /// Load settings from environment variables with defaults.
    ///
    /// | Env Var                        | Default              |
    /// |--------------------------------|----------------------|
    /// | `AUDIT_CONFIG_DIR`             | `configs`            |
    /// | `AZURE_OPENAI_API_KEY`         | (vision disabled)    |
    /// | `AZURE_OPENAI_ENDPOINT`        | (vision disabled)    |
    /// | `AZURE_OPENAI_API_VERSION`     | `2024-08-01-preview` |
    /// | `AZURE_OPENAI_DEPLOYMENT_NAME` | `gpt-5.1`            |
    /// | `VISION_MAX_CONCURRENCY`       | `4`                  |
    /// | `VISION_TIMEOUT_SECS`          | `60`                 |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] with an arbitrary variable source.
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config_dir = var("AUDIT_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));

        let azure = match (var("AZURE_OPENAI_API_KEY"), var("AZURE_OPENAI_ENDPOINT")) {
            (Some(api_key), Some(endpoint)) => Some(AzureConfig {
                api_key,
                endpoint,
                api_version: var("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
                deployment: var("AZURE_OPENAI_DEPLOYMENT_NAME")
                    .unwrap_or_else(|| DEFAULT_DEPLOYMENT.to_string()),
            }),
            _ => None,
        };

        let vision_max_concurrency = parse_or_default(
            "VISION_MAX_CONCURRENCY",
            var("VISION_MAX_CONCURRENCY"),
            DEFAULT_MAX_CONCURRENCY,
        )
        .max(1);
        let vision_timeout = Duration::from_secs(parse_or_default(
            "VISION_TIMEOUT_SECS",
            var("VISION_TIMEOUT_SECS"),
            DEFAULT_TIMEOUT.as_secs(),
        ));

        Self {
            config_dir,
            azure,
            vision_max_concurrency,
            vision_timeout,
        }
    }

    pub fn with_config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = config_dir.into();
        self
    }

    pub fn vision_enabled(&self) -> bool {
        self.azure.is_some()
    }
}

fn parse_or_default<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + Copy + std::fmt::Display,
{
    match raw {
        None => default,
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid {}={:?}, using default {}", key, raw, default);
            default
        }),
    }
}
