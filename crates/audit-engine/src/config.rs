//! Customer-specific threshold configuration
//!
//! A document identifier (usually the workbook file name) maps to a customer
//! key through a fixed prefix table. Each key may have a JSON file
//! `<KEY>_config.json` in the configuration directory overriding numeric
//! limits. A missing key or file means "use the built-in defaults".

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filename prefixes that identify a customer directly
pub const CUSTOMER_PREFIXES: &[&str] = &["TBS", "BSW", "COREX", "SONOCO"];

/// Legacy names that map onto a current customer's configuration
pub const CUSTOMER_ALIASES: &[(&str, &str)] = &[("EVIOSYS", "SONOCO")];

/// Metric keys accepted from older configuration files
const LEGACY_METRIC_KEYS: &[(&str, &str)] = &[
    ("dump_count_today", "dumps_today"),
    ("dump_count_yesterday", "dumps_yesterday"),
];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Per-metric override with an optional hard limit and warning tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub thresholds: BTreeMap<String, ThresholdOverride>,
}

impl CustomerConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    fn entry(&self, metric: &str) -> Option<&ThresholdOverride> {
        self.thresholds.get(metric).or_else(|| {
            LEGACY_METRIC_KEYS
                .iter()
                .find(|(canonical, _)| *canonical == metric)
                .and_then(|(_, legacy)| self.thresholds.get(*legacy))
        })
    }
}

/// Resolve the hard limit for a metric, falling back to `default`
pub fn threshold(config: Option<&CustomerConfig>, metric: &str, default: f64) -> f64 {
    config
        .and_then(|c| c.entry(metric))
        .and_then(|t| t.max)
        .unwrap_or(default)
}

/// Resolve the warning tier for a metric, falling back to `default`
pub fn warning_threshold(config: Option<&CustomerConfig>, metric: &str, default: f64) -> f64 {
    config
        .and_then(|c| c.entry(metric))
        .and_then(|t| t.warning)
        .unwrap_or(default)
}

/// Detect the customer key from a document identifier's file stem
pub fn detect_customer(identifier: &str) -> Option<&'static str> {
    let stem = Path::new(identifier)
        .file_stem()
        .map(|s| s.to_string_lossy().to_uppercase())
        .unwrap_or_default();

    if let Some(prefix) = CUSTOMER_PREFIXES.iter().find(|p| stem.starts_with(*p)) {
        return Some(*prefix);
    }

    CUSTOMER_ALIASES
        .iter()
        .find(|(alias, _)| stem.contains(alias))
        .map(|(_, customer)| *customer)
}

/// Locates and loads customer configuration files
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    config_dir: PathBuf,
}

impl ConfigResolver {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self, customer: &str) -> PathBuf {
        self.config_dir.join(format!("{}_config.json", customer))
    }

    /// Resolve the configuration for a document.
    ///
    /// `Ok(None)` means no customer was detected or no file exists for it;
    /// the caller should use defaults. A file that exists but cannot be read
    /// or parsed is an error.
    pub fn resolve(&self, identifier: &str) -> Result<Option<CustomerConfig>, ConfigError> {
        let Some(customer) = detect_customer(identifier) else {
            tracing::info!("Unknown customer format, using default thresholds");
            return Ok(None);
        };

        let path = self.config_path(customer);
        if !path.exists() {
            tracing::info!("No config found for {}, using defaults", customer);
            return Ok(None);
        }

        let json = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let config = CustomerConfig::from_json(&json).map_err(|source| ConfigError::Parse {
            path: path.clone(),
            source,
        })?;

        tracing::info!(
            "Loaded {} customer configuration ({} threshold overrides)",
            config.customer.as_deref().unwrap_or(customer),
            config.thresholds.len()
        );

        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = r#"{
        "customer": "TBS",
        "thresholds": {
            "dump_count_today": { "max": 10, "warning": 5 },
            "response_time_smlg": { "warning": 800 },
            "dumps_yesterday": { "max": 40 }
        }
    }"#;

    #[test]
    fn test_detect_customer_prefixes() {
        assert_eq!(detect_customer("TBS_DAILY_MONITORING_20_JAN_2026.xlsx"), Some("TBS"));
        assert_eq!(detect_customer("/data/corex-daily.xlsx"), Some("COREX"));
        assert_eq!(detect_customer("bsw_checks.xlsx"), Some("BSW"));
        assert_eq!(detect_customer("ACME_DAILY.xlsx"), None);
    }

    #[test]
    fn test_detect_customer_alias() {
        assert_eq!(detect_customer("Daily_EVIOSYS_checks.xlsx"), Some("SONOCO"));
    }

    #[test]
    fn test_prefix_only_matches_file_stem() {
        assert_eq!(detect_customer("/TBS/ACME_DAILY.xlsx"), None);
    }

    #[test]
    fn test_threshold_lookup_levels() {
        let config = CustomerConfig::from_json(SAMPLE).unwrap();

        // config → metric → tier
        assert_eq!(threshold(Some(&config), "dump_count_today", 50.0), 10.0);
        assert_eq!(warning_threshold(Some(&config), "dump_count_today", 40.0), 5.0);
        // metric present, tier absent
        assert_eq!(threshold(Some(&config), "response_time_smlg", 1000.0), 1000.0);
        assert_eq!(warning_threshold(Some(&config), "response_time_smlg", 900.0), 800.0);
        // metric absent
        assert_eq!(threshold(Some(&config), "failed_jobs", 10.0), 10.0);
        // no config
        assert_eq!(threshold(None, "dump_count_today", 50.0), 50.0);
    }

    #[test]
    fn test_legacy_metric_key() {
        let config = CustomerConfig::from_json(SAMPLE).unwrap();
        assert_eq!(threshold(Some(&config), "dump_count_yesterday", 100.0), 40.0);
    }

    #[test]
    fn test_resolve_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let resolver = ConfigResolver::new(dir.path());
        assert_eq!(resolver.resolve("TBS_daily.xlsx").unwrap(), None);
        assert_eq!(resolver.resolve("unknown.xlsx").unwrap(), None);
    }

    #[test]
    fn test_resolve_reads_customer_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("SONOCO_config.json"), SAMPLE).unwrap();
        let resolver = ConfigResolver::new(dir.path());

        let config = resolver.resolve("EVIOSYS_DAILY.xlsx").unwrap().unwrap();
        assert_eq!(config.thresholds["dump_count_today"].max, Some(10.0));
    }

    #[test]
    fn test_resolve_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("BSW_config.json"), "{ not json").unwrap();
        let resolver = ConfigResolver::new(dir.path());

        let err = resolver.resolve("BSW_daily.xlsx").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
