//! Configuration for LedgerX.
//!
//! Settings come from three layers, lowest precedence first:
//!
//! 1. built-in defaults
//! 2. `~/.ledgerx/config.toml`
//! 3. environment overrides (`LEDGERX_API_URL`, `LEDGERX_ACCOUNT_A`, `LEDGERX_ACCOUNT_B`)
//!
//! String values in the file may reference environment variables as `${VAR}`.
//!
//! ```toml
//! [api]
//! base_url = "${LEDGER_HOST}"
//! health_path = "/api/v1/health"
//!
//! [accounts]
//! source = "ACC-A-001"
//! destination = "ACC-B-001"
//!
//! [readiness]
//! max_wait_secs = 300
//!
//! [stress]
//! concurrency = 50
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use url::Url;

use ledgerx_types::{AccountNumber, Amount};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_HEALTH_PATH: &str = "/api/v1/health";
pub const DEFAULT_ACCOUNT_A: &str = "ACC-A-001";
pub const DEFAULT_ACCOUNT_B: &str = "ACC-B-001";
pub const DEFAULT_CURRENCY: &str = "USD";

pub const ENV_API_URL: &str = "LEDGERX_API_URL";
pub const ENV_ACCOUNT_A: &str = "LEDGERX_ACCOUNT_A";
pub const ENV_ACCOUNT_B: &str = "LEDGERX_ACCOUNT_B";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid base URL '{value}': {reason}")]
    InvalidBaseUrl { value: String, reason: String },
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerxConfig {
    pub api: Option<ApiConfig>,
    pub accounts: Option<AccountsConfig>,
    pub readiness: Option<ReadinessConfig>,
    pub dashboard: Option<DashboardConfig>,
    pub stress: Option<StressConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: Option<String>,
    pub health_path: Option<String>,
    pub connect_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    pub source: Option<String>,
    pub destination: Option<String>,
    pub currency: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReadinessConfig {
    pub attempt_timeout_secs: Option<u64>,
    pub retry_interval_secs: Option<u64>,
    pub max_wait_secs: Option<u64>,
    pub ready_flash_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DashboardConfig {
    pub poll_interval_ms: Option<u64>,
    pub balance_flash_ms: Option<u64>,
    pub recent_limit: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StressConfig {
    pub concurrency: Option<usize>,
    pub amount: Option<f64>,
}

/// Fully resolved settings with every default applied.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: Url,
    pub health_path: String,
    pub connect_timeout: Duration,
    pub account_a: AccountNumber,
    pub account_b: AccountNumber,
    pub currency: String,
    pub attempt_timeout: Duration,
    pub retry_interval: Duration,
    pub max_wait: Duration,
    pub ready_flash: Duration,
    pub poll_interval: Duration,
    pub balance_flash: Duration,
    pub recent_limit: u32,
    pub page_size: u32,
    pub stress_concurrency: usize,
    pub stress_amount: Amount,
}

/// Expand `${VAR}` references. Unset variables expand to nothing; an
/// unterminated `${` is kept literally.
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let var = &after[..end];
                if !var.is_empty() {
                    out.push_str(&env::var(var).unwrap_or_default());
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidBaseUrl {
        value: raw.to_string(),
        reason,
    };
    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid("missing host".to_string()));
    }
    Ok(url)
}

fn non_blank(value: Option<&String>) -> Option<String> {
    value
        .map(|raw| expand_env_vars(raw).trim().to_string())
        .filter(|expanded| !expanded.is_empty())
}

fn positive_secs(
    field: &'static str,
    value: Option<u64>,
    default: u64,
) -> Result<Duration, ConfigError> {
    match value.unwrap_or(default) {
        0 => Err(ConfigError::invalid(field, "must be greater than 0")),
        secs => Ok(Duration::from_secs(secs)),
    }
}

fn positive_millis(
    field: &'static str,
    value: Option<u64>,
    default: u64,
) -> Result<Duration, ConfigError> {
    match value.unwrap_or(default) {
        0 => Err(ConfigError::invalid(field, "must be greater than 0")),
        ms => Ok(Duration::from_millis(ms)),
    }
}

fn account(field: &'static str, raw: String) -> Result<AccountNumber, ConfigError> {
    AccountNumber::new(raw).map_err(|e| ConfigError::invalid(field, e.to_string()))
}

impl LedgerxConfig {
    /// Load from the default location. `Ok(None)` when no file exists.
    pub fn load() -> Result<Option<Self>, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(None),
        }
    }

    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| {
            tracing::warn!("Failed to read config at {}: {source}", path.display());
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        toml::from_str(&content).map(Some).map_err(|source| {
            tracing::warn!("Failed to parse config at {}: {source}", path.display());
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    /// Resolve against the process environment.
    pub fn resolve(&self) -> Result<Settings, ConfigError> {
        self.resolve_with(|key| env::var(key).ok())
    }

    /// Resolve with a custom environment lookup for the override variables.
    pub fn resolve_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Settings, ConfigError> {
        let env_value = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api = self.api.as_ref();
        let accounts = self.accounts.as_ref();
        let readiness = self.readiness.as_ref();
        let dashboard = self.dashboard.as_ref();
        let stress = self.stress.as_ref();

        let base_url = env_value(ENV_API_URL)
            .or_else(|| non_blank(api.and_then(|a| a.base_url.as_ref())))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let base_url = parse_base_url(&base_url)?;

        let health_path = non_blank(api.and_then(|a| a.health_path.as_ref()))
            .unwrap_or_else(|| DEFAULT_HEALTH_PATH.to_string());
        if !health_path.starts_with('/') {
            return Err(ConfigError::invalid(
                "api.health_path",
                format!("'{health_path}' must start with '/'"),
            ));
        }

        let account_a = env_value(ENV_ACCOUNT_A)
            .or_else(|| non_blank(accounts.and_then(|a| a.source.as_ref())))
            .unwrap_or_else(|| DEFAULT_ACCOUNT_A.to_string());
        let account_b = env_value(ENV_ACCOUNT_B)
            .or_else(|| non_blank(accounts.and_then(|a| a.destination.as_ref())))
            .unwrap_or_else(|| DEFAULT_ACCOUNT_B.to_string());
        let account_a = account("accounts.source", account_a)?;
        let account_b = account("accounts.destination", account_b)?;
        if account_a == account_b {
            return Err(ConfigError::invalid(
                "accounts.destination",
                "must differ from accounts.source",
            ));
        }

        let currency = non_blank(accounts.and_then(|a| a.currency.as_ref()))
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());

        let stress_amount = stress.and_then(|s| s.amount).unwrap_or(1.0);
        let stress_amount = Amount::new(stress_amount)
            .map_err(|e| ConfigError::invalid("stress.amount", e.to_string()))?;
        let stress_concurrency = match stress.and_then(|s| s.concurrency).unwrap_or(50) {
            0 => return Err(ConfigError::invalid("stress.concurrency", "must be greater than 0")),
            n => n,
        };

        let settings = Settings {
            base_url,
            health_path,
            connect_timeout: positive_secs(
                "api.connect_timeout_secs",
                api.and_then(|a| a.connect_timeout_secs),
                10,
            )?,
            account_a,
            account_b,
            currency,
            attempt_timeout: positive_secs(
                "readiness.attempt_timeout_secs",
                readiness.and_then(|r| r.attempt_timeout_secs),
                15,
            )?,
            retry_interval: positive_secs(
                "readiness.retry_interval_secs",
                readiness.and_then(|r| r.retry_interval_secs),
                30,
            )?,
            max_wait: positive_secs(
                "readiness.max_wait_secs",
                readiness.and_then(|r| r.max_wait_secs),
                5 * 60,
            )?,
            ready_flash: positive_millis(
                "readiness.ready_flash_ms",
                readiness.and_then(|r| r.ready_flash_ms),
                1500,
            )?,
            poll_interval: positive_millis(
                "dashboard.poll_interval_ms",
                dashboard.and_then(|d| d.poll_interval_ms),
                2000,
            )?,
            balance_flash: positive_millis(
                "dashboard.balance_flash_ms",
                dashboard.and_then(|d| d.balance_flash_ms),
                700,
            )?,
            recent_limit: dashboard.and_then(|d| d.recent_limit).unwrap_or(20).max(1),
            page_size: dashboard.and_then(|d| d.page_size).unwrap_or(20).max(1),
            stress_concurrency,
            stress_amount,
        };

        tracing::debug!(base_url = %settings.base_url, "Resolved settings");
        Ok(settings)
    }
}

#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".ledgerx").join("config.toml"))
}
