//! Configuration loading and config file resolution
//!
//! Bootstrap configuration comes from a TOML file. Every field is optional;
//! missing fields fall back to compiled defaults. Command-line flags and
//! environment variables are layered on top by the binary.
//!
//! Config file resolution priority:
//! 1. Explicit path (command-line argument)
//! 2. `NUMCLASS_CONFIG` environment variable
//! 3. Platform config directory (`~/.config/numclass/config.toml` on Linux)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "NUMCLASS_CONFIG";

/// Default listening port
pub const DEFAULT_PORT: u16 = 8000;

/// Default trivia service base URL
pub const DEFAULT_TRIVIA_URL: &str = "http://numbersapi.com";

const MIN_TIMEOUT_MS: u64 = 50;
const MAX_TIMEOUT_MS: u64 = 10_000;
const MIN_FAIL_FAST_MS: u64 = 1;
const MAX_FAIL_FAST_MS: u64 = 1_000;
const MAX_RETRIES: u32 = 1;

/// How the fun fact is reconciled with the classification response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryPolicy {
    /// Await the fetch (bounded) before responding
    #[default]
    Inline,
    /// Respond immediately; fetch on a spawned task, poll for the result
    Deferred,
    /// Respond immediately; fetch on a bounded worker pool, poll for the result
    Pool,
    /// Await the fetch with a very short budget
    FailFast,
}

impl DeliveryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryPolicy::Inline => "inline",
            DeliveryPolicy::Deferred => "deferred",
            DeliveryPolicy::Pool => "pool",
            DeliveryPolicy::FailFast => "fail_fast",
        }
    }

    /// True when the response leaves before the fetch completes
    pub fn is_background(&self) -> bool {
        matches!(self, DeliveryPolicy::Deferred | DeliveryPolicy::Pool)
    }
}

impl fmt::Display for DeliveryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "inline" => Ok(DeliveryPolicy::Inline),
            "deferred" => Ok(DeliveryPolicy::Deferred),
            "pool" => Ok(DeliveryPolicy::Pool),
            "fail_fast" => Ok(DeliveryPolicy::FailFast),
            other => Err(Error::Config(format!(
                "unknown delivery policy '{}' (expected inline, deferred, pool or fail_fast)",
                other
            ))),
        }
    }
}

/// Body format returned by the trivia service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Plain text body
    #[default]
    Text,
    /// JSON object with a `text` field
    Json,
}

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TomlConfig {
    /// Listening address
    pub host: String,

    /// Listening port
    pub port: u16,

    /// Trivia enrichment settings
    pub trivia: TriviaConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            trivia: TriviaConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Trivia source and delivery policy settings
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TriviaConfig {
    /// Base URL of the trivia service; the number is appended as a path segment
    pub base_url: String,

    /// Optional category path segment appended after the number (e.g. "math")
    pub category: Option<String>,

    /// Upstream body format
    pub format: ResponseFormat,

    /// Delivery policy
    pub policy: DeliveryPolicy,

    /// Fetch budget for inline, deferred and pool policies
    pub timeout_ms: u64,

    /// Fetch budget for the fail-fast policy
    pub fail_fast_timeout_ms: u64,

    /// Extra attempts after a transport failure (0 or 1)
    pub retries: u32,

    /// Pool worker count; 0 means twice the available parallelism
    pub pool_size: usize,

    /// Pending job bound for the pool policy
    pub queue_capacity: usize,

    /// How long deferred results stay retrievable
    pub ticket_ttl_secs: u64,
}

impl Default for TriviaConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_TRIVIA_URL.to_string(),
            category: Some("math".to_string()),
            format: ResponseFormat::Text,
            policy: DeliveryPolicy::Inline,
            timeout_ms: 1_000,
            fail_fast_timeout_ms: 50,
            retries: 0,
            pool_size: 0,
            queue_capacity: 64,
            ticket_ttl_secs: 300,
        }
    }
}

impl TriviaConfig {
    /// Fetch budget for `policy`, clamped to sane bounds
    pub fn budget_for(&self, policy: DeliveryPolicy) -> Duration {
        let ms = match policy {
            DeliveryPolicy::FailFast => self
                .fail_fast_timeout_ms
                .clamp(MIN_FAIL_FAST_MS, MAX_FAIL_FAST_MS),
            _ => self.timeout_ms.clamp(MIN_TIMEOUT_MS, MAX_TIMEOUT_MS),
        };
        Duration::from_millis(ms)
    }

    /// Budget for the configured policy
    pub fn budget(&self) -> Duration {
        self.budget_for(self.policy)
    }

    /// Retry count capped at one
    pub fn effective_retries(&self) -> u32 {
        self.retries.min(MAX_RETRIES)
    }

    /// Worker count, resolving 0 to twice the available parallelism
    pub fn effective_pool_size(&self) -> usize {
        if self.pool_size > 0 {
            return self.pool_size;
        }
        std::thread::available_parallelism()
            .map(|n| n.get() * 2)
            .unwrap_or(4)
    }

    /// Queue bound, never zero
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.max(1)
    }

    pub fn ticket_ttl(&self) -> Duration {
        Duration::from_secs(self.ticket_ttl_secs.max(1))
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Load configuration from a file that must exist
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    /// Load configuration, falling back to defaults when no file exists
    ///
    /// A missing file is logged and ignored. A file that exists but cannot be
    /// parsed is an error.
    pub fn load_or_default(cli_path: Option<&Path>) -> Result<Self> {
        let Some(path) = resolve_config_path(cli_path) else {
            info!("No config file location available, using built-in defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!(
                "Config file not found at {}, using built-in defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let config = Self::load(&path)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Resolve the config file path (argument, then environment, then platform default)
pub fn resolve_config_path(cli_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_path {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path()
}

/// Platform config file location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("numclass").join("config.toml"))
}
