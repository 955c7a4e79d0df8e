//! Server configuration
//!
//! Loaded from, in order:
//! 1. the TOML file named by `SINK_CONFIG`
//! 2. `./sink.toml`
//! 3. built-in defaults

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Result, SinkError};
use crate::fault::{FaultInjector, FaultSource, RandomSource};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "SINK_CONFIG";

/// Config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sink.toml";

/// Server configuration loaded from TOML or defaults
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// HTTP server address
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Deadline for reading a request body
    #[serde(default = "default_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Deadline for producing a response
    #[serde(default = "default_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Largest accepted request body
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Share of POSTs failed with 503, in percent
    #[serde(default = "default_failure_rate_percent")]
    pub failure_rate_percent: u32,

    /// Seed for the fault draws (None = OS entropy)
    #[serde(default)]
    pub fault_seed: Option<u64>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:9009".to_string()
}

fn default_timeout_ms() -> u64 {
    2_000
}

fn default_max_body_bytes() -> usize {
    1024 * 1024 // 1MB
}

fn default_failure_rate_percent() -> u32 {
    20
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            read_timeout_ms: default_timeout_ms(),
            write_timeout_ms: default_timeout_ms(),
            max_body_bytes: default_max_body_bytes(),
            failure_rate_percent: default_failure_rate_percent(),
            fault_seed: None,
        }
    }
}

impl ServerConfig {
    /// Parse a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(content).map_err(|e| SinkError::Configuration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Reject settings the server cannot run with
    pub fn validate(&self) -> Result<()> {
        self.socket_addr()?;
        if self.failure_rate_percent > 100 {
            return Err(SinkError::Configuration(format!(
                "failure_rate_percent must be at most 100, got {}",
                self.failure_rate_percent
            )));
        }
        if self.read_timeout_ms == 0 || self.write_timeout_ms == 0 {
            return Err(SinkError::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Parsed listen address
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr.parse().map_err(|e| {
            SinkError::Configuration(format!("invalid listen_addr {:?}: {}", self.listen_addr, e))
        })
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }

    /// Upper bound for a whole request: reading, then writing
    pub fn request_deadline(&self) -> Duration {
        self.read_timeout() + self.write_timeout()
    }

    /// Build the fault injector described by this config
    pub fn fault_injector(&self) -> Result<FaultInjector> {
        let source: Arc<dyn FaultSource> = match self.fault_seed {
            Some(seed) => Arc::new(RandomSource::seeded(seed)),
            None => Arc::new(RandomSource::from_entropy()),
        };
        FaultInjector::new(source, self.failure_rate_percent)
    }
}

/// Load configuration from file or environment
pub fn load_config() -> ServerConfig {
    // Check environment variable first
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        match ServerConfig::from_file(&path) {
            Ok(config) => {
                info!(path = %path, "Loaded configuration from file");
                return config;
            }
            Err(e) => {
                warn!(path = %path, error = %e, "Failed to load config file, using defaults");
                return ServerConfig::default();
            }
        }
    }

    // Check default config file
    if Path::new(DEFAULT_CONFIG_FILE).exists() {
        match ServerConfig::from_file(DEFAULT_CONFIG_FILE) {
            Ok(config) => {
                info!("Loaded configuration from {}", DEFAULT_CONFIG_FILE);
                return config;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load {}, using defaults", DEFAULT_CONFIG_FILE);
            }
        }
    }

    info!("Using default configuration");
    ServerConfig::default()
}
