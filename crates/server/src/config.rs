use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;
use store::BackendConfig;
use tableconfigs::ControllerConfig;

/// Which metadata store backend to open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    InMemory,
    Redb,
}

/// Metadata store settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreSettings {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Database file, required for `redb`
    #[serde(default)]
    pub path: Option<String>,
}

impl StoreSettings {
    pub fn backend_config(&self) -> anyhow::Result<BackendConfig> {
        match (self.backend, &self.path) {
            (StoreBackend::InMemory, _) => Ok(BackendConfig::in_memory()),
            (StoreBackend::Redb, Some(path)) if !path.trim().is_empty() => {
                Ok(BackendConfig::redb(path.clone()))
            }
            (StoreBackend::Redb, _) => anyhow::bail!("store.path is required for the redb backend"),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum request body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Metrics endpoint enabled
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,

    #[serde(default)]
    pub store: StoreSettings,

    /// Derivation policies
    #[serde(default)]
    pub controller: ControllerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            metrics_enabled: default_true(),
            store: StoreSettings::default(),
            controller: ControllerConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from an optional `server` file and
    /// `TABLECONFIGS_SERVER__*` environment variables.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("TABLECONFIGS_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;

        if config.store.backend == StoreBackend::InMemory {
            tracing::warn!("Using the in-memory store; table configs are lost on restart");
        }

        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.controller.validate()?;
        self.store.backend_config()?;
        if self.max_body_size_mb == 0 {
            anyhow::bail!("max_body_size_mb must be >= 1");
        }
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
