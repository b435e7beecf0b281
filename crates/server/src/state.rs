use crate::config::ServerConfig;
use crate::error::ServerResult;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use store::MetadataStore;
use tableconfigs::{TableConfigsController, TunerRegistry};

/// Shared application state
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// Lifecycle controller (shared across requests)
    pub controller: TableConfigsController,

    /// Prometheus render handle, present when a recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl ServerState {
    /// Open the configured store and build a controller with the built-in tuners.
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        let store: Arc<dyn MetadataStore> = Arc::from(config.store.backend_config()?.build()?);
        let controller = TableConfigsController::new(
            store,
            Arc::new(TunerRegistry::with_defaults()),
            config.controller.clone(),
        );
        Ok(Self::with_controller(config, controller))
    }

    /// Wrap an already built controller.
    pub fn with_controller(config: ServerConfig, controller: TableConfigsController) -> Self {
        Self {
            config: Arc::new(config),
            controller,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Server metadata for health checks
#[derive(Debug, serde::Serialize)]
pub struct ServerMetadata {
    pub version: String,
    pub uptime_seconds: u64,
    pub store_backend: String,
    pub tuners: Vec<String>,
}
