//! Controller configuration.
//!
//! Settings for the derivation policies applied on create and update. The
//! server embeds this block under its `controller` section:
//!
//! ```yaml
//! controller:
//!   min_replicas: 2
//!   dim_table_max_size: "200M"
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::table::parse_data_size;

/// Errors that can occur when validating a [`ControllerConfig`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("min_replicas must be >= 1")]
    ZeroMinReplicas,

    #[error("dim_table_max_size '{0}' is not a data size such as 200M")]
    InvalidDimTableMaxSize(String),
}

/// Derivation policy settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    /// Floor for declared replication counts.
    #[serde(default = "default_min_replicas")]
    pub min_replicas: u32,

    /// Storage quota injected into dimension tables that declare none.
    #[serde(default = "default_dim_table_max_size")]
    pub dim_table_max_size: String,
}

impl ControllerConfig {
    pub fn with_min_replicas(mut self, min_replicas: u32) -> Self {
        self.min_replicas = min_replicas;
        self
    }

    pub fn with_dim_table_max_size(mut self, size: impl Into<String>) -> Self {
        self.dim_table_max_size = size.into();
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_replicas == 0 {
            return Err(ConfigError::ZeroMinReplicas);
        }
        if parse_data_size(&self.dim_table_max_size).is_none() {
            return Err(ConfigError::InvalidDimTableMaxSize(
                self.dim_table_max_size.clone(),
            ));
        }
        Ok(())
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            min_replicas: default_min_replicas(),
            dim_table_max_size: default_dim_table_max_size(),
        }
    }
}

fn default_min_replicas() -> u32 {
    1
}

fn default_dim_table_max_size() -> String {
    "200M".to_string()
}
