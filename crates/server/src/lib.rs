//! TableConfigs Server - HTTP transport for the composite table config lifecycle
//!
//! Exposes [`tableconfigs::TableConfigsController`] over a small REST API.
//! Request bodies reach the controller as raw text so unknown keys can be
//! reported back to the client.
//!
//! # Features
//!
//! - **Middleware**: Compression, CORS, request ID tracking, structured logging
//! - **Configuration**: `server.{toml,json,yaml}` file plus `TABLECONFIGS_SERVER__*` env vars
//! - **Error Handling**: `{"error": {"code", "message", "details"}}` bodies with stable codes
//! - **Observability**: Prometheus metrics, liveness and readiness probes
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /configs` - Every stored composite, ordered by name
//! - `POST /configs` - Create
//! - `POST /configs/validate` - Dry-run validation
//! - `GET /configs/{name}` - Fetch one
//! - `PUT /configs/{name}` - Replace an existing one
//! - `DELETE /configs/{name}` - Delete (idempotent)
//! - `GET /` - API information
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe (store round trip)
//! - `GET /metrics` - Prometheus metrics
//! - `GET /metadata` - Version, store backend and registered tuners

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ServerConfig, StoreBackend, StoreSettings};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, start_server};
pub use state::ServerState;
