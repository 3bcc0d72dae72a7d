//! Server infrastructure for CoinRates
//!
//! An axum HTTP server with a uniform lifecycle ([`Server`] /
//! [`ServerExt`]), a health endpoint, and `CancellationToken`-based
//! graceful shutdown.
//!
//! # Quick Start
//!
//! ```ignore
//! use server::{HttpServer, Server, ServerConfig, ShutdownController};
//!
//! let shutdown = ShutdownController::with_signals();
//! let server = HttpServer::new(ServerConfig::new("0.0.0.0", 8080), router);
//! server.run(shutdown.child_token()).await?;
//! ```

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod shutdown;
pub mod traits;

pub use config::ServerConfig;
pub use error::{Result, ServerError};
pub use health::{health_routes, DependencyStatus, HealthCheck, HealthState};
pub use http::HttpServer;
pub use shutdown::ShutdownController;
pub use traits::{Server, ServerExt};
