//! FundX crowdfunding backend.
//!
//! A small HTTP service that validates project and contribution payloads
//! and forwards them to a hosted Postgres REST gateway.
//!
//! # Routes
//!
//! ```text
//! GET  /                 welcome message
//! GET  /projects         projects with is_completed = false
//! POST /create-project   insert a project (8 required keys)
//! POST /contribute       insert a contribution (5 required keys)
//! ```
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from environment
//! - [`error`]: Unified error types
//! - [`records`]: Tables, rows and required-field validation
//! - [`store`]: Database access (REST client and in-memory mock)
//! - [`api`]: HTTP handlers, router and server
//! - [`metrics`]: Prometheus metrics
//! - [`utils`]: Utility functions

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;
pub mod records;
pub mod store;
pub mod utils;

pub use config::Config;
pub use error::{BackendError, Result};
