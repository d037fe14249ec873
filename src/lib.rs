//! Wastegate: dual-backend data-access gateway.
//!
//! One set of generic endpoints (`/:entity/by`, `/:entity/create`,
//! `/:entity/update`) dispatches by entity and method to either a
//! PostgreSQL stored-function call or a schema-validated document
//! collection, and answers one response envelope either way.

pub mod auth;
pub mod config;
pub mod document;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod relational;
pub mod response;
pub mod routes;
pub mod service;
pub mod state;

pub use auth::TokenSigner;
pub use config::{default_config, load_from_file, resolve, validate, GatewayConfig, RoutingTable};
pub use document::{DocumentStore, ListOptions};
pub use error::{ConfigError, GatewayError};
pub use relational::RelationalExecutor;
pub use response::{Envelope, StatusMode};
pub use routes::{common_routes, common_routes_with_ready, gateway_routes};
pub use service::{dispatch_by, dispatch_create, dispatch_update};
pub use state::AppState;
