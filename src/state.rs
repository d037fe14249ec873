//! Shared application state: one pool, one store, one frozen table.

use crate::auth::TokenSigner;
use crate::config::resolved::{resolve, RoutingTable};
use crate::config::types::GatewayConfig;
use crate::document::DocumentStore;
use crate::error::ConfigError;
use crate::response::StatusMode;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub store: DocumentStore,
    /// Immutable after startup; shared without locking.
    pub routing: Arc<RoutingTable>,
    pub signer: TokenSigner,
    pub login_function: String,
    pub status_mode: StatusMode,
}

impl AppState {
    /// Validate the config, freeze the routing table, and build the
    /// document store. Fails fast on misconfiguration.
    pub fn from_config(pool: PgPool, config: &GatewayConfig) -> Result<Self, ConfigError> {
        let routing = resolve(config)?;
        Ok(AppState {
            pool,
            store: DocumentStore::from_config(&config.collections),
            routing: Arc::new(routing),
            signer: TokenSigner::new(&config.auth),
            login_function: config.login_function.clone(),
            status_mode: if config.strict_errors {
                StatusMode::Strict
            } else {
                StatusMode::Legacy
            },
        })
    }
}
