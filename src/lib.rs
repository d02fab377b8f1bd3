pub mod api;
pub mod auth;
pub mod backend;
pub mod cli;
pub mod client;
pub mod config;
pub mod inventory;
pub mod search;
#[cfg(feature = "tui")]
pub mod tui;
pub mod view;

use config::Config;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::auth::CredentialStore;
use crate::inventory::InventoryStore;

pub struct AppState {
    pub config: Config,
    pub inventory: Arc<InventoryStore>,
    pub credentials: Arc<CredentialStore>,
    pub metrics_handle: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(
        config: Config,
        inventory: Arc<InventoryStore>,
        credentials: Arc<CredentialStore>,
    ) -> Self {
        Self {
            config,
            inventory,
            credentials,
            metrics_handle: None,
        }
    }

    /// Build the stores described by the configuration
    pub fn from_config(config: Config) -> Self {
        let inventory = if config.inventory.seed {
            InventoryStore::seeded()
        } else {
            InventoryStore::new()
        };
        let credentials = CredentialStore::new(config.auth.users.clone());
        Self::new(config, Arc::new(inventory), Arc::new(credentials))
    }

    /// Set the Prometheus metrics handle
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }
}
