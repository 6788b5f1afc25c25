use std::sync::Arc;

use crate::config::Config;
use crate::services::catalog_service::{Catalog, StaticCatalog};
use crate::services::navigator::Navigator;
use crate::services::session_runtime::SessionHandle;

pub struct AppState {
    pub config: Config,
    pub catalog: Arc<dyn Catalog>,
    pub session: SessionHandle,
}

impl AppState {
    /// Loads the catalog named by the config (or the builtin one) and starts
    /// the session runtime. Must be called inside a tokio runtime.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let catalog: Arc<dyn Catalog> = match config.catalog_path.as_deref() {
            Some(path) => Arc::new(StaticCatalog::from_path(path)?),
            None => {
                tracing::info!("No catalog path configured, using builtin content");
                Arc::new(StaticCatalog::builtin())
            }
        };

        Ok(Self::with_catalog(config, catalog))
    }

    pub fn with_catalog(config: Config, catalog: Arc<dyn Catalog>) -> Self {
        let navigator = Navigator::new(catalog.clone());
        let session = SessionHandle::spawn(navigator, config.results_delay());

        Self {
            config,
            catalog,
            session,
        }
    }
}

pub mod catalog_service;
pub mod exercise_engine;
pub mod navigator;
pub mod session_runtime;
