use std::sync::Arc;

use crate::config::Config;
use crate::session::{DryRunSession, SqlApiSession, WarehouseSession};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    /// Gateway every statement goes through
    pub session: Arc<dyn WarehouseSession>,
    pub config: Config,
}

impl AppState {
    /// Create a new AppState talking to the configured warehouse
    pub fn new(config: Config) -> Result<Self, AppStateError> {
        let session: Arc<dyn WarehouseSession> = if config.dry_run {
            tracing::warn!("DRY_RUN enabled, statements are logged but never executed");
            Arc::new(DryRunSession::new())
        } else {
            let session = SqlApiSession::new(config.clone())
                .map_err(|e| AppStateError::Session(e.to_string()))?;
            Arc::new(session)
        };

        Ok(Self { session, config })
    }

    /// Create AppState with a custom session (for testing)
    pub fn with_session(config: Config, session: Arc<dyn WarehouseSession>) -> Self {
        Self { session, config }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppStateError {
    #[error("Warehouse session error: {0}")]
    Session(String),
}
