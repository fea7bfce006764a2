use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::anyhow;
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::gateway::PaymentGateway;
use crate::services::notify::Notifier;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    /// `None` when gateway credentials are not configured; payments are disabled.
    pub gateway: Option<Box<dyn PaymentGateway>>,
    /// `None` when no mail relay is configured.
    pub notifier: Option<Box<dyn Notifier>>,
}

impl AppState {
    /// Never hold the returned guard across an `.await`.
    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("database mutex poisoned")))
    }

    pub fn payments_enabled(&self) -> bool {
        self.gateway.is_some()
    }
}
