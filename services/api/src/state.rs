//! Application state shared across handlers

use std::sync::Arc;

use common::notification::Notifier;

use crate::{config::ApiConfig, repositories::AttendanceRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn AttendanceRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn AttendanceRepository>,
        notifier: Arc<dyn Notifier>,
        config: ApiConfig,
    ) -> Self {
        Self {
            repository,
            notifier,
            config: Arc::new(config),
        }
    }
}
