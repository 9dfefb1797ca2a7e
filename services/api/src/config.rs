//! Service configuration
//!
//! Read from `ATTENDANCE_*` environment variables through the `config` crate.
//! Store and notification settings live with their clients in `common`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Environment variable prefix for the service settings
pub const ENV_PREFIX: &str = "ATTENDANCE";

/// Which repository backs the API
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// The shared DynamoDB table
    #[default]
    Dynamodb,
    /// Process memory, lost on restart
    Memory,
}

/// When a check-in triggers a notification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyPolicy {
    /// Only the first check-in of a student to a session
    #[default]
    FirstCheckIn,
    /// Every check-in, including repeats that overwrite the earlier record
    EveryCheckIn,
}

impl NotifyPolicy {
    /// Whether a write that was (or was not) the first for its key notifies
    pub fn should_notify(self, first_check_in: bool) -> bool {
        match self {
            NotifyPolicy::FirstCheckIn => first_check_in,
            NotifyPolicy::EveryCheckIn => true,
        }
    }
}

/// API service settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub notify_policy: NotifyPolicy,
    /// Page students land on after scanning; the QR code encodes
    /// `{check_in_base_url}?session={id}`
    pub check_in_base_url: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            store: StoreBackend::default(),
            notify_policy: NotifyPolicy::default(),
            check_in_base_url: None,
        }
    }
}

impl ApiConfig {
    /// Load the configuration from the process environment
    ///
    /// # Environment Variables
    /// - `ATTENDANCE_HOST` (default: "0.0.0.0")
    /// - `ATTENDANCE_PORT` (default: 3001)
    /// - `ATTENDANCE_STORE`: `dynamodb` or `memory` (default: `dynamodb`)
    /// - `ATTENDANCE_NOTIFY_POLICY`: `first_check_in` or `every_check_in`
    /// - `ATTENDANCE_CHECK_IN_BASE_URL`: optional
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Load the configuration from an explicit environment source
    pub fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let mut config: ApiConfig = Config::builder()
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.check_in_base_url = config
            .check_in_base_url
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        Ok(config)
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// URL a student opens to check in to `session_id`
    pub fn check_in_url(&self, session_id: &str) -> Option<String> {
        self.check_in_base_url
            .as_ref()
            .map(|base| format!("{}?session={}", base, session_id))
    }
}
