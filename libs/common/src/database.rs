//! Database module for handling DynamoDB connections
//!
//! This module provides configuration, client construction and health checks
//! for the single DynamoDB table the services share.

use crate::error::{DatabaseError, DatabaseResult};
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::config::timeout::TimeoutConfig;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use std::env;
use std::time::Duration;

/// Default table name when `TABLE_NAME` is not set
pub const DEFAULT_TABLE_NAME: &str = "attendance";

/// Database configuration struct
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// DynamoDB table name
    pub table_name: String,
    /// AWS region override (SDK default chain when absent)
    pub region: Option<String>,
    /// Endpoint override (e.g. DynamoDB Local or LocalStack)
    pub endpoint: Option<String>,
    /// Per-operation timeout in milliseconds
    pub timeout_ms: Option<u64>,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `TABLE_NAME`: table name (default: "attendance")
    /// - `DYNAMODB_REGION`: region override
    /// - `DYNAMODB_ENDPOINT`: endpoint override
    /// - `DYNAMODB_TIMEOUT_MS`: operation timeout, ignored when not a number
    pub fn from_env() -> DatabaseResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> DatabaseResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let table_name = lookup("TABLE_NAME").unwrap_or_else(|| DEFAULT_TABLE_NAME.to_string());
        if table_name.trim().is_empty() {
            return Err(DatabaseError::Configuration(
                "TABLE_NAME must not be empty".to_string(),
            ));
        }

        let timeout_ms = lookup("DYNAMODB_TIMEOUT_MS").and_then(|s| s.parse().ok());

        Ok(Self {
            table_name,
            region: lookup("DYNAMODB_REGION").filter(|s| !s.is_empty()),
            endpoint: lookup("DYNAMODB_ENDPOINT").filter(|s| !s.is_empty()),
            timeout_ms,
        })
    }
}

/// Load the shared AWS configuration (credentials, region, retry settings)
pub async fn load_sdk_config() -> SdkConfig {
    aws_config::load_defaults(BehaviorVersion::latest()).await
}

/// Initialize a DynamoDB client
///
/// The client inherits everything from `sdk_config` and then applies the
/// region, endpoint and timeout overrides from `config`.
pub fn init_client(sdk_config: &SdkConfig, config: &DatabaseConfig) -> Client {
    let mut builder = aws_sdk_dynamodb::config::Builder::from(sdk_config);

    if let Some(region) = &config.region {
        builder = builder.region(Region::new(region.clone()));
    }

    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    if let Some(timeout_ms) = config.timeout_ms {
        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_millis(timeout_ms))
            .build();
        builder = builder.timeout_config(timeout_config);
    }

    Client::from_conf(builder.build())
}

/// Check that the table is reachable
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if the table could be described
pub async fn health_check(client: &Client, table_name: &str) -> DatabaseResult<bool> {
    client
        .describe_table()
        .table_name(table_name)
        .send()
        .await
        .map_err(|e| {
            DatabaseError::Request(format!(
                "DynamoDB DescribeTable failed: {}",
                DisplayErrorContext(&e)
            ))
        })?;

    Ok(true)
}
