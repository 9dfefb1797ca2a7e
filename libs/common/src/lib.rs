//! Common library for the attendance services
//!
//! This crate provides the managed-infrastructure plumbing shared by the
//! services: DynamoDB configuration and client construction, the
//! notification channel, and the error types for both.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_client, load_sdk_config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let sdk_config = load_sdk_config().await;
//!     let client = init_client(&sdk_config, &config);
//!     let is_healthy = health_check(&client, &config.table_name).await?;
//!     println!("Database health check: {}", is_healthy);
//!     Ok(())
//! }
//! ```

pub mod database;
pub mod error;
pub mod notification;
