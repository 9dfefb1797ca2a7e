//! Notification channel for the attendance services
//!
//! Check-ins are broadcast fire-and-forget to an SNS topic. When no topic is
//! configured, messages are only written to the log.

use crate::error::NotificationError;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::Client;
use aws_sdk_sns::config::Region;
use aws_sdk_sns::error::DisplayErrorContext;
use std::env;
use tracing::info;

/// Something that can broadcast a short message to subscribers
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Publish `message` under `subject`. There is no delivery acknowledgement.
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotificationError>;
}

/// Configuration for the notification channel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationConfig {
    /// SNS topic ARN; notifications only go to the log when absent
    pub topic_arn: Option<String>,
    /// AWS region override
    pub region: Option<String>,
    /// Endpoint override (e.g. LocalStack)
    pub endpoint: Option<String>,
}

impl NotificationConfig {
    /// Create a new NotificationConfig from environment variables
    ///
    /// # Environment Variables
    /// - `SNS_TOPIC_ARN`: topic to publish to
    /// - `SNS_REGION`: region override
    /// - `SNS_ENDPOINT`: endpoint override
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|s| !s.trim().is_empty());

        Self {
            topic_arn: non_empty("SNS_TOPIC_ARN"),
            region: non_empty("SNS_REGION"),
            endpoint: non_empty("SNS_ENDPOINT"),
        }
    }
}

/// Publishes notifications to an SNS topic
#[derive(Clone)]
pub struct SnsNotifier {
    client: Client,
    topic_arn: String,
}

impl std::fmt::Debug for SnsNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnsNotifier")
            .field("topic_arn", &self.topic_arn)
            .finish()
    }
}

impl SnsNotifier {
    /// Build an SNS notifier from the shared AWS configuration
    pub fn new(sdk_config: &SdkConfig, config: &NotificationConfig) -> Result<Self, NotificationError> {
        let topic_arn = config.topic_arn.clone().ok_or_else(|| {
            NotificationError::Configuration("SNS_TOPIC_ARN is not set".to_string())
        })?;

        let mut builder = aws_sdk_sns::config::Builder::from(sdk_config);

        if let Some(region) = &config.region {
            builder = builder.region(Region::new(region.clone()));
        }

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        info!("SNS notifier initialized for topic: {}", topic_arn);

        Ok(Self {
            client: Client::from_conf(builder.build()),
            topic_arn,
        })
    }

    /// Create from a pre-built client
    pub fn from_client(client: Client, topic_arn: String) -> Self {
        Self { client, topic_arn }
    }

    /// The topic this notifier publishes to
    pub fn topic_arn(&self) -> &str {
        &self.topic_arn
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotificationError> {
        self.client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| {
                NotificationError::Publish(format!("SNS Publish failed: {}", DisplayErrorContext(&e)))
            })?;

        Ok(())
    }
}

/// Writes notifications to the log instead of a topic
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), NotificationError> {
        info!(subject, "{}", message);
        Ok(())
    }
}
