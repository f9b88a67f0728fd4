//! Slack webhook notifications.

use std::time::Duration;

use async_trait::async_trait;
use docbay_core::{CollaboratorResult, DocsRecord, NotificationSink};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{from_reqwest, from_response};
use crate::USER_AGENT;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Slack webhook settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Incoming webhook URL messages are posted to.
    pub webhook_url: String,
}

impl Default for SlackConfig {
    fn default() -> Self {
        SlackConfig {
            webhook_url: std::env::var("SLACK_HOOK").unwrap_or_default(),
        }
    }
}

impl SlackConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific webhook
    pub fn new(webhook_url: &str) -> Self {
        SlackConfig {
            webhook_url: webhook_url.to_string(),
        }
    }
}

/// Message body for a repository discovery announcement.
fn discovery_payload(record: &DocsRecord) -> serde_json::Value {
    serde_json::json!({
        "text": format!(
            "A new documentation repository has been discovered and awaits approval: {} ({})",
            record.repository_url, record.package_name
        ),
    })
}

/// Posts registry announcements to a Slack incoming webhook.
pub struct SlackClient {
    config: SlackConfig,
    http_client: reqwest::Client,
}

impl SlackClient {
    /// Create a new Slack client
    pub fn new(config: SlackConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        SlackClient {
            config,
            http_client,
        }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(SlackConfig::from_env())
    }
}

#[async_trait]
impl NotificationSink for SlackClient {
    async fn notify_discovery(&self, record: &DocsRecord) -> CollaboratorResult<()> {
        let response = self
            .http_client
            .post(&self.config.webhook_url)
            .json(&discovery_payload(record))
            .send()
            .await
            .map_err(from_reqwest)?;

        if !response.status().is_success() {
            return Err(from_response(response).await);
        }

        debug!(package = %record.package_name, "sent discovery notification");
        Ok(())
    }
}
