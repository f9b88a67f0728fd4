//! Graylog log search.
//!
//! Read-only peripheral: the registry surfaces recent trigger activity from
//! the central log store. A broken log store must never take the main flow
//! down with it, so every transport failure degrades to an empty result
//! list.

use std::time::Duration;

use async_trait::async_trait;
use docbay_core::{CollaboratorResult, LogEntry, LogSearch};
use reqwest::header::ACCEPT;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{from_reqwest, from_response};
use crate::USER_AGENT;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Relative search window, 30 days.
const RANGE_SECONDS: u32 = 2_592_000;

/// Standing query for build trigger and review vote log rows.
const TRIGGER_QUERY: &str =
    "application:docbay AND level:6 AND (ctxt_event:build.triggered OR ctxt_event:build.outcome)";

/// Graylog connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraylogConfig {
    /// Base URL of the Graylog REST API, ending in `/api/`.
    pub server_url: String,
    /// Access token, sent as the basic auth username with password `token`.
    pub token: String,
}

impl Default for GraylogConfig {
    fn default() -> Self {
        GraylogConfig {
            server_url: std::env::var("GRAYLOG_URL")
                .unwrap_or_else(|_| "https://graylog.typo3.com/api/".to_string()),
            token: std::env::var("GRAYLOG_TOKEN").unwrap_or_default(),
        }
    }
}

impl GraylogConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific server
    pub fn new(server_url: &str, token: &str) -> Self {
        GraylogConfig {
            server_url: server_url.to_string(),
            token: token.to_string(),
        }
    }
}

/// Body of a relative search response, reduced to what we read.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    messages: Vec<SearchMessage>,
}

#[derive(Debug, Deserialize)]
struct SearchMessage {
    message: serde_json::Map<String, Value>,
}

fn field_str(fields: &serde_json::Map<String, Value>, key: &str) -> String {
    fields
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn entry_from_fields(fields: serde_json::Map<String, Value>) -> LogEntry {
    LogEntry {
        timestamp: field_str(&fields, "timestamp"),
        source: field_str(&fields, "source"),
        message: field_str(&fields, "message"),
        fields: Value::Object(fields),
    }
}

/// Client for the Graylog relative search API.
pub struct GraylogClient {
    config: GraylogConfig,
    http_client: reqwest::Client,
}

impl GraylogClient {
    /// Create a new Graylog client
    pub fn new(config: GraylogConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        GraylogClient {
            config,
            http_client,
        }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(GraylogConfig::from_env())
    }

    /// Recent build trigger and outcome log rows, newest first.
    pub async fn recent_build_triggers(&self, limit: u32) -> Vec<LogEntry> {
        self.search(TRIGGER_QUERY, limit).await
    }

    async fn get_logs(&self, query: &str, limit: u32) -> CollaboratorResult<Vec<LogEntry>> {
        let url = format!(
            "{}/search/universal/relative",
            self.config.server_url.trim_end_matches('/')
        );
        let params: Vec<(&str, String)> = vec![
            ("query", query.to_string()),
            ("range", RANGE_SECONDS.to_string()),
            ("limit", limit.to_string()),
            ("sort", "timestamp:desc".to_string()),
            ("pretty", "true".to_string()),
        ];

        let response = self
            .http_client
            .get(&url)
            .query(&params)
            .basic_auth(&self.config.token, Some("token"))
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(from_reqwest)?;

        if !response.status().is_success() {
            return Err(from_response(response).await);
        }

        let body: SearchResponse = response.json().await.map_err(from_reqwest)?;
        Ok(body
            .messages
            .into_iter()
            .map(|m| entry_from_fields(m.message))
            .collect())
    }
}

#[async_trait]
impl LogSearch for GraylogClient {
    async fn search(&self, query: &str, limit: u32) -> Vec<LogEntry> {
        match self.get_logs(query, limit).await {
            Ok(entries) => entries,
            Err(e) => {
                // Silent fail if the log store is broken or down.
                debug!(error = %e, "log search failed, returning no entries");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_response_maps_onto_log_entries() {
        let body = r#"{
            "messages": [
                {
                    "message": {
                        "timestamp": "2024-03-01T10:15:00.000Z",
                        "source": "docbay-prod",
                        "message": "queued documentation render",
                        "ctxt_event": "build.triggered",
                        "ctxt_build_key": "CORE-DR-4711"
                    },
                    "index": "graylog_42"
                }
            ],
            "total_results": 1
        }"#;

        let parsed: SearchResponse = serde_json::from_str(body).unwrap();
        let entries: Vec<LogEntry> = parsed
            .messages
            .into_iter()
            .map(|m| entry_from_fields(m.message))
            .collect();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].timestamp, "2024-03-01T10:15:00.000Z");
        assert_eq!(entries[0].source, "docbay-prod");
        assert_eq!(entries[0].message, "queued documentation render");
        assert_eq!(entries[0].fields["ctxt_build_key"], "CORE-DR-4711");
    }

    #[test]
    fn empty_response_yields_no_entries() {
        let parsed: SearchResponse = serde_json::from_str(r#"{"total_results": 0}"#).unwrap();
        assert!(parsed.messages.is_empty());
    }

    #[tokio::test]
    async fn unreachable_server_yields_no_entries_instead_of_an_error() {
        let client = GraylogClient::new(GraylogConfig::new("http://127.0.0.1:9/api/", "token"));
        let entries = client.search("application:docbay", 10).await;
        assert!(entries.is_empty());
    }

    #[tokio::test]
    async fn recent_build_triggers_swallows_transport_failures() {
        let client = GraylogClient::new(GraylogConfig::new("http://127.0.0.1:9/api/", "token"));
        let entries = client.recent_build_triggers(40).await;
        assert!(entries.is_empty());
    }
}
