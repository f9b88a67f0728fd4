//! Bamboo build queue client.
//!
//! Queues documentation renders, re-queues failed builds and reads build
//! results back from the Bamboo REST API. All requests authenticate with a
//! pre-encoded basic authorization header taken from [`BambooConfig`].

use std::time::Duration;

use async_trait::async_trait;
use docbay_core::{
    resolve_manifest_url, BuildTrigger, BuildTriggered, CollaboratorResult, DeploymentInformation,
    GerritChange,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{from_reqwest, from_response};
use crate::USER_AGENT;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Manifest filename the render plan reads its input from.
const MANIFEST_FILE: &str = "composer.json";

/// Bamboo connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BambooConfig {
    /// Base URL of the Bamboo REST API, ending in `/rest/api/`.
    pub base_url: String,
    /// Full value of the `authorization` header, e.g. `Basic xyz...`.
    pub authorization: String,
    /// Plan key of the documentation rendering plan.
    pub docs_plan_key: String,
}

impl Default for BambooConfig {
    fn default() -> Self {
        BambooConfig {
            base_url: std::env::var("BAMBOO_URL")
                .unwrap_or_else(|_| "https://bamboo.typo3.com/rest/api/".to_string()),
            authorization: std::env::var("BAMBOO_AUTHORIZATION").unwrap_or_default(),
            docs_plan_key: std::env::var("BAMBOO_DOCS_PLAN_KEY")
                .unwrap_or_else(|_| "CORE-DR".to_string()),
        }
    }
}

impl BambooConfig {
    /// Create a new config from environment variables
    pub fn from_env() -> Self {
        Self::default()
    }

    /// Create config for a specific server
    pub fn new(base_url: &str, authorization: &str) -> Self {
        BambooConfig {
            base_url: base_url.to_string(),
            authorization: authorization.to_string(),
            docs_plan_key: "CORE-DR".to_string(),
        }
    }

    /// Set the documentation rendering plan key
    pub fn with_docs_plan_key(mut self, plan_key: &str) -> Self {
        self.docs_plan_key = plan_key.to_string();
        self
    }
}

/// Parsed result of one finished Bamboo build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStatus {
    pub build_key: String,
    /// Raw state string, e.g. `Successful` or `Failed`.
    pub state: String,
    pub success: bool,
    /// Review change id packed into the build labels, when present.
    pub change_id: Option<u64>,
    /// Review patch set packed into the build labels, when present.
    pub patch_set: Option<u32>,
}

/// Body of a queue response.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueueResponse {
    build_result_key: String,
}

/// Body of a `latest/result/<key>` response, reduced to what we read.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultResponse {
    #[serde(default)]
    build_result_key: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    successful: bool,
    #[serde(default)]
    labels: Labels,
}

#[derive(Debug, Default, Deserialize)]
struct Labels {
    #[serde(default)]
    label: Vec<Label>,
}

#[derive(Debug, Deserialize)]
struct Label {
    name: String,
}

impl From<ResultResponse> for BuildStatus {
    fn from(response: ResultResponse) -> Self {
        let mut change_id = None;
        let mut patch_set = None;
        for label in &response.labels.label {
            if let Some(rest) = label.name.strip_prefix("change-") {
                change_id = rest.parse().ok();
            } else if let Some(rest) = label.name.strip_prefix("patchset-") {
                patch_set = rest.parse().ok();
            }
        }

        BuildStatus {
            build_key: response.build_result_key,
            state: response.state,
            success: response.successful,
            change_id,
            patch_set,
        }
    }
}

/// Bamboo variables attached to a documentation render.
fn queue_params(info: &DeploymentInformation) -> Vec<(&'static str, String)> {
    vec![
        ("stage", String::new()),
        ("executeAllStages", String::new()),
        ("os_authType", "basic".to_string()),
        (
            "bamboo.variable.VERSION_NUMBER",
            info.source_branch.clone(),
        ),
        (
            "bamboo.variable.REPOSITORY_URL",
            info.repository_url.clone(),
        ),
        (
            "bamboo.variable.COMPOSER_FILE",
            resolve_manifest_url(&info.repository_url, &info.source_branch, MANIFEST_FILE),
        ),
        ("bamboo.variable.TARGET_FILENAME", target_filename()),
    ]
}

/// Unique artifact name for one queued render.
fn target_filename() -> String {
    let tick = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("builds/{tick}")
}

/// Client for the Bamboo REST API.
pub struct BambooClient {
    config: BambooConfig,
    http_client: reqwest::Client,
}

impl BambooClient {
    /// Create a new Bamboo client
    pub fn new(config: BambooConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        BambooClient {
            config,
            http_client,
        }
    }

    /// Create client from environment variables
    pub fn from_env() -> Self {
        Self::new(BambooConfig::from_env())
    }

    /// Queue a core pre-merge build for a review change.
    pub async fn trigger_core_build(
        &self,
        change: &GerritChange,
        plan_key: &str,
    ) -> CollaboratorResult<BuildTriggered> {
        let uri = format!("latest/queue/{plan_key}");
        let params = [
            ("stage", String::new()),
            ("os_authType", "basic".to_string()),
            ("executeAllStages", String::new()),
            ("bamboo.variable.changeUrl", change.change_id.to_string()),
            ("bamboo.variable.patchset", change.patch_set.to_string()),
        ];

        let response = self
            .execute(self.request(Method::POST, &uri).query(&params))
            .await?;
        let queued: QueueResponse = response.json().await.map_err(from_reqwest)?;
        debug!(build_key = %queued.build_result_key, change = change.change_id, "queued core build");
        Ok(BuildTriggered {
            build_result_key: queued.build_result_key,
        })
    }

    /// Read the result of a build, including its labels.
    pub async fn build_status(&self, build_key: &str) -> CollaboratorResult<BuildStatus> {
        let uri = format!("latest/result/{build_key}");
        let params = [("os_authType", "basic"), ("expand", "labels")];

        let response = self
            .execute(self.request(Method::GET, &uri).query(&params))
            .await?;
        let result: ResultResponse = response.json().await.map_err(from_reqwest)?;
        Ok(result.into())
    }

    fn request(&self, method: Method, uri: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.config.base_url.trim_end_matches('/'), uri);
        self.http_client
            .request(method, url)
            .header(ACCEPT, "application/json")
            .header(AUTHORIZATION, self.config.authorization.as_str())
            .header(CACHE_CONTROL, "no-cache")
            .header(CONTENT_TYPE, "application/json")
            .header("x-atlassian-token", "nocheck")
    }

    async fn execute(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> CollaboratorResult<reqwest::Response> {
        let response = builder.send().await.map_err(from_reqwest)?;
        if !response.status().is_success() {
            return Err(from_response(response).await);
        }
        Ok(response)
    }
}

#[async_trait]
impl BuildTrigger for BambooClient {
    async fn trigger(&self, info: &DeploymentInformation) -> CollaboratorResult<BuildTriggered> {
        let uri = format!("latest/queue/{}", self.config.docs_plan_key);

        let response = self
            .execute(self.request(Method::POST, &uri).query(&queue_params(info)))
            .await?;
        let queued: QueueResponse = response.json().await.map_err(from_reqwest)?;
        debug!(
            build_key = %queued.build_result_key,
            package = %info.package_name,
            "queued documentation render"
        );
        Ok(BuildTriggered {
            build_result_key: queued.build_result_key,
        })
    }

    async fn retrigger(&self, build_key: &str) -> CollaboratorResult<BuildTriggered> {
        let uri = format!("latest/queue/{build_key}");

        let response = self
            .execute(
                self.request(Method::PUT, &uri)
                    .query(&[("os_authType", "basic")]),
            )
            .await?;
        let queued: QueueResponse = response.json().await.map_err(from_reqwest)?;
        debug!(build_key = %queued.build_result_key, "re-queued build");
        Ok(BuildTriggered {
            build_result_key: queued.build_result_key,
        })
    }
}
