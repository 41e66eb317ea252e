use crate::core::goal_loader::parse_grid;
use crate::core::retry::{retry_with_backoff, RetryPolicy};
use crate::domain::model::{AstralObject, GoalMap};
use crate::domain::ports::MegaverseApi;
use crate::utils::error::{MegaverseError, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client, Method};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "https://challenge.crossmint.io/api";

#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: Client,
    retry: RetryPolicy,
}

impl ApiClient {
    pub fn new(base_url: &str, retry: RetryPolicy, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("megaverse/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            retry,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// One POST/DELETE for `object`, no retries. Non-2xx becomes `MegaverseError::Api`.
    async fn send_object(
        &self,
        method: Method,
        object: &AstralObject,
        candidate_id: &str,
        verb: &str,
    ) -> Result<()> {
        let url = self.url(object.endpoint());
        let payload = object.payload(candidate_id);

        tracing::debug!("{} {} at {} with payload: {}", method, object.object_type(), url, payload);

        let response = self
            .client
            .request(method, &url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                MegaverseError::api(
                    format!("Network error trying to {} {}: {}", verb, object, e),
                    None,
                    None,
                )
            })?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!("Successfully {}d {}", verb, object);
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!("{} {} returned {}: {}", verb, object, status, body);
        Err(MegaverseError::api(
            format!("Failed to {} {}", verb, object),
            Some(status.as_u16()),
            Some(body),
        ))
    }

    async fn get_json(&self, path: &str, what: &str) -> Result<serde_json::Value> {
        let url = &self.url(path);
        tracing::debug!("GET {}", url);

        retry_with_backoff(&self.retry, what, MegaverseError::is_retryable, move || async move {
            let response = self.client.get(url).send().await.map_err(|e| {
                MegaverseError::api(format!("Network error getting {}: {}", what, e), None, None)
            })?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(MegaverseError::api(
                    format!("Failed to get {}", what),
                    Some(status.as_u16()),
                    Some(body),
                ));
            }

            let body = response.text().await.map_err(|e| {
                MegaverseError::api(format!("Network error reading {}: {}", what, e), None, None)
            })?;
            serde_json::from_str::<serde_json::Value>(&body).map_err(|e| {
                MegaverseError::api(
                    format!("Invalid JSON in {} response: {}", what, e),
                    Some(status.as_u16()),
                    Some(body),
                )
            })
        })
        .await
    }
}

#[async_trait]
impl MegaverseApi for ApiClient {
    async fn create_object(&self, object: &AstralObject, candidate_id: &str) -> Result<()> {
        let name = format!("create {}", object);
        retry_with_backoff(&self.retry, &name, MegaverseError::is_retryable, move || {
            self.send_object(Method::POST, object, candidate_id, "create")
        })
        .await
    }

    async fn delete_object(&self, object: &AstralObject, candidate_id: &str) -> Result<()> {
        let name = format!("delete {}", object);
        retry_with_backoff(&self.retry, &name, MegaverseError::is_retryable, move || {
            self.send_object(Method::DELETE, object, candidate_id, "delete")
        })
        .await
    }

    async fn get_current_map(&self, candidate_id: &str) -> Result<Option<GoalMap>> {
        let data = self
            .get_json(&format!("map/{}", candidate_id), "current map")
            .await?;
        parse_current_map(&data)
    }

    async fn get_goal_map(&self, candidate_id: &str) -> Result<serde_json::Value> {
        self.get_json(&format!("map/{}/goal", candidate_id), "goal map")
            .await
    }
}

/// Accepts `{"map": {"content": [[...]]}}` (the live API) or `{"map": [[...]]}`.
pub fn parse_current_map(data: &serde_json::Value) -> Result<Option<GoalMap>> {
    let map = match data.get("map") {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(map) => map,
    };

    let grid = match map {
        serde_json::Value::Object(obj) => match obj.get("content") {
            None | Some(serde_json::Value::Null) => return Ok(None),
            Some(content) => content,
        },
        other => other,
    };

    if grid.as_array().map(|rows| rows.is_empty()).unwrap_or(false) {
        return Ok(None);
    }

    parse_grid(grid)
        .map(Some)
        .map_err(|e| e.in_goal_context("current map"))
}
