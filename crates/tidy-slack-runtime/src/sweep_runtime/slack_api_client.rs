//! Slack Web API client used by snapshot collection and action execution.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::slack_helpers::{
    is_authorization_error_code, is_retryable_slack_status, is_retryable_transport_error,
    parse_retry_after, retry_delay, truncate_for_error,
};
use crate::workspace_api::{
    ChannelMeta, ChannelPage, LastMessage, WorkspaceApi, WorkspaceApiError,
};

const CHANNEL_TYPES: &str = "public_channel,private_channel";
const CHANNEL_PAGE_LIMIT: &str = "200";
const RETRY_ATTEMPT_HEADER: &str = "x-housekeeper-retry-attempt";

#[derive(Debug, Clone, Deserialize)]
struct SlackResponseMetadata {
    #[serde(default)]
    next_cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationsListResponse {
    ok: bool,
    #[serde(default)]
    channels: Vec<ChannelMeta>,
    #[serde(default)]
    response_metadata: Option<SlackResponseMetadata>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationsInfoResponse {
    ok: bool,
    channel: Option<ChannelMeta>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackConversationsHistoryResponse {
    ok: bool,
    #[serde(default)]
    messages: Vec<LastMessage>,
    error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct SlackAckResponse {
    ok: bool,
    error: Option<String>,
}

#[derive(Clone)]
pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
    retry_max_attempts: usize,
    retry_base_delay_ms: u64,
}

impl SlackApiClient {
    pub fn new(
        api_base: String,
        token: String,
        request_timeout_ms: u64,
        retry_max_attempts: usize,
        retry_base_delay_ms: u64,
    ) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::USER_AGENT,
            reqwest::header::HeaderValue::from_static("tidy-housekeeper"),
        );
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(request_timeout_ms.max(1)))
            .build()
            .context("failed to create slack api client")?;

        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.trim().to_string(),
            retry_max_attempts: retry_max_attempts.max(1),
            retry_base_delay_ms: retry_base_delay_ms.max(1),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/{}", self.api_base, method)
    }

    async fn post_json(
        &self,
        operation: &str,
        payload: serde_json::Value,
    ) -> Result<(), WorkspaceApiError> {
        let response: SlackAckResponse = self
            .request_json(operation, || {
                self.http
                    .post(self.endpoint(operation))
                    .bearer_auth(&self.token)
                    .json(&payload)
            })
            .await?;
        ensure_ok(operation, response.ok, response.error)
    }

    async fn request_json<T, F>(&self, operation: &str, mut builder: F) -> Result<T, WorkspaceApiError>
    where
        T: DeserializeOwned,
        F: FnMut() -> reqwest::RequestBuilder,
    {
        let mut attempt = 0_usize;
        loop {
            attempt = attempt.saturating_add(1);
            let response = builder()
                .header(RETRY_ATTEMPT_HEADER, attempt.saturating_sub(1).to_string())
                .send()
                .await;
            match response {
                Ok(response) => {
                    let status = response.status();
                    let retry_after = parse_retry_after(response.headers());
                    if status.is_success() {
                        let body = response.text().await.map_err(|error| {
                            WorkspaceApiError::InvalidResponse {
                                operation: operation.to_string(),
                                message: error.to_string(),
                            }
                        })?;
                        if is_ratelimited_body(&body) {
                            if attempt < self.retry_max_attempts {
                                debug!(operation, attempt, "retrying rate limited slack api call");
                                tokio::time::sleep(retry_delay(
                                    self.retry_base_delay_ms,
                                    attempt,
                                    retry_after,
                                ))
                                .await;
                                continue;
                            }
                            return Err(WorkspaceApiError::RateLimited {
                                operation: operation.to_string(),
                                attempts: attempt,
                                retry_after_secs: retry_after,
                            });
                        }
                        return serde_json::from_str::<T>(&body).map_err(|error| {
                            WorkspaceApiError::InvalidResponse {
                                operation: operation.to_string(),
                                message: error.to_string(),
                            }
                        });
                    }

                    let body = response.text().await.unwrap_or_default();
                    if attempt < self.retry_max_attempts
                        && is_retryable_slack_status(status.as_u16())
                    {
                        debug!(
                            operation,
                            status = status.as_u16(),
                            attempt,
                            "retrying slack api call"
                        );
                        tokio::time::sleep(retry_delay(
                            self.retry_base_delay_ms,
                            attempt,
                            retry_after,
                        ))
                        .await;
                        continue;
                    }

                    return Err(status_error(
                        operation,
                        status.as_u16(),
                        &body,
                        attempt,
                        retry_after,
                    ));
                }
                Err(error) => {
                    if attempt < self.retry_max_attempts && is_retryable_transport_error(&error) {
                        debug!(operation, attempt, %error, "retrying slack api call");
                        tokio::time::sleep(retry_delay(self.retry_base_delay_ms, attempt, None))
                            .await;
                        continue;
                    }
                    return Err(WorkspaceApiError::Transport {
                        operation: operation.to_string(),
                        attempts: attempt,
                        message: error.to_string(),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl WorkspaceApi for SlackApiClient {
    async fn list_channels(&self, cursor: Option<&str>) -> Result<ChannelPage, WorkspaceApiError> {
        let operation = "conversations.list";
        let mut query = vec![
            ("types", CHANNEL_TYPES),
            ("exclude_archived", "false"),
            ("limit", CHANNEL_PAGE_LIMIT),
        ];
        if let Some(cursor) = cursor.filter(|value| !value.trim().is_empty()) {
            query.push(("cursor", cursor));
        }
        let response: SlackConversationsListResponse = self
            .request_json(operation, || {
                self.http
                    .get(self.endpoint(operation))
                    .bearer_auth(&self.token)
                    .query(&query)
            })
            .await?;
        ensure_ok(operation, response.ok, response.error)?;
        Ok(ChannelPage {
            channels: response.channels,
            next_cursor: response
                .response_metadata
                .and_then(|metadata| metadata.next_cursor)
                .filter(|cursor| !cursor.trim().is_empty()),
        })
    }

    async fn channel_info(&self, channel_id: &str) -> Result<ChannelMeta, WorkspaceApiError> {
        let operation = "conversations.info";
        let response: SlackConversationsInfoResponse = self
            .request_json(operation, || {
                self.http
                    .get(self.endpoint(operation))
                    .bearer_auth(&self.token)
                    .query(&[("channel", channel_id)])
            })
            .await?;
        ensure_ok(operation, response.ok, response.error)?;
        response
            .channel
            .ok_or_else(|| WorkspaceApiError::InvalidResponse {
                operation: operation.to_string(),
                message: "response missing channel".to_string(),
            })
    }

    async fn last_message(
        &self,
        channel_id: &str,
    ) -> Result<Option<LastMessage>, WorkspaceApiError> {
        let operation = "conversations.history";
        let response: SlackConversationsHistoryResponse = self
            .request_json(operation, || {
                self.http
                    .get(self.endpoint(operation))
                    .bearer_auth(&self.token)
                    .query(&[("channel", channel_id), ("limit", "1")])
            })
            .await?;
        ensure_ok(operation, response.ok, response.error)?;
        Ok(response.messages.into_iter().next())
    }

    async fn post_message(&self, target: &str, text: &str) -> Result<(), WorkspaceApiError> {
        self.post_json(
            "chat.postMessage",
            json!({
                "channel": target,
                "text": text,
                "link_names": true,
                "unfurl_links": false,
                "unfurl_media": false,
            }),
        )
        .await
    }

    async fn archive_channel(&self, channel_id: &str) -> Result<(), WorkspaceApiError> {
        self.post_json("conversations.archive", json!({ "channel": channel_id }))
            .await
    }

    async fn delete_channel(&self, channel_id: &str) -> Result<(), WorkspaceApiError> {
        self.post_json(
            "admin.conversations.delete",
            json!({ "channel_id": channel_id }),
        )
        .await
    }
}

#[derive(Debug, Deserialize)]
struct SlackErrorEnvelope {
    ok: bool,
    error: Option<String>,
}

/// Slack may answer 200 with `ok: false, error: "ratelimited"` instead of a 429.
fn is_ratelimited_body(body: &str) -> bool {
    serde_json::from_str::<SlackErrorEnvelope>(body)
        .is_ok_and(|envelope| !envelope.ok && envelope.error.as_deref() == Some("ratelimited"))
}

fn ensure_ok(operation: &str, ok: bool, error: Option<String>) -> Result<(), WorkspaceApiError> {
    if ok {
        return Ok(());
    }
    let code = error.unwrap_or_else(|| "unknown error".to_string());
    if is_authorization_error_code(&code) {
        return Err(WorkspaceApiError::Unauthorized {
            operation: operation.to_string(),
            code,
        });
    }
    Err(WorkspaceApiError::Rejected {
        operation: operation.to_string(),
        code,
    })
}

fn status_error(
    operation: &str,
    status: u16,
    body: &str,
    attempts: usize,
    retry_after_secs: Option<u64>,
) -> WorkspaceApiError {
    match status {
        429 => WorkspaceApiError::RateLimited {
            operation: operation.to_string(),
            attempts,
            retry_after_secs,
        },
        401 | 403 => WorkspaceApiError::Unauthorized {
            operation: operation.to_string(),
            code: format!("status {status}: {}", truncate_for_error(body, 200)),
        },
        _ => WorkspaceApiError::HttpStatus {
            operation: operation.to_string(),
            status,
            body: truncate_for_error(body, 800),
        },
    }
}
