// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use async_trait::async_trait;
use poster_contracts::{LLMError, LLMResult, ProviderRequest, ProviderResponse, Usage};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 60;

/// A chat-completion backend. One request, one answer, no retries.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse>;
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    endpoint: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        api_key: impl Into<String>,
        endpoint: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> LLMResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LLMError::Configuration("missing API key".to_string()));
        }
        let timeout = Duration::from_secs(timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECONDS));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LLMError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint: endpoint.unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout,
        })
    }

    fn build_payload(request: &ProviderRequest) -> Value {
        let mut payload = json!({
            "model": request.model,
            "messages": request.messages,
        });
        if let Some(temperature) = request.temperature {
            payload["temperature"] = json!(temperature);
        }
        if let Some(format) = &request.response_format {
            payload["response_format"] = json!(format);
        }
        payload
    }

    fn parse_response(body: &Value, model: String) -> LLMResult<ProviderResponse> {
        let content = body["choices"][0]["message"]["content"]
            .as_str()
            .filter(|c| !c.trim().is_empty())
            .ok_or(LLMError::EmptyCompletion)?;

        let count = |field: &str| {
            body["usage"][field]
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .unwrap_or(0)
        };
        let usage = Usage {
            prompt_tokens: count("prompt_tokens"),
            completion_tokens: count("completion_tokens"),
            total_tokens: count("total_tokens"),
        };

        Ok(ProviderResponse {
            content: content.to_string(),
            model: body["model"].as_str().map_or(model, str::to_string),
            usage,
            finish_reason: body["choices"][0]["finish_reason"]
                .as_str()
                .map(str::to_string),
        })
    }

    fn status_error(status: StatusCode, body: String) -> LLMError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LLMError::Authentication(body),
            StatusCode::TOO_MANY_REQUESTS => LLMError::RateLimit,
            _ => LLMError::Provider(format!("API error {status}: {body}")),
        }
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse> {
        let request_id = Uuid::new_v4();
        let payload = Self::build_payload(&request);
        debug!(%request_id, model = %request.model, endpoint = %self.endpoint, "Sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LLMError::Timeout
                } else {
                    LLMError::Network(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::status_error(status, body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LLMError::Serialisation(format!("Failed to parse response: {e}")))?;
        let parsed = Self::parse_response(&body, request.model)?;
        info!(
            %request_id,
            model = %parsed.model,
            total_tokens = parsed.usage.total_tokens,
            timeout_secs = self.timeout.as_secs(),
            "Completion received"
        );
        Ok(parsed)
    }
}
