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
use poster_contracts::{ChartConfig, RenderResponse};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const RENDER_TIMEOUT_SECONDS: u64 = 60;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Render backend unreachable: {0}")]
    Transport(String),
    #[error("{body}")]
    Upstream { status: u16, body: String },
    #[error("Render backend sent an unreadable response: {0}")]
    Decode(String),
}

/// The chart-render collaborator: full config in, PNG and the config it
/// actually drew out.
#[async_trait]
pub trait RenderClient: Send + Sync {
    async fn render(&self, config: &ChartConfig) -> Result<RenderResponse, RenderError>;
}

/// Posts configs to `{backend_url}/poster/render`.
#[derive(Debug, Clone)]
pub struct HttpRenderClient {
    client: Client,
    url: String,
}

impl HttpRenderClient {
    pub fn new(backend_url: &str) -> Result<Self, RenderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(RENDER_TIMEOUT_SECONDS))
            .build()
            .map_err(|e| RenderError::Transport(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/poster/render", backend_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl RenderClient for HttpRenderClient {
    async fn render(&self, config: &ChartConfig) -> Result<RenderResponse, RenderError> {
        debug!(url = %self.url, kind = %config.kind(), "Forwarding render request");
        let response = self
            .client
            .post(&self.url)
            .json(config)
            .send()
            .await
            .map_err(|e| RenderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Render backend rejected config");
            return Err(RenderError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<RenderResponse>()
            .await
            .map_err(|e| RenderError::Decode(e.to_string()))
    }
}
