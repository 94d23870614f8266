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

use crate::client::ChatCompletion;
use crate::error::AssistResult;
use crate::json::extract_json_object;
use crate::prompts::{user_message, SYSTEM_PROMPT};
use poster_contracts::{AiConfigRequest, AiConfigResponse, Message, ProviderRequest, ResponseFormat};
use poster_reconcile::enforce_proposal;
use std::sync::Arc;
use tracing::info;

/// Turns a chat turn into an enforced config and binding proposal.
#[derive(Clone)]
pub struct AssistService {
    client: Arc<dyn ChatCompletion>,
    model: String,
    temperature: Option<f32>,
    default_db: String,
}

impl AssistService {
    pub fn new(client: Arc<dyn ChatCompletion>, model: impl Into<String>, default_db: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
            default_db: default_db.into(),
        }
    }

    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_request(&self, request: &AiConfigRequest) -> ProviderRequest {
        ProviderRequest {
            model: self.model.clone(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user(user_message(request))],
            temperature: self.temperature,
            response_format: Some(ResponseFormat::json_object()),
        }
    }

    /// Asks the model once and runs its answer through the enforcer with the
    /// request's config as the prior authoritative state.
    pub async fn propose(&self, request: &AiConfigRequest) -> AssistResult<AiConfigResponse> {
        let completion = self.client.complete(self.provider_request(request)).await?;
        let proposal = extract_json_object(&completion.content)?;
        let response = enforce_proposal(&request.config, &proposal, &self.default_db)?;
        info!(
            from = %request.poster_type,
            to = %response.poster_type,
            turns = request.messages.len(),
            "Assistant proposal accepted"
        );
        Ok(response)
    }
}
