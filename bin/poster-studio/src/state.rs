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

use crate::render::{HttpRenderClient, RenderClient};
use crate::settings::{Settings, StorageKind};
use anyhow::{anyhow, Context, Result};
use poster_assist::{AssistService, OpenAiClient};
use poster_engine::{HttpStore, LocalStore, ObjectStore, QueryEngine};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything a request handler needs. Cheap to clone; handlers share no
/// mutable state.
#[derive(Clone)]
pub struct AppState {
    pub engine: QueryEngine,
    pub assist: Option<AssistService>,
    pub render: Arc<dyn RenderClient>,
    pub default_db: Arc<str>,
}

impl AppState {
    pub fn new(
        engine: QueryEngine,
        assist: Option<AssistService>,
        render: Arc<dyn RenderClient>,
        default_db: &str,
    ) -> Self {
        Self {
            engine,
            assist,
            render,
            default_db: Arc::from(default_db),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let store: Arc<dyn ObjectStore> = match settings.storage.kind {
            StorageKind::Local => Arc::new(LocalStore::new(settings.storage.root.clone())),
            StorageKind::Http => {
                let base_url = settings
                    .storage
                    .base_url
                    .as_deref()
                    .ok_or_else(|| anyhow!("storage.base_url is required for the http store"))?;
                Arc::new(HttpStore::new(base_url))
            }
        };
        info!(backend = store.backend(), strict = settings.query.strict_decode, "Object store ready");
        let engine = QueryEngine::new(store).with_decode_mode(settings.query.decode_mode());

        let assist = match settings.llm.api_key.as_deref() {
            Some(key) => {
                let client = OpenAiClient::new(
                    key,
                    settings.llm.endpoint.clone(),
                    Some(settings.llm.timeout_seconds),
                )
                .context("LLM client init")?;
                let mut service = AssistService::new(
                    Arc::new(client),
                    settings.llm.model.clone(),
                    settings.binding.default_db.clone(),
                );
                if let Some(temperature) = settings.llm.temperature {
                    service = service.with_temperature(temperature);
                }
                info!(model = %settings.llm.model, "Assistant enabled");
                Some(service)
            }
            None => {
                warn!("No LLM API key configured, assistant disabled");
                None
            }
        };

        let render = HttpRenderClient::new(&settings.render.backend_url)
            .map_err(|e| anyhow!("render client init: {e}"))?;

        Ok(Self::new(
            engine,
            assist,
            Arc::new(render),
            &settings.binding.default_db,
        ))
    }
}
