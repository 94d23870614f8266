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
use poster_assist::{AssistError, AssistService, ChatCompletion};
use poster_contracts::{
    AiConfigRequest, BindingState, ChartConfig, ChartKind, ChatMessage, ChatRole, LLMError,
    LLMResult, PieConfig, PosterBase, ProviderRequest, ProviderResponse, Usage,
};
use std::sync::{Arc, Mutex};

struct Scripted {
    reply: LLMResult<String>,
    seen: Mutex<Vec<ProviderRequest>>,
}

impl Scripted {
    fn replying(text: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(text.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            reply: Err(LLMError::Timeout),
            seen: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl ChatCompletion for Scripted {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse> {
        let model = request.model.clone();
        self.seen.lock().unwrap().push(request);
        match &self.reply {
            Ok(text) => Ok(ProviderResponse {
                content: text.clone(),
                model,
                usage: Usage::default(),
                finish_reason: Some("stop".into()),
            }),
            Err(_) => Err(LLMError::Timeout),
        }
    }
}

fn request() -> AiConfigRequest {
    AiConfigRequest {
        messages: vec![ChatMessage {
            role: ChatRole::User,
            content: "Turn this into a bar chart of volume by pool".into(),
        }],
        poster_type: ChartKind::Pie,
        config: ChartConfig::Pie(PieConfig {
            base: PosterBase {
                title: "Share".into(),
                center_image: Some("uploads/center.png".into()),
                ..PosterBase::default()
            },
            ..PieConfig::default()
        }),
        binding: None,
        catalog: Vec::new(),
    }
}

#[tokio::test]
async fn proposal_is_enforced_before_returning() {
    let stub = Scripted::replying(
        r#"```json
{"assistant_message": "Switched to bar.", "posterType": "bar",
 "config": {"title": "Volume by pool", "labels": ["A"], "values": [3], "center_image": "other.png"},
 "binding": {"table": "fact_swaps", "x": "pool", "y": "volume_usd"}}
```"#,
    );
    let service = AssistService::new(stub.clone(), "gpt-4o-mini", "plasma");

    let response = service.propose(&request()).await.unwrap();
    assert_eq!(response.poster_type, ChartKind::Bar);
    assert_eq!(response.assistant_message, "Switched to bar.");
    assert_eq!(
        response.config.base().center_image.as_deref(),
        Some("uploads/center.png")
    );
    let Some(BindingState::Bar(binding)) = response.binding else {
        panic!("expected bar binding");
    };
    assert_eq!(binding.db, "plasma");
    assert_eq!(binding.label_column, "pool");

    let seen = stub.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].messages[0].role, "system");
    assert!(seen[0].messages[1].content.contains("volume by pool"));
    assert_eq!(
        seen[0].response_format.as_ref().map(|f| f.format_type.as_str()),
        Some("json_object")
    );
}

#[tokio::test]
async fn proposal_without_config_is_rejected() {
    let service = AssistService::new(
        Scripted::replying(r#"{"assistant_message": "hi", "posterType": "pie"}"#),
        "m",
        "plasma",
    );
    let err = service.propose(&request()).await.unwrap_err();
    assert!(err.is_bad_proposal());
}

#[tokio::test]
async fn upstream_failure_is_not_retried() {
    let stub = Scripted::failing();
    let service = AssistService::new(stub.clone(), "m", "plasma");
    let err = service.propose(&request()).await.unwrap_err();
    assert!(matches!(err, AssistError::Llm(LLMError::Timeout)));
    assert_eq!(stub.seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn non_json_completion_is_an_llm_error() {
    let service = AssistService::new(Scripted::replying("I cannot help with that."), "m", "plasma");
    let err = service.propose(&request()).await.unwrap_err();
    assert!(matches!(err, AssistError::Llm(LLMError::Serialisation(_))));
}
