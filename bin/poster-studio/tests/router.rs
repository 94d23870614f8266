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
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use flate2::write::GzEncoder;
use flate2::Compression;
use poster_assist::{AssistService, ChatCompletion};
use poster_contracts::{
    ChartConfig, LLMResult, ProviderRequest, ProviderResponse, RenderResponse, Usage,
};
use poster_engine::{LocalStore, QueryEngine};
use poster_studio::http::build_router;
use poster_studio::render::{RenderClient, RenderError};
use poster_studio::AppState;
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tower::ServiceExt;

fn write_table(root: &Path, db: &str, table: &str, rows: &[Value]) {
    let dir = root.join(db);
    std::fs::create_dir_all(&dir).unwrap();
    let body: String = rows.iter().map(|r| format!("{r}\n")).collect();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(body.as_bytes()).unwrap();
    std::fs::write(dir.join(format!("{table}.jsonl.gz")), encoder.finish().unwrap()).unwrap();
}

struct CannedModel {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl ChatCompletion for CannedModel {
    async fn complete(&self, request: ProviderRequest) -> LLMResult<ProviderResponse> {
        self.prompts
            .lock()
            .unwrap()
            .push(request.messages[1].content.clone());
        Ok(ProviderResponse {
            content: self.reply.clone(),
            model: request.model,
            usage: Usage::default(),
            finish_reason: None,
        })
    }
}

enum RenderOutcome {
    Echo,
    Reject(&'static str),
}

struct StubRender(RenderOutcome);

#[async_trait]
impl RenderClient for StubRender {
    async fn render(&self, config: &ChartConfig) -> Result<RenderResponse, RenderError> {
        match self.0 {
            RenderOutcome::Echo => Ok(RenderResponse {
                ok: true,
                image_base64: "iVBORw0KGgo=".into(),
                config_used: serde_json::to_value(config).unwrap(),
            }),
            RenderOutcome::Reject(body) => Err(RenderError::Upstream {
                status: 500,
                body: body.into(),
            }),
        }
    }
}

struct Harness {
    _dir: TempDir,
    app: Router,
    model: Option<Arc<CannedModel>>,
}

fn seeded_dir() -> TempDir {
    let dir = TempDir::new().unwrap();
    write_table(
        dir.path(),
        "plasma",
        "daily",
        &[
            json!({"d": "2024-01-02", "v": 5, "fees": 1}),
            json!({"d": "2024-01-01", "v": 3, "fees": 2}),
            json!({"d": "2024-01-01", "v": 2}),
        ],
    );
    write_table(
        dir.path(),
        "plasma",
        "weekly",
        &[
            json!({"d": "2024-01-03", "fees": 7}),
            json!({"d": "2024-01-01", "fees": 4}),
        ],
    );
    write_table(
        dir.path(),
        "plasma",
        "venues",
        &[
            json!({"label": "x", "value": "bad"}),
            json!({"label": "x", "value": 4}),
            json!({"label": "y", "value": 1}),
        ],
    );
    dir
}

fn harness_with(model_reply: Option<&str>, render: RenderOutcome) -> Harness {
    let dir = seeded_dir();
    let engine = QueryEngine::new(Arc::new(LocalStore::new(dir.path())));
    let model = model_reply.map(|reply| {
        Arc::new(CannedModel {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        })
    });
    let assist = model
        .clone()
        .map(|m| AssistService::new(m as Arc<dyn ChatCompletion>, "test-model", "plasma"));
    let state = AppState::new(engine, assist, Arc::new(StubRender(render)), "plasma");
    Harness {
        _dir: dir,
        app: build_router(state, 64 * 1024),
        model,
    }
}

fn harness() -> Harness {
    harness_with(None, RenderOutcome::Echo)
}

async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| json!(String::from_utf8_lossy(&bytes)))
    };
    (status, value)
}

#[tokio::test]
async fn dual_query_returns_dense_ordered_series() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/query",
        Some(json!({
            "kind": "dual", "db": "plasma", "table": "daily", "x_column": "d",
            "series": [{"key": "S", "value_column": "v"}], "missing_mode": "zero"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"x_values": ["2024-01-01", "2024-01-02"], "y_series": {"S": [5.0, 5.0]}})
    );
}

#[tokio::test]
async fn bar_query_ignores_non_numeric_rows() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/query",
        Some(json!({"kind": "bar", "db": "plasma", "table": "venues", "label_column": "label", "value_column": "value"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"labels": ["x", "y"], "values": [4.0, 1.0]}));
}

#[tokio::test]
async fn missing_table_is_not_found() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/query",
        Some(json!({"kind": "pie", "db": "plasma", "table": "nope", "label_column": "a", "value_column": "b"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "SOURCE_UNAVAILABLE");
    assert!(body["request_id"].as_str().is_some_and(|id| !id.is_empty()));
}

#[tokio::test]
async fn grouped_without_group_column_is_rejected() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/query",
        Some(json!({
            "kind": "dual", "db": "plasma", "table": "daily", "x_column": "d",
            "series": [{"key": "S", "value_column": "v"}], "grouped": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unparsable_body_is_a_bad_request() {
    let h = harness();
    let (status, body) = call(&h.app, "POST", "/api/query", Some(json!({"kind": "radar"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
}

#[tokio::test]
async fn dual_apply_aligns_both_axes() {
    let h = harness();
    let (status, left) = call(
        &h.app,
        "POST",
        "/api/apply",
        Some(json!({
            "config": {"poster_type": "dual", "title": "Swaps", "center_image": "logo.png"},
            "binding": {"table": "daily", "x_column": "d", "series": [{"key": "Volume", "value_column": "v"}]},
            "side": "left"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(left["config"]["x_values"], json!(["2024-01-01", "2024-01-02"]));
    assert_eq!(left["binding"]["kind"], "dual");
    assert_eq!(left["binding"]["left"]["db"], "plasma");

    let (status, right) = call(
        &h.app,
        "POST",
        "/api/apply",
        Some(json!({
            "config": left["config"],
            "binding": {
                "left": left["binding"]["left"],
                "right": {"table": "weekly", "x_column": "d", "series": [{"key": "Fees", "value_column": "fees"}], "missing_mode": "forward_fill"}
            },
            "side": "right"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let config = &right["config"];
    assert_eq!(config["x_values"], json!(["2024-01-01", "2024-01-02", "2024-01-03"]));
    assert_eq!(config["y_series"]["Volume"], json!([5.0, 5.0, 0.0]));
    assert_eq!(config["right_series"], json!([4.0, 4.0, 7.0]));
    assert_eq!(config["center_image"], "logo.png");
    assert_eq!(config["colors_hex"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn right_apply_without_right_axis_is_rejected() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/apply",
        Some(json!({
            "config": {"poster_type": "dual"},
            "binding": {"left": {"table": "daily", "x_column": "d", "series": [{"key": "S", "value_column": "v"}]}},
            "side": "right"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn grouped_apply_without_group_column_is_rejected() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/apply",
        Some(json!({
            "config": {"poster_type": "dual"},
            "binding": {"table": "daily", "x_column": "d", "series": [{"key": "S", "value_column": "v"}], "grouped": true},
            "side": "left"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["message"].as_str().is_some_and(|m| m.starts_with("group_column is required")));
}

#[tokio::test]
async fn pie_apply_replaces_labels_and_keeps_images() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/apply",
        Some(json!({
            "config": {"poster_type": "pie", "title": "Share", "labels": ["old"], "values": [1], "center_image": "c.png"},
            "binding": {"table": "venues", "x": "label", "y": "value"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["config"]["labels"], json!(["x", "y"]));
    assert_eq!(body["config"]["values"], json!([4.0, 1.0]));
    assert_eq!(body["config"]["center_image"], "c.png");
    assert_eq!(body["binding"]["kind"], "pie");
}

#[tokio::test]
async fn catalog_lists_each_level() {
    let h = harness();
    let (_, dbs) = call(&h.app, "GET", "/api/catalog", None).await;
    assert_eq!(dbs, json!({"dbs": ["plasma"]}));

    let (_, tables) = call(&h.app, "GET", "/api/catalog?db=plasma", None).await;
    assert_eq!(tables, json!({"db": "plasma", "tables": ["daily", "venues", "weekly"]}));

    let (_, columns) = call(&h.app, "GET", "/api/catalog?db=plasma&table=daily", None).await;
    assert_eq!(
        columns,
        json!({"db": "plasma", "table": "daily", "columns": ["d", "fees", "v"]})
    );
}

#[tokio::test]
async fn default_poster_requires_known_type() {
    let h = harness();
    let (status, body) = call(&h.app, "GET", "/api/poster/default?poster_type=bar", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["poster_type"], "bar");
    assert_eq!(body["labels"].as_array().map(Vec::len), Some(5));

    let (status, _) = call(&h.app, "GET", "/api/poster/default", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = call(&h.app, "GET", "/api/poster/default?poster_type=radar", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ai_config_is_enforced_and_gets_catalog() {
    let h = harness_with(
        Some(
            r#"{"assistant_message": "Done.", "posterType": "pie",
                "config": {"title": "Venue share", "labels": ["x", "y"], "values": [4, 1], "center_image": "evil.png"},
                "binding": {"table": "venues", "label_column": "label", "value_column": "value"}}"#,
        ),
        RenderOutcome::Echo,
    );
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/ai-config",
        Some(json!({
            "messages": [{"role": "user", "content": "pie of venues"}],
            "posterType": "pie",
            "config": {"poster_type": "pie", "title": "Old", "center_image": "mine.png"},
            "binding": null
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posterType"], "pie");
    assert_eq!(body["config"]["center_image"], "mine.png");
    assert_eq!(body["binding"]["db"], "plasma");

    let model = h.model.as_ref().unwrap();
    let prompts = model.prompts.lock().unwrap();
    assert!(prompts[0].contains("\"venues\""));
}

#[tokio::test]
async fn ai_config_without_config_is_malformed() {
    let h = harness_with(
        Some(r#"{"assistant_message": "?", "posterType": "bar"}"#),
        RenderOutcome::Echo,
    );
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/ai-config",
        Some(json!({"messages": [], "posterType": "pie", "config": {"poster_type": "pie"}})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "MALFORMED_PROPOSAL");
}

#[tokio::test]
async fn ai_config_without_key_is_unavailable() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/ai-config",
        Some(json!({"messages": [], "posterType": "pie", "config": {"poster_type": "pie"}})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "ASSISTANT_DISABLED");
}

#[tokio::test]
async fn render_proxy_passes_through_and_maps_failures() {
    let h = harness();
    let (status, body) = call(
        &h.app,
        "POST",
        "/api/poster/render",
        Some(json!({"poster_type": "pie", "title": "T", "labels": ["a"], "values": [1]})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["config_used"]["title"], "T");

    let failing = harness_with(None, RenderOutcome::Reject("renderer crashed"));
    let (status, body) = call(
        &failing.app,
        "POST",
        "/api/poster/render",
        Some(json!({"poster_type": "pie"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "renderer crashed");
}
