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

use super::error::ApiError;
use crate::state::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use poster_contracts::{
    AiConfigRequest, AiConfigResponse, ApplyRequest, ApplyResponse, AxisSide, BindingState,
    CatalogListing, ChartConfig, ChartKind, DualBinding, QueryRequest, QueryResponse,
    RenderResponse,
};
use poster_engine::catalog;
use poster_reconcile::{
    default_config, normalize_dual_binding, normalize_label_binding, reconcile_dual,
    reconcile_labels, right_axis,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

pub fn build_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/api/query", post(run_query))
        .route("/api/apply", post(apply_binding))
        .route("/api/ai-config", post(ai_config))
        .route("/api/catalog", get(catalog_listing))
        .route("/api/poster/default", get(default_poster))
        .route("/api/poster/render", post(render_poster))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

async fn run_query(
    State(state): State<AppState>,
    body: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<QueryResponse>, ApiError> {
    let Json(request) = body?;
    Ok(Json(state.engine.execute(&request).await?))
}

/// Queries one binding and merges the result into the posted config.
async fn apply_binding(
    State(state): State<AppState>,
    body: Result<Json<ApplyRequest>, JsonRejection>,
) -> Result<Json<ApplyResponse>, ApiError> {
    let Json(request) = body?;
    let kind = request.config.kind();

    let response = match &request.config {
        ChartConfig::Pie(_) | ChartConfig::Bar(_) => {
            let binding = normalize_label_binding(&request.binding, &state.default_db);
            let fresh = state.engine.labels(kind, &binding).await?;
            let config = reconcile_labels(&request.config, fresh)?;
            let binding = if kind == ChartKind::Pie {
                BindingState::Pie(binding)
            } else {
                BindingState::Bar(binding)
            };
            ApplyResponse { config, binding }
        }
        ChartConfig::Dual(dual) => {
            let side = request.side;
            let binding = dual_binding_for(&request.binding, side, &state.default_db);
            let axis = match side {
                AxisSide::Left => binding.left.as_ref(),
                AxisSide::Right => binding.right.as_ref(),
            }
            .ok_or_else(|| ApiError::bad_request(format!("binding has no {} axis", side_name(side))))?;
            let fresh = state.engine.series(axis).await?;
            let config = reconcile_dual(dual, &binding, side, &fresh)?;
            ApplyResponse {
                config: ChartConfig::Dual(config),
                binding: BindingState::Dual(binding),
            }
        }
    };
    info!(kind = %kind, "Binding applied");
    Ok(Json(response))
}

/// A bare axis (no `left`/`right` keys) binds whichever side is being applied.
fn dual_binding_for(raw: &Value, side: AxisSide, default_db: &str) -> DualBinding {
    let present = |key: &str| raw.get(key).is_some_and(|v| !v.is_null());
    let split = present("left") || present("right");
    let mut binding = normalize_dual_binding(raw, default_db);
    if !split && side == AxisSide::Right {
        binding.right = binding.left.take().map(right_axis);
    }
    binding
}

const fn side_name(side: AxisSide) -> &'static str {
    match side {
        AxisSide::Left => "left",
        AxisSide::Right => "right",
    }
}

async fn ai_config(
    State(state): State<AppState>,
    body: Result<Json<AiConfigRequest>, JsonRejection>,
) -> Result<Json<AiConfigResponse>, ApiError> {
    let Json(mut request) = body?;
    let assist = state.assist.as_ref().ok_or_else(ApiError::assistant_disabled)?;
    if request.catalog.is_empty() {
        match catalog::snapshot(state.engine.store().as_ref()).await {
            Ok(snapshot) => request.catalog = snapshot,
            Err(e) => warn!(error = %e, "Catalog snapshot unavailable, asking without one"),
        }
    }
    Ok(Json(assist.propose(&request).await?))
}

#[derive(Debug, Deserialize)]
struct CatalogParams {
    db: Option<String>,
    table: Option<String>,
}

async fn catalog_listing(
    State(state): State<AppState>,
    params: Result<Query<CatalogParams>, QueryRejection>,
) -> Result<Json<CatalogListing>, ApiError> {
    let Query(params) = params?;
    let db = params.db.as_deref().filter(|s| !s.is_empty());
    let table = params.table.as_deref().filter(|s| !s.is_empty());
    Ok(Json(catalog::list(state.engine.store().as_ref(), db, table).await?))
}

#[derive(Debug, Deserialize)]
struct DefaultParams {
    poster_type: Option<String>,
}

async fn default_poster(
    params: Result<Query<DefaultParams>, QueryRejection>,
) -> Result<Json<ChartConfig>, ApiError> {
    let Query(params) = params?;
    let raw = params
        .poster_type
        .ok_or_else(|| ApiError::bad_request("poster_type is required"))?;
    let kind: ChartKind = raw.parse().map_err(ApiError::bad_request)?;
    Ok(Json(default_config(kind)))
}

async fn render_poster(
    State(state): State<AppState>,
    body: Result<Json<ChartConfig>, JsonRejection>,
) -> Result<Json<RenderResponse>, ApiError> {
    let Json(config) = body?;
    Ok(Json(state.render.render(&config).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_axis_binds_the_applied_side() {
        let raw = json!({
            "table": "fact_swaps",
            "x_column": "date",
            "series": [{"key": "Volume", "value_column": "volume"}, {"key": "Fees", "value_column": "fees"}],
            "grouped": true,
            "group_column": "pool"
        });
        let right = dual_binding_for(&raw, AxisSide::Right, "plasma");
        assert!(right.left.is_none());
        let axis = right.right.unwrap();
        assert_eq!(axis.series.len(), 1);
        assert!(!axis.grouped);

        let left = dual_binding_for(&raw, AxisSide::Left, "plasma");
        assert_eq!(left.left.unwrap().series.len(), 2);
        assert!(left.right.is_none());
    }

    #[test]
    fn split_binding_keeps_both_sides() {
        let raw = json!({
            "left": {"table": "a", "x_column": "d", "series": [{"key": "S", "value_column": "v"}]},
            "right": {"table": "b", "x_column": "d", "series": [{"key": "T", "value_column": "w"}]}
        });
        let binding = dual_binding_for(&raw, AxisSide::Right, "plasma");
        assert_eq!(binding.left.unwrap().table, "a");
        assert_eq!(binding.right.unwrap().table, "b");
    }
}
