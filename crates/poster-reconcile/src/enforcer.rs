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

//! Invariant Enforcer for externally proposed config and binding pairs.
//!
//! The proposal is handled as raw JSON until the repairs are done, so that
//! fields a model omitted or nulled out get their defaults instead of
//! failing deserialisation.

use crate::error::{ReconcileError, ReconcileResult};
use crate::normalizer::normalize_binding;
use poster_contracts::{AiConfigResponse, ChartConfig, ChartKind, DEFAULT_RIGHT_COLOR};
use poster_engine::{key_of, number_of};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

const DUAL_DEFAULTS: [(&str, &str); 6] = [
    ("ylabel_left", ""),
    ("ylabel_right", ""),
    ("right_color_hex", DEFAULT_RIGHT_COLOR),
    ("right_series_type", "line"),
    ("timeRange", "all"),
    ("timeBucket", "none"),
];

const KEY_ARRAYS: [&str; 2] = ["labels", "x_values"];
const NUMBER_ARRAYS: [&str; 2] = ["values", "right_series"];
const TEXT_FIELDS: [&str; 7] = [
    "title",
    "subtitle",
    "note_value",
    "date_str",
    "ylabel_left",
    "ylabel_right",
    "value_axis_label",
];

fn malformed(reason: impl Into<String>) -> ReconcileError {
    ReconcileError::MalformedProposal(reason.into())
}

fn proposed_kind(proposal: &Value) -> ReconcileResult<ChartKind> {
    let raw = proposal
        .get("posterType")
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("AI response missing posterType or config"))?;
    ChartKind::from_str(raw).map_err(|e| malformed(e.to_string()))
}

/// Copies the upload-owned fields of `prior` over whatever was proposed.
fn protect_images(config: &mut Map<String, Value>, prior: &ChartConfig) {
    config.insert(
        "center_image".to_string(),
        prior.base().center_image.clone().map_or(Value::Null, Value::String),
    );
    config.insert(
        "label_images".to_string(),
        serde_json::to_value(prior.label_images()).unwrap_or(Value::Null),
    );
}

fn fill_dual_defaults(config: &mut Map<String, Value>) {
    for (field, default) in DUAL_DEFAULTS {
        let missing = config.get(field).map_or(true, Value::is_null);
        if missing {
            config.insert(field.to_string(), Value::String(default.to_string()));
        }
    }
}

fn coerce_numbers(items: &mut [Value]) {
    for item in items {
        *item = Value::from(number_of(item).unwrap_or(0.0));
    }
}

/// Brings scalar-level drift into the typed shape: keys become strings,
/// data points become numbers (0 when unreadable), and text fields take
/// the string form of numbers and booleans.
fn repair_shape(config: &mut Map<String, Value>) {
    for field in KEY_ARRAYS {
        if let Some(Value::Array(items)) = config.get_mut(field) {
            for item in items.iter_mut() {
                *item = Value::String(key_of(item).unwrap_or_default());
            }
        }
    }
    for field in NUMBER_ARRAYS {
        if let Some(Value::Array(items)) = config.get_mut(field) {
            coerce_numbers(items);
        }
    }
    if let Some(Value::Object(series)) = config.get_mut("y_series") {
        for values in series.values_mut() {
            if let Value::Array(items) = values {
                coerce_numbers(items);
            }
        }
    }
    for field in TEXT_FIELDS {
        if let Some(value @ (Value::Number(_) | Value::Bool(_))) = config.get_mut(field) {
            *value = Value::String(key_of(value).unwrap_or_default());
        }
    }
}

/// Typed config from the repaired object. Fields that still do not fit
/// their type are dropped one by one, so the rest of the proposal survives.
fn typed_config(kind: ChartKind, config: Map<String, Value>) -> ReconcileResult<ChartConfig> {
    if let Ok(typed) = serde_json::from_value(Value::Object(config.clone())) {
        return Ok(typed);
    }
    let mut kept = Map::new();
    kept.insert("poster_type".to_string(), Value::String(kind.as_str().to_string()));
    for (field, value) in config {
        if field == "poster_type" {
            continue;
        }
        kept.insert(field.clone(), value);
        if let Err(e) = serde_json::from_value::<ChartConfig>(Value::Object(kept.clone())) {
            warn!(kind = %kind, field = %field, error = %e, "Dropping proposed field of the wrong shape");
            kept.remove(&field);
        }
    }
    serde_json::from_value(Value::Object(kept))
        .map_err(|e| malformed(format!("config does not fit the {kind} poster shape: {e}")))
}

/// Validates and repairs a proposal against the prior authoritative config.
///
/// A proposal without a recognised `posterType` or without a `config`
/// object is rejected whole. Otherwise:
/// - `center_image` and `label_images` are taken from `prior`;
/// - dual configs get their display defaults filled;
/// - scalar drift in keys, data points and text fields is coerced, and
///   fields that still have the wrong shape are dropped;
/// - the binding is normalised for the proposed kind.
///
/// Array lengths are not repaired; violations are only logged.
pub fn enforce_proposal(
    prior: &ChartConfig,
    proposal: &Value,
    default_db: &str,
) -> ReconcileResult<AiConfigResponse> {
    let kind = proposed_kind(proposal)?;
    let mut config = proposal
        .get("config")
        .and_then(Value::as_object)
        .cloned()
        .ok_or_else(|| malformed("AI response missing posterType or config"))?;

    // Nulls fall back to serde defaults instead of failing typed fields.
    config.retain(|_, v| !v.is_null());
    config.insert("poster_type".to_string(), Value::String(kind.as_str().to_string()));
    protect_images(&mut config, prior);
    if kind == ChartKind::Dual {
        fill_dual_defaults(&mut config);
    }

    repair_shape(&mut config);
    let config = typed_config(kind, config)?;

    let problems = config.violations();
    if !problems.is_empty() {
        warn!(kind = %kind, problems = ?problems, "Proposed config breaks length invariants");
    }

    let binding = normalize_binding(
        kind,
        proposal.get("binding").unwrap_or(&Value::Null),
        default_db,
    );
    let assistant_message = proposal
        .get("assistant_message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    debug!(kind = %kind, previous = %prior.kind(), "Proposal enforced");

    Ok(AiConfigResponse {
        assistant_message,
        poster_type: kind,
        config,
        binding: Some(binding),
    })
}
