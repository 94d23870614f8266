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

//! Binding Normalizer: loose JSON from clients and the model in, strict
//! bindings out. Every externally supplied binding passes through here.
//!
//! Each target field takes the first non-null alias in its fallback chain,
//! so `{"x": "pool", "y": "usd"}` and the canonical field names both work.

use poster_contracts::{
    AxisBinding, BindingState, ChartKind, DualBinding, LabelBinding, MissingMode, SeriesBinding,
};
use poster_engine::key_of;
use serde_json::Value;

const DEFAULT_SERIES_KEY: &str = "Series";

/// First alias of `fields` holding a scalar, as text. Scalars coerce the
/// same way cell values do when they become keys.
fn text_field(obj: &Value, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| match obj.get(field)? {
        scalar @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => key_of(scalar),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    })
}

fn text_or(obj: &Value, fields: &[&str], fallback: &str) -> String {
    text_field(obj, fields).unwrap_or_else(|| fallback.to_string())
}

fn is_present(value: Option<&Value>) -> bool {
    value.is_some_and(|v| !v.is_null())
}

/// Pie or bar binding from any object shape. Non-objects yield a binding
/// with empty fields, which query validation then rejects.
pub fn normalize_label_binding(raw: &Value, default_db: &str) -> LabelBinding {
    LabelBinding {
        db: text_or(raw, &["db"], default_db),
        table: text_or(raw, &["table"], ""),
        label_column: text_or(raw, &["label_column", "x"], ""),
        value_column: text_or(raw, &["value_column", "y"], ""),
    }
}

fn normalize_series(raw: &Value) -> SeriesBinding {
    SeriesBinding {
        key: text_or(raw, &["key", "name"], DEFAULT_SERIES_KEY),
        value_column: text_or(raw, &["value_column", "col"], ""),
    }
}

/// One dual-chart axis. `None` for null or non-object input.
pub fn normalize_axis(raw: &Value, default_db: &str) -> Option<AxisBinding> {
    if !raw.is_object() {
        return None;
    }
    let series = raw
        .get("series")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(normalize_series).collect())
        .unwrap_or_default();
    Some(AxisBinding {
        db: text_or(raw, &["db"], default_db),
        table: text_or(raw, &["table"], ""),
        x_column: text_or(raw, &["x_column", "x"], ""),
        series,
        // Kept as sent; query validation rejects grouping without a column.
        grouped: raw.get("grouped").and_then(Value::as_bool).unwrap_or(false),
        group_column: text_or(raw, &["group_column"], ""),
        missing_mode: MissingMode::from_loose(raw.get("missing_mode").and_then(Value::as_str)),
    })
}

/// Restricts an axis to what the right side of a dual chart supports:
/// one series, no grouping.
pub fn right_axis(mut axis: AxisBinding) -> AxisBinding {
    axis.series.truncate(1);
    axis.grouped = false;
    axis.group_column.clear();
    axis
}

/// Dual binding from either the `{left, right}` shape or a single axis,
/// which becomes the left side.
pub fn normalize_dual_binding(raw: &Value, default_db: &str) -> DualBinding {
    let split = is_present(raw.get("left")) || is_present(raw.get("right"));
    if split {
        DualBinding {
            left: raw.get("left").and_then(|v| normalize_axis(v, default_db)),
            right: raw
                .get("right")
                .and_then(|v| normalize_axis(v, default_db))
                .map(right_axis),
        }
    } else {
        DualBinding {
            left: normalize_axis(raw, default_db),
            right: None,
        }
    }
}

/// Strict binding for `kind`, whatever shape `raw` arrived in.
pub fn normalize_binding(kind: ChartKind, raw: &Value, default_db: &str) -> BindingState {
    match kind {
        ChartKind::Pie => BindingState::Pie(normalize_label_binding(raw, default_db)),
        ChartKind::Bar => BindingState::Bar(normalize_label_binding(raw, default_db)),
        ChartKind::Dual => BindingState::Dual(normalize_dual_binding(raw, default_db)),
    }
}
