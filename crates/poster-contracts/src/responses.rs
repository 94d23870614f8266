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

use crate::bindings::BindingState;
use crate::config::ChartConfig;
use crate::types::ChartKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelValues {
    pub labels: Vec<String>,
    pub values: Vec<f64>,
}

/// Dense time series: every array in `y_series` has `x_values.len()` points.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    pub x_values: Vec<String>,
    pub y_series: IndexMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryResponse {
    Labels(LabelValues),
    Series(TimeSeries),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiConfigResponse {
    pub assistant_message: String,
    #[serde(rename = "posterType")]
    pub poster_type: ChartKind,
    pub config: ChartConfig,
    pub binding: Option<BindingState>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplyResponse {
    pub config: ChartConfig,
    pub binding: BindingState,
}

/// What the chart-render service returns for a config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderResponse {
    pub ok: bool,
    pub image_base64: String,
    pub config_used: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CatalogListing {
    Columns {
        db: String,
        table: String,
        columns: Vec<String>,
    },
    Tables {
        db: String,
        tables: Vec<String>,
    },
    Databases {
        dbs: Vec<String>,
    },
}
