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

use crate::types::{ChartKind, MissingMode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesBinding {
    pub key: String,
    pub value_column: String,
}

impl SeriesBinding {
    pub fn new(key: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value_column: value_column.into(),
        }
    }
}

/// Data source of one dual-chart axis.
///
/// Every field defaults so that an incomplete request still deserialises and
/// is rejected by validation with a readable message instead of a serde error.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AxisBinding {
    #[serde(default)]
    pub db: String,
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub x_column: String,
    #[serde(default)]
    pub series: Vec<SeriesBinding>,
    #[serde(default)]
    pub grouped: bool,
    #[serde(default)]
    pub group_column: String,
    #[serde(default, deserialize_with = "MissingMode::deserialize_loose")]
    pub missing_mode: MissingMode,
}

impl AxisBinding {
    pub fn object_key(&self) -> String {
        object_key(&self.db, &self.table)
    }
}

/// Single-key, single-value descriptor used by pie and bar charts.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LabelBinding {
    #[serde(default)]
    pub db: String,
    #[serde(default)]
    pub table: String,
    #[serde(default)]
    pub label_column: String,
    #[serde(default)]
    pub value_column: String,
}

impl LabelBinding {
    pub fn object_key(&self) -> String {
        object_key(&self.db, &self.table)
    }
}

pub type PieBinding = LabelBinding;
pub type BarBinding = LabelBinding;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DualBinding {
    #[serde(default)]
    pub left: Option<AxisBinding>,
    #[serde(default)]
    pub right: Option<AxisBinding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingState {
    Pie(PieBinding),
    Bar(BarBinding),
    Dual(DualBinding),
}

impl BindingState {
    pub const fn kind(&self) -> ChartKind {
        match self {
            Self::Pie(_) => ChartKind::Pie,
            Self::Bar(_) => ChartKind::Bar,
            Self::Dual(_) => ChartKind::Dual,
        }
    }
}

/// Tables are stored as one gzip-compressed JSON-lines object each.
pub fn object_key(db: &str, table: &str) -> String {
    format!("{db}/{table}.jsonl.gz")
}
