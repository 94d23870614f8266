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

use crate::bindings::{AxisBinding, LabelBinding};
use crate::config::ChartConfig;
use crate::types::{AxisSide, ChartKind};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/query`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryRequest {
    Pie(LabelBinding),
    Bar(LabelBinding),
    Dual(AxisBinding),
}

impl QueryRequest {
    pub const fn kind(&self) -> ChartKind {
        match self {
            Self::Pie(_) => ChartKind::Pie,
            Self::Bar(_) => ChartKind::Bar,
            Self::Dual(_) => ChartKind::Dual,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogTable {
    pub table: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSchema {
    pub db: String,
    pub tables: Vec<CatalogTable>,
}

/// Body of `POST /api/ai-config`.
///
/// `binding` is forwarded to the model as context only, so it is kept as
/// loose JSON; whatever comes back goes through the binding normaliser.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfigRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(rename = "posterType")]
    pub poster_type: ChartKind,
    pub config: ChartConfig,
    #[serde(default)]
    pub binding: Option<serde_json::Value>,
    #[serde(default)]
    pub catalog: Vec<CatalogSchema>,
}

/// Body of `POST /api/apply`: query one binding and merge it into `config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub config: ChartConfig,
    pub binding: serde_json::Value,
    #[serde(default)]
    pub side: AxisSide,
}
