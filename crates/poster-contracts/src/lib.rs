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

//! Wire and data-model types shared by the query engine, the reconciler,
//! the assistant and the HTTP surface. Nothing in here performs I/O.

pub mod bindings;
pub mod config;
pub mod llm;
pub mod requests;
pub mod responses;
pub mod types;

pub use bindings::{
    AxisBinding, BarBinding, BindingState, DualBinding, LabelBinding, PieBinding, SeriesBinding,
};
pub use config::{
    AxisKey, BarConfig, ChartConfig, DualConfig, HighlightPoint, HighlightRegion, PieConfig,
    PosterBase, DEFAULT_RIGHT_COLOR, DEFAULT_VALUE_AXIS_LABEL,
};
pub use llm::{LLMError, LLMResult, Message, ProviderRequest, ProviderResponse, ResponseFormat, Usage};
pub use requests::*;
pub use responses::*;
pub use types::{AxisSide, ChartKind, MissingMode, Orientation, SeriesType, TimeBucket, TimeRange};
