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

use poster_contracts::ChartKind;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("Malformed proposal: {0}")]
    MalformedProposal(String),
    #[error("Timeseries response had no series for right axis")]
    EmptyRightSeries,
    #[error("Cannot apply {data} data to a {config} config")]
    KindMismatch { config: ChartKind, data: &'static str },
}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;

impl ReconcileError {
    pub const fn category(&self) -> &'static str {
        match self {
            Self::MalformedProposal(_) => "malformed_proposal",
            Self::EmptyRightSeries => "empty_right_series",
            Self::KindMismatch { .. } => "kind_mismatch",
        }
    }
}
