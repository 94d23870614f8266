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

//! On-demand aggregation over gzip JSON-lines tables.
//!
//! A query flows storage → [`decoder`] → [`aggregate`] → [`gapfill`], with
//! [`keys`] imposing the output order. [`QueryEngine`] ties the steps
//! together behind request validation.

pub mod aggregate;
pub mod catalog;
pub mod decoder;
pub mod error;
pub mod gapfill;
pub mod keys;
pub mod query;
pub mod storage;

pub use aggregate::{GroupedAggregator, LabelAggregator, RowSink, SeriesAggregator};
pub use decoder::{DecodeMode, DecodeStats, LineDecoder, Record, RowStream};
pub use error::{QueryError, QueryResult};
pub use gapfill::{fill_series, index_map, realign};
pub use keys::{compare_keys, key_of, number_of, sort_keys, sorted_keys};
pub use query::{validate_axis, validate_labels, QueryEngine};
pub use storage::{ByteStream, HttpStore, LocalStore, ObjectStore};
