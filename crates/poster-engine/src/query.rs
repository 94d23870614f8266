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

use crate::aggregate::{drain_into, GroupedAggregator, LabelAggregator, SeriesAggregator};
use crate::decoder::{DecodeMode, RowStream};
use crate::error::{QueryError, QueryResult};
use crate::storage::ObjectStore;
use poster_contracts::{
    AxisBinding, ChartKind, LabelBinding, LabelValues, QueryRequest, QueryResponse, TimeSeries,
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Validates query requests and runs them against an object store.
///
/// Holds no per-query state; concurrent queries share nothing but the store.
#[derive(Clone)]
pub struct QueryEngine {
    store: Arc<dyn ObjectStore>,
    mode: DecodeMode,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            mode: DecodeMode::Lenient,
        }
    }

    #[must_use]
    pub const fn with_decode_mode(mut self, mode: DecodeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub const fn decode_mode(&self) -> DecodeMode {
        self.mode
    }

    pub async fn execute(&self, request: &QueryRequest) -> QueryResult<QueryResponse> {
        match request {
            QueryRequest::Pie(binding) => self
                .labels(ChartKind::Pie, binding)
                .await
                .map(QueryResponse::Labels),
            QueryRequest::Bar(binding) => self
                .labels(ChartKind::Bar, binding)
                .await
                .map(QueryResponse::Labels),
            QueryRequest::Dual(binding) => self.series(binding).await.map(QueryResponse::Series),
        }
    }

    /// Label sums for a pie or bar chart.
    pub async fn labels(&self, kind: ChartKind, binding: &LabelBinding) -> QueryResult<LabelValues> {
        validate_labels(kind, binding)?;
        let started = Instant::now();
        let mut rows = self.open(&binding.object_key()).await?;

        let mut aggregator = LabelAggregator::new(&binding.label_column, &binding.value_column);
        let stats = drain_into(&mut rows, &mut aggregator).await?;
        let out = aggregator.finish();

        info!(
            kind = %kind,
            db = %binding.db,
            table = %binding.table,
            rows = stats.parsed,
            skipped = stats.skipped,
            labels = out.labels.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Label query complete"
        );
        Ok(out)
    }

    /// Gap-filled time series for one dual-chart axis.
    pub async fn series(&self, binding: &AxisBinding) -> QueryResult<TimeSeries> {
        validate_axis(binding)?;
        let started = Instant::now();
        let mut rows = self.open(&binding.object_key()).await?;

        let (out, stats) = if binding.grouped {
            let mut aggregator = GroupedAggregator::new(
                &binding.x_column,
                &binding.group_column,
                binding.series.clone(),
            );
            let stats = drain_into(&mut rows, &mut aggregator).await?;
            (aggregator.finish(binding.missing_mode), stats)
        } else {
            let mut aggregator = SeriesAggregator::new(&binding.x_column, binding.series.clone());
            let stats = drain_into(&mut rows, &mut aggregator).await?;
            (aggregator.finish(binding.missing_mode), stats)
        };

        info!(
            db = %binding.db,
            table = %binding.table,
            grouped = binding.grouped,
            rows = stats.parsed,
            skipped = stats.skipped,
            x_values = out.x_values.len(),
            series = out.y_series.len(),
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "Series query complete"
        );
        Ok(out)
    }

    async fn open(&self, key: &str) -> QueryResult<RowStream> {
        debug!(key, backend = self.store.backend(), "Opening table object");
        let source = self.store.get_object(key).await?;
        Ok(RowStream::new(key, source, self.mode))
    }
}

/// Rejects label bindings missing a required field.
pub fn validate_labels(kind: ChartKind, binding: &LabelBinding) -> QueryResult<()> {
    let complete = [
        &binding.db,
        &binding.table,
        &binding.label_column,
        &binding.value_column,
    ]
    .iter()
    .all(|field| !field.is_empty());
    if complete {
        Ok(())
    } else {
        Err(QueryError::Validation(format!(
            "db, table, label_column, and value_column are required for {kind} queries"
        )))
    }
}

/// Rejects axis bindings missing a required field, and grouped bindings
/// without a group column.
pub fn validate_axis(binding: &AxisBinding) -> QueryResult<()> {
    let series_complete = !binding.series.is_empty()
        && binding
            .series
            .iter()
            .all(|s| !s.key.is_empty() && !s.value_column.is_empty());
    if binding.db.is_empty() || binding.table.is_empty() || binding.x_column.is_empty() || !series_complete {
        return Err(QueryError::Validation(
            "db, table, x_column, and at least one series are required".to_string(),
        ));
    }
    if binding.grouped && binding.group_column.is_empty() {
        return Err(QueryError::Validation(
            "group_column is required when grouped=true for dual timeseries".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use poster_contracts::SeriesBinding;

    #[test]
    fn label_validation_names_the_chart_kind() {
        let err = validate_labels(ChartKind::Pie, &LabelBinding::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "db, table, label_column, and value_column are required for pie queries"
        );
    }

    #[test]
    fn grouped_axis_requires_group_column() {
        let binding = AxisBinding {
            db: "plasma".into(),
            table: "fact_swaps".into(),
            x_column: "date".into(),
            series: vec![SeriesBinding::new("Swaps", "n")],
            grouped: true,
            ..AxisBinding::default()
        };
        let err = validate_axis(&binding).unwrap_err();
        assert!(err.is_client_error());
        assert!(err.to_string().starts_with("group_column is required"));
    }

    #[test]
    fn axis_without_series_is_rejected() {
        let binding = AxisBinding {
            db: "plasma".into(),
            table: "fact_swaps".into(),
            x_column: "date".into(),
            ..AxisBinding::default()
        };
        assert_eq!(
            validate_axis(&binding).unwrap_err().to_string(),
            "db, table, x_column, and at least one series are required"
        );
    }
}
