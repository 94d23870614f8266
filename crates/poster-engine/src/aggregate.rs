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

//! Single-pass sum reductions over decoded records.
//!
//! Aggregators hold sparse sums only; densification onto the sorted key
//! domain happens in `finish`.

use crate::decoder::{DecodeStats, Record, RowStream};
use crate::error::QueryResult;
use crate::gapfill::fill_series;
use crate::keys::{key_of, number_of, sort_keys};
use indexmap::IndexMap;
use poster_contracts::{LabelValues, MissingMode, SeriesBinding, TimeSeries};
use std::collections::{BTreeSet, HashMap};

/// Separator between group and series key in grouped multi-series names.
pub const GROUP_SERIES_SEPARATOR: &str = " – ";

pub trait RowSink {
    fn accept(&mut self, record: &Record);
}

/// Feeds every remaining record of `rows` into `sink`.
pub async fn drain_into<S>(rows: &mut RowStream, sink: &mut S) -> QueryResult<DecodeStats>
where
    S: RowSink + ?Sized,
{
    while let Some(record) = rows.next_record().await? {
        sink.accept(&record);
    }
    Ok(rows.stats())
}

fn cell_key(record: &Record, column: &str) -> Option<String> {
    record.get(column).and_then(key_of)
}

fn cell_number(record: &Record, column: &str) -> Option<f64> {
    record.get(column).and_then(number_of)
}

fn unique_keys(series: &[SeriesBinding]) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(series.len());
    for s in series {
        if !keys.contains(&s.key) {
            keys.push(s.key.clone());
        }
    }
    keys
}

/// Pie and bar reduction: one sum per distinct label.
#[derive(Debug, Clone)]
pub struct LabelAggregator {
    label_column: String,
    value_column: String,
    sums: IndexMap<String, f64>,
}

impl LabelAggregator {
    pub fn new(label_column: impl Into<String>, value_column: impl Into<String>) -> Self {
        Self {
            label_column: label_column.into(),
            value_column: value_column.into(),
            sums: IndexMap::new(),
        }
    }

    pub fn finish(self) -> LabelValues {
        let mut labels: Vec<String> = self.sums.keys().cloned().collect();
        sort_keys(&mut labels);
        let values = labels
            .iter()
            .map(|l| self.sums.get(l).copied().unwrap_or_default())
            .collect();
        LabelValues { labels, values }
    }
}

impl RowSink for LabelAggregator {
    fn accept(&mut self, record: &Record) {
        let Some(label) = cell_key(record, &self.label_column) else {
            return;
        };
        let Some(value) = cell_number(record, &self.value_column) else {
            return;
        };
        *self.sums.entry(label).or_insert(0.0) += value;
    }
}

/// Dual reduction without grouping: sums per `(x, series key)`.
///
/// A row with an x value opens its bucket even if none of its series
/// columns are numeric, so the x key still shows up in the domain.
#[derive(Debug, Clone)]
pub struct SeriesAggregator {
    x_column: String,
    series: Vec<SeriesBinding>,
    buckets: HashMap<String, HashMap<String, f64>>,
}

impl SeriesAggregator {
    pub fn new(x_column: impl Into<String>, series: Vec<SeriesBinding>) -> Self {
        Self {
            x_column: x_column.into(),
            series,
            buckets: HashMap::new(),
        }
    }

    pub fn finish(self, mode: MissingMode) -> TimeSeries {
        let mut x_values: Vec<String> = self.buckets.keys().cloned().collect();
        sort_keys(&mut x_values);

        let y_series = unique_keys(&self.series)
            .into_iter()
            .map(|name| {
                let dense = fill_series(
                    &x_values,
                    |x| self.buckets.get(x).and_then(|b| b.get(&name)).copied(),
                    mode,
                );
                (name, dense)
            })
            .collect();
        TimeSeries { x_values, y_series }
    }
}

impl RowSink for SeriesAggregator {
    fn accept(&mut self, record: &Record) {
        let Some(x) = cell_key(record, &self.x_column) else {
            return;
        };
        let bucket = self.buckets.entry(x).or_default();
        for s in &self.series {
            if let Some(value) = cell_number(record, &s.value_column) {
                *bucket.entry(s.key.clone()).or_insert(0.0) += value;
            }
        }
    }
}

/// Dual reduction with grouping: sums per `(x, group, series key)`.
///
/// Rows missing either the x or the group value are skipped entirely.
#[derive(Debug, Clone)]
pub struct GroupedAggregator {
    x_column: String,
    group_column: String,
    series: Vec<SeriesBinding>,
    groups: BTreeSet<String>,
    buckets: HashMap<String, HashMap<String, HashMap<String, f64>>>,
}

impl GroupedAggregator {
    pub fn new(
        x_column: impl Into<String>,
        group_column: impl Into<String>,
        series: Vec<SeriesBinding>,
    ) -> Self {
        Self {
            x_column: x_column.into(),
            group_column: group_column.into(),
            series,
            groups: BTreeSet::new(),
            buckets: HashMap::new(),
        }
    }

    /// Output series name for one group and series key. With a single
    /// declared series the group value alone names the series.
    pub fn series_name(&self, group: &str, key: &str) -> String {
        if self.series.len() == 1 {
            group.to_string()
        } else {
            format!("{group}{GROUP_SERIES_SEPARATOR}{key}")
        }
    }

    pub fn finish(self, mode: MissingMode) -> TimeSeries {
        let mut x_values: Vec<String> = self.buckets.keys().cloned().collect();
        sort_keys(&mut x_values);

        let keys = unique_keys(&self.series);
        let mut y_series = IndexMap::new();
        for group in &self.groups {
            for key in &keys {
                let dense = fill_series(
                    &x_values,
                    |x| {
                        self.buckets
                            .get(x)
                            .and_then(|g| g.get(group))
                            .and_then(|b| b.get(key))
                            .copied()
                    },
                    mode,
                );
                y_series.insert(self.series_name(group, key), dense);
            }
        }
        TimeSeries { x_values, y_series }
    }
}

impl RowSink for GroupedAggregator {
    fn accept(&mut self, record: &Record) {
        let (Some(x), Some(group)) = (
            cell_key(record, &self.x_column),
            cell_key(record, &self.group_column),
        ) else {
            return;
        };
        if !self.groups.contains(&group) {
            self.groups.insert(group.clone());
        }
        let bucket = self
            .buckets
            .entry(x)
            .or_default()
            .entry(group)
            .or_default();
        for s in &self.series {
            if let Some(value) = cell_number(record, &s.value_column) {
                *bucket.entry(s.key.clone()).or_insert(0.0) += value;
            }
        }
    }
}
