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

//! Config Reconciler: merges freshly queried data into an existing config.
//!
//! For dual charts the two axes are queried separately but share one x
//! axis. Applying one side rebuilds the domain as the sorted union of the
//! old and new x keys, realigns the fresh series from the new domain and
//! the untouched side from the old one, each with its own missing mode.

use crate::error::{ReconcileError, ReconcileResult};
use crate::palette::assign_colors;
use indexmap::{IndexMap, IndexSet};
use poster_contracts::{
    AxisSide, BarConfig, ChartConfig, DualBinding, DualConfig, LabelValues, MissingMode,
    PieConfig, TimeSeries,
};
use poster_engine::{index_map, realign, sort_keys};
use tracing::debug;

/// Sorted, de-duplicated union of two key sequences.
pub fn union_domain(previous: &[String], fresh: &[String]) -> Vec<String> {
    let set: IndexSet<&String> = previous.iter().chain(fresh).collect();
    let mut union: Vec<String> = set.into_iter().cloned().collect();
    sort_keys(&mut union);
    union
}

fn axis_mode(binding: &DualBinding, side: AxisSide) -> MissingMode {
    let axis = match side {
        AxisSide::Left => binding.left.as_ref(),
        AxisSide::Right => binding.right.as_ref(),
    };
    axis.map(|a| a.missing_mode).unwrap_or_default()
}

/// Merges one axis worth of fresh data into a dual config.
///
/// `fresh` is the query output for `side`; only the first of its series is
/// used for the right axis. Display fields and image fields are carried
/// over untouched.
pub fn reconcile_dual(
    config: &DualConfig,
    binding: &DualBinding,
    side: AxisSide,
    fresh: &TimeSeries,
) -> ReconcileResult<DualConfig> {
    let left_mode = axis_mode(binding, AxisSide::Left);
    let right_mode = axis_mode(binding, AxisSide::Right);

    let union = union_domain(&config.x_values, &fresh.x_values);
    let prev_idx = index_map(&config.x_values);
    let new_idx = index_map(&fresh.x_values);

    let (y_series, right_series) = match side {
        AxisSide::Left => {
            let left: IndexMap<String, Vec<f64>> = fresh
                .y_series
                .iter()
                .map(|(name, values)| (name.clone(), realign(&union, &new_idx, values, left_mode)))
                .collect();
            let right = config
                .right_series
                .as_deref()
                .filter(|r| !r.is_empty())
                .map(|r| realign(&union, &prev_idx, r, right_mode));
            (left, right)
        }
        AxisSide::Right => {
            let (_, first) = fresh
                .y_series
                .first()
                .ok_or(ReconcileError::EmptyRightSeries)?;
            let left: IndexMap<String, Vec<f64>> = config
                .y_series
                .iter()
                .map(|(name, values)| (name.clone(), realign(&union, &prev_idx, values, left_mode)))
                .collect();
            (left, Some(realign(&union, &new_idx, first, right_mode)))
        }
    };

    let colors_hex = Some(assign_colors(y_series.len(), config.colors_hex.as_deref()));
    debug!(
        side = ?side,
        previous_x = config.x_values.len(),
        fresh_x = fresh.x_values.len(),
        union_x = union.len(),
        left_series = y_series.len(),
        "Reconciled dual config"
    );

    Ok(DualConfig {
        x_values: union,
        y_series,
        right_series,
        colors_hex,
        ..config.clone()
    })
}

/// Replaces pie data wholesale and re-derives one colour per label.
pub fn reconcile_pie(config: &PieConfig, fresh: LabelValues) -> PieConfig {
    let colors_hex = Some(assign_colors(fresh.labels.len(), config.colors_hex.as_deref()));
    PieConfig {
        labels: fresh.labels,
        values: fresh.values,
        colors_hex,
        ..config.clone()
    }
}

/// Replaces bar data wholesale. `label_images` stays as it was, even when
/// the label count changes.
pub fn reconcile_bar(config: &BarConfig, fresh: LabelValues) -> BarConfig {
    let colors_hex = Some(assign_colors(fresh.labels.len(), config.colors_hex.as_deref()));
    BarConfig {
        labels: fresh.labels,
        values: fresh.values,
        colors_hex,
        ..config.clone()
    }
}

/// Label data into whichever label chart `config` is.
pub fn reconcile_labels(config: &ChartConfig, fresh: LabelValues) -> ReconcileResult<ChartConfig> {
    match config {
        ChartConfig::Pie(c) => Ok(ChartConfig::Pie(reconcile_pie(c, fresh))),
        ChartConfig::Bar(c) => Ok(ChartConfig::Bar(reconcile_bar(c, fresh))),
        ChartConfig::Dual(_) => Err(ReconcileError::KindMismatch {
            config: config.kind(),
            data: "label",
        }),
    }
}
