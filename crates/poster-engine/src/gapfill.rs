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

use poster_contracts::MissingMode;
use std::collections::HashMap;

const MISSING_FILL: f64 = 0.0;

/// Densifies a sparse series onto `keys`: one output per key, same order.
///
/// Absent and non-finite lookups are missing. `Zero` writes 0 for them;
/// `ForwardFill` repeats the last present value and writes 0 while no
/// value has been seen yet.
pub fn fill_series<F>(keys: &[String], mut lookup: F, mode: MissingMode) -> Vec<f64>
where
    F: FnMut(&str) -> Option<f64>,
{
    let mut last: Option<f64> = None;
    keys.iter()
        .map(|key| match lookup(key).filter(|v| v.is_finite()) {
            Some(value) => {
                last = Some(value);
                value
            }
            None => match (mode, last) {
                (MissingMode::ForwardFill, Some(prev)) => prev,
                _ => MISSING_FILL,
            },
        })
        .collect()
}

/// Position of every key. Duplicate keys resolve to their last position.
pub fn index_map(keys: &[String]) -> HashMap<&str, usize> {
    keys.iter()
        .enumerate()
        .map(|(i, k)| (k.as_str(), i))
        .collect()
}

/// Moves a series that is dense over some old domain onto `union`, using
/// `index` (built from the old domain) to find each point.
pub fn realign(
    union: &[String],
    index: &HashMap<&str, usize>,
    series: &[f64],
    mode: MissingMode,
) -> Vec<f64> {
    fill_series(
        union,
        |key| index.get(key).and_then(|&i| series.get(i)).copied(),
        mode,
    )
}
