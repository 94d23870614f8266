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

/// Colours handed to series and slices that have none yet, cycled in order.
pub const PALETTE: [&str; 7] = [
    "#1C5C3D", "#D97706", "#2563EB", "#10B981", "#F97316", "#7C3AED", "#F59E0B",
];

/// One colour per entry: existing colours are kept by position, positions
/// past the end take `PALETTE[i % 7]`.
pub fn assign_colors(count: usize, existing: Option<&[String]>) -> Vec<String> {
    let existing = existing.unwrap_or_default();
    (0..count)
        .map(|i| {
            existing
                .get(i)
                .cloned()
                .unwrap_or_else(|| PALETTE[i % PALETTE.len()].to_string())
        })
        .collect()
}
