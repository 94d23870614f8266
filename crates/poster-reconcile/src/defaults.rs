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

//! Illustrative starter posters, one per chart kind.

use chrono::{Duration, NaiveDate, Utc};
use indexmap::IndexMap;
use poster_contracts::{
    BarConfig, ChartConfig, ChartKind, DualConfig, Orientation, PieConfig, PosterBase, SeriesType,
    DEFAULT_RIGHT_COLOR, DEFAULT_VALUE_AXIS_LABEL,
};

pub const DEFAULT_COLORS: [&str; 5] = ["#1C5C3D", "#D97706", "#2563EB", "#6B7280", "#10B981"];

const VENUES: [&str; 5] = ["Jupiter", "Raydium", "Orca", "Meteora", "Other"];
const DUAL_DAYS: i32 = 30;

fn base(title: &str, subtitle: &str, note: &str) -> PosterBase {
    PosterBase {
        title: title.to_string(),
        subtitle: Some(subtitle.to_string()),
        note_value: Some(note.to_string()),
        template_name: Some("main".to_string()),
        date_str: None,
        center_image: None,
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

pub fn default_pie() -> PieConfig {
    PieConfig {
        base: base(
            "DEX Volume Share — Last 30 Days",
            "Share of total volume by venue",
            "Illustrative split only.",
        ),
        labels: owned(&VENUES),
        values: vec![40.0, 25.0, 20.0, 10.0, 5.0],
        colors_hex: Some(owned(&DEFAULT_COLORS)),
    }
}

pub fn default_bar() -> BarConfig {
    BarConfig {
        base: base(
            "DEX Volume — Last 30 Days",
            "Total volume per venue (USD)",
            "Example data only.",
        ),
        labels: owned(&VENUES),
        values: vec![1.2e9, 8.5e8, 6.5e8, 2.5e8, 1.0e8],
        colors_hex: Some(owned(&DEFAULT_COLORS)),
        orientation: Orientation::Horizontal,
        value_axis_label: DEFAULT_VALUE_AXIS_LABEL.to_string(),
        label_images: Some(vec![None; VENUES.len()]),
    }
}

/// Thirty days of synthetic data ending on `today`.
pub fn default_dual_on(today: NaiveDate) -> DualConfig {
    let x_values = (0..DUAL_DAYS)
        .rev()
        .map(|back| (today - Duration::days(i64::from(back))).format("%Y-%m-%d").to_string())
        .collect();
    let steps = || (0..DUAL_DAYS).map(f64::from);

    let mut y_series = IndexMap::new();
    y_series.insert("DEX A swappers".to_string(), steps().map(|i| 100.0 + i * 5.0).collect());
    y_series.insert("DEX B swappers".to_string(), steps().map(|i| 80.0 + i * 4.0).collect());

    DualConfig {
        base: base(
            "Swappers & Token Price — Last 30 Days",
            "Left: daily unique swappers • Right: token price (USD)",
            "Synthetic data.",
        ),
        x_values,
        y_series,
        colors_hex: Some(owned(&DEFAULT_COLORS[..2])),
        ylabel_left: "Wallets (unique / day)".to_string(),
        log_left: false,
        include_zero_left: true,
        left_series_type: SeriesType::Line,
        right_series: Some(steps().map(|i| 2.0 + i * 0.02).collect()),
        right_color_hex: DEFAULT_RIGHT_COLOR.to_string(),
        ylabel_right: Some("Price (USD)".to_string()),
        right_series_type: SeriesType::Line,
        log_right: false,
        include_zero_right: false,
        ..DualConfig::default()
    }
}

pub fn default_dual() -> DualConfig {
    default_dual_on(Utc::now().date_naive())
}

pub fn default_config(kind: ChartKind) -> ChartConfig {
    match kind {
        ChartKind::Pie => ChartConfig::Pie(default_pie()),
        ChartKind::Bar => ChartConfig::Bar(default_bar()),
        ChartKind::Dual => ChartConfig::Dual(default_dual()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_satisfy_length_invariants() {
        for kind in [ChartKind::Pie, ChartKind::Bar, ChartKind::Dual] {
            let config = default_config(kind);
            assert_eq!(config.kind(), kind);
            assert!(config.violations().is_empty(), "{kind}: {:?}", config.violations());
        }
    }

    #[test]
    fn dual_window_ends_on_the_given_day() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let dual = default_dual_on(today);
        assert_eq!(dual.x_values.len(), 30);
        assert_eq!(dual.x_values.first().map(String::as_str), Some("2024-01-31"));
        assert_eq!(dual.x_values.last().map(String::as_str), Some("2024-03-01"));
        assert_eq!(dual.y_series["DEX A swappers"][29], 245.0);
        assert!(!dual.include_zero_right);
    }

    #[test]
    fn bar_default_reserves_one_image_slot_per_label() {
        let bar = default_bar();
        assert_eq!(bar.label_images.as_ref().map(Vec::len), Some(bar.labels.len()));
    }
}
