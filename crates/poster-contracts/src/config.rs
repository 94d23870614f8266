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

use crate::types::{AxisSide, ChartKind, Orientation, SeriesType, TimeBucket, TimeRange};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_RIGHT_COLOR: &str = "#2563EB";
pub const DEFAULT_VALUE_AXIS_LABEL: &str = "Volume (USD)";

fn default_template() -> Option<String> {
    Some("main".to_string())
}

fn default_right_color() -> String {
    DEFAULT_RIGHT_COLOR.to_string()
}

fn default_value_axis_label() -> String {
    DEFAULT_VALUE_AXIS_LABEL.to_string()
}

const fn yes() -> bool {
    true
}

/// Display metadata shared by every poster kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PosterBase {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub note_value: Option<String>,
    #[serde(default = "default_template")]
    pub template_name: Option<String>,
    #[serde(default)]
    pub date_str: Option<String>,
    /// Owned by the upload subsystem; never written by aggregation or AI.
    #[serde(default)]
    pub center_image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PieConfig {
    #[serde(flatten)]
    pub base: PosterBase,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub colors_hex: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarConfig {
    #[serde(flatten)]
    pub base: PosterBase,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default)]
    pub colors_hex: Option<Vec<String>>,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default = "default_value_axis_label")]
    pub value_axis_label: String,
    /// May hold fewer entries than labels; owned by the upload subsystem.
    #[serde(default)]
    pub label_images: Option<Vec<Option<String>>>,
}

/// An x position or series reference: either a label or a numeric index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisKey {
    Number(serde_json::Number),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRegion {
    pub start: AxisKey,
    pub end: AxisKey,
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightPoint {
    pub x: AxisKey,
    #[serde(default)]
    pub series: Option<AxisKey>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub axis: Option<AxisSide>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DualConfig {
    #[serde(flatten)]
    pub base: PosterBase,

    #[serde(default)]
    pub x_values: Vec<String>,
    #[serde(default)]
    pub y_series: IndexMap<String, Vec<f64>>,
    /// One colour per left-series name, in `y_series` order.
    #[serde(default)]
    pub colors_hex: Option<Vec<String>>,

    #[serde(default)]
    pub ylabel_left: String,
    #[serde(default)]
    pub log_left: bool,
    #[serde(default = "yes")]
    pub include_zero_left: bool,
    #[serde(default)]
    pub left_series_type: SeriesType,

    #[serde(default)]
    pub right_series: Option<Vec<f64>>,
    #[serde(default = "default_right_color")]
    pub right_color_hex: String,
    #[serde(default)]
    pub ylabel_right: Option<String>,
    #[serde(default)]
    pub right_series_type: SeriesType,
    #[serde(default)]
    pub log_right: bool,
    #[serde(default = "yes")]
    pub include_zero_right: bool,

    #[serde(default)]
    pub highlight_regions: Option<Vec<HighlightRegion>>,
    #[serde(default)]
    pub highlight_points: Option<Vec<HighlightPoint>>,

    #[serde(rename = "timeRange", default)]
    pub time_range: TimeRange,
    #[serde(rename = "timeBucket", default)]
    pub time_bucket: TimeBucket,
}

impl Default for DualConfig {
    fn default() -> Self {
        Self {
            base: PosterBase::default(),
            x_values: Vec::new(),
            y_series: IndexMap::new(),
            colors_hex: None,
            ylabel_left: String::new(),
            log_left: false,
            include_zero_left: true,
            left_series_type: SeriesType::Line,
            right_series: None,
            right_color_hex: default_right_color(),
            ylabel_right: None,
            right_series_type: SeriesType::Line,
            log_right: false,
            include_zero_right: true,
            highlight_regions: None,
            highlight_points: None,
            time_range: TimeRange::All,
            time_bucket: TimeBucket::None,
        }
    }
}

/// A poster configuration, discriminated by `poster_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "poster_type", rename_all = "snake_case")]
pub enum ChartConfig {
    Pie(PieConfig),
    Bar(BarConfig),
    Dual(DualConfig),
}

impl ChartConfig {
    pub const fn kind(&self) -> ChartKind {
        match self {
            Self::Pie(_) => ChartKind::Pie,
            Self::Bar(_) => ChartKind::Bar,
            Self::Dual(_) => ChartKind::Dual,
        }
    }

    pub const fn base(&self) -> &PosterBase {
        match self {
            Self::Pie(c) => &c.base,
            Self::Bar(c) => &c.base,
            Self::Dual(c) => &c.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut PosterBase {
        match self {
            Self::Pie(c) => &mut c.base,
            Self::Bar(c) => &mut c.base,
            Self::Dual(c) => &mut c.base,
        }
    }

    pub fn label_images(&self) -> Option<&Vec<Option<String>>> {
        match self {
            Self::Bar(c) => c.label_images.as_ref(),
            _ => None,
        }
    }

    /// Lists every array-length invariant the config currently breaks.
    ///
    /// An empty result means the config is safe to hand to the renderer.
    pub fn violations(&self) -> Vec<String> {
        match self {
            Self::Pie(c) => label_violations(&c.labels, &c.values, c.colors_hex.as_deref()),
            Self::Bar(c) => label_violations(&c.labels, &c.values, c.colors_hex.as_deref()),
            Self::Dual(c) => c.violations(),
        }
    }
}

impl DualConfig {
    fn violations(&self) -> Vec<String> {
        let expected = self.x_values.len();
        let mut out = Vec::new();
        for (name, series) in &self.y_series {
            if series.len() != expected {
                out.push(format!(
                    "y_series['{name}'] has {} points, x_values has {expected}",
                    series.len()
                ));
            }
        }
        if let Some(right) = &self.right_series {
            if right.len() != expected {
                out.push(format!(
                    "right_series has {} points, x_values has {expected}",
                    right.len()
                ));
            }
        }
        if let Some(colors) = &self.colors_hex {
            if colors.len() != self.y_series.len() {
                out.push(format!(
                    "colors_hex has {} entries for {} left series",
                    colors.len(),
                    self.y_series.len()
                ));
            }
        }
        out
    }
}

fn label_violations(labels: &[String], values: &[f64], colors: Option<&[String]>) -> Vec<String> {
    let mut out = Vec::new();
    if values.len() != labels.len() {
        out.push(format!(
            "values has {} entries, labels has {}",
            values.len(),
            labels.len()
        ));
    }
    if let Some(colors) = colors {
        if colors.len() != labels.len() {
            out.push(format!(
                "colors_hex has {} entries, labels has {}",
                colors.len(),
                labels.len()
            ));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dual_config_reads_camel_case_window_fields() {
        let config: ChartConfig = serde_json::from_value(json!({
            "poster_type": "dual",
            "title": "Swaps",
            "x_values": ["2024-01-01"],
            "y_series": {"A": [1.0]},
            "timeRange": "30d",
        }))
        .unwrap();
        let ChartConfig::Dual(dual) = config else {
            panic!("expected dual config");
        };
        assert_eq!(dual.time_range, TimeRange::Month);
        assert_eq!(dual.time_bucket, TimeBucket::None);
        assert_eq!(dual.right_color_hex, DEFAULT_RIGHT_COLOR);
        assert_eq!(dual.base.template_name.as_deref(), Some("main"));
    }

    #[test]
    fn bar_config_serialises_with_tag_and_flattened_base() {
        let config = ChartConfig::Bar(BarConfig {
            base: PosterBase {
                title: "Volume".into(),
                ..PosterBase::default()
            },
            labels: vec!["a".into()],
            values: vec![1.0],
            colors_hex: None,
            orientation: Orientation::Vertical,
            value_axis_label: "USD".into(),
            label_images: Some(vec![None]),
        });
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["poster_type"], "bar");
        assert_eq!(value["title"], "Volume");
        assert_eq!(value["orientation"], "vertical");
    }

    #[test]
    fn violations_report_mismatched_lengths() {
        let mut dual = DualConfig {
            x_values: vec!["1".into(), "2".into()],
            ..DualConfig::default()
        };
        dual.y_series.insert("A".into(), vec![1.0, 2.0]);
        dual.y_series.insert("B".into(), vec![1.0]);
        dual.right_series = Some(vec![3.0, 4.0]);
        dual.colors_hex = Some(vec!["#000000".into()]);
        let problems = ChartConfig::Dual(dual).violations();
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("'B'"));
        assert!(problems[1].contains("colors_hex"));

        let pie = ChartConfig::Pie(PieConfig {
            labels: vec!["x".into(), "y".into()],
            values: vec![4.0, 1.0],
            ..PieConfig::default()
        });
        assert!(pie.violations().is_empty());
    }

    #[test]
    fn highlight_keys_accept_numbers_and_labels() {
        let point: HighlightPoint =
            serde_json::from_value(json!({"x": "2024-01-02", "series": 0, "axis": "right"}))
                .unwrap();
        assert_eq!(point.x, AxisKey::Text("2024-01-02".into()));
        assert!(matches!(point.series, Some(AxisKey::Number(_))));
        assert_eq!(point.axis, Some(AxisSide::Right));
    }
}
