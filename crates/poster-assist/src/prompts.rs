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

use poster_contracts::AiConfigRequest;
use serde_json::json;

pub const SYSTEM_PROMPT: &str = r##"You edit chart posters. Each turn you receive the current poster type, its full config, the current data binding (or null), a catalog of databases, tables and columns, and the conversation so far. Reply with the complete next config and binding that fulfil the latest user request.

Poster types:
- "pie": share of a whole. Config fields: title, subtitle, note_value, labels[], values[], colors_hex[].
- "bar": ranked values. Adds orientation ("horizontal" | "vertical") and value_axis_label.
- "dual": time series. Fields: x_values[], y_series {name: number[]}, colors_hex[] (one per left series), ylabel_left, left_series_type, log_left, include_zero_left, right_series[] (optional), right_color_hex, ylabel_right, right_series_type, log_right, include_zero_right, highlight_regions, highlight_points, timeRange ("7d" | "30d" | "90d" | "180d" | "1y" | "all"), timeBucket ("none" | "7d" | "30d" | "90d" | "180d" | "1y"). Series types are "line", "area" or "bar".

Bindings:
- pie/bar: {"kind": "pie" | "bar", "db", "table", "label_column", "value_column"}.
- dual: {"kind": "dual", "left": Axis | null, "right": Axis | null} where Axis is {"db", "table", "x_column", "series": [{"key", "value_column"}], "grouped", "group_column", "missing_mode": "zero" | "forward_fill"}. The right axis takes exactly one series and is never grouped. Grouping on the left turns each value of group_column into its own series.

Rules:
- Only use db, table and column names that appear in the catalog.
- Keep labels and values the same length; keep x_values, every y_series array and right_series the same length.
- Never change center_image or label_images.
- When unsure use right_color_hex "#2563EB", right_series_type "line", timeRange "all", timeBucket "none", missing_mode "zero".
- Titles, subtitles, notes and axis labels must describe the data actually bound, including units and timeframe.

Answer with one JSON object and nothing else:
{"assistant_message": string, "posterType": "pie" | "bar" | "dual", "config": object, "binding": object | null}"##;

/// User turn carrying the whole editing state as pretty-printed JSON.
pub fn user_message(request: &AiConfigRequest) -> String {
    let state = json!({
        "posterType": request.poster_type,
        "config": request.config,
        "binding": request.binding,
        "catalog": request.catalog,
        "messages": request.messages,
    });
    let body = serde_json::to_string_pretty(&state).unwrap_or_else(|_| state.to_string());
    format!("Here is the current state and conversation:\n{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use poster_contracts::{ChartConfig, ChartKind, ChatMessage, ChatRole, PieConfig};

    #[test]
    fn user_message_embeds_state() {
        let request = AiConfigRequest {
            messages: vec![ChatMessage {
                role: ChatRole::User,
                content: "show swaps by pool".into(),
            }],
            poster_type: ChartKind::Pie,
            config: ChartConfig::Pie(PieConfig::default()),
            binding: None,
            catalog: Vec::new(),
        };
        let text = user_message(&request);
        assert!(text.starts_with("Here is the current state and conversation:\n{"));
        assert!(text.contains("show swaps by pool"));
        assert!(text.contains("\"posterType\": \"pie\""));
    }
}
