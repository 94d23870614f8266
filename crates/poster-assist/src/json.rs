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

use poster_contracts::{LLMError, LLMResult};
use serde_json::Value;
use tracing::{debug, warn};

/// Pulls the proposal object out of a completion.
///
/// Tries the whole text, then fenced code blocks, then the first balanced
/// `{...}` span. Anything that is not a JSON object is rejected.
pub fn extract_json_object(text: &str) -> LLMResult<Value> {
    let trimmed = text.trim();
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(trimmed) {
        return Ok(value);
    }

    for block in fenced_blocks(trimmed) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(block) {
            debug!("Extracted proposal from a fenced block");
            return Ok(value);
        }
    }

    if let Some(span) = balanced_object(trimmed) {
        if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(span) {
            debug!("Extracted proposal from surrounding text");
            return Ok(value);
        }
        warn!(len = span.len(), "Found an object-like span that failed to parse");
    }

    Err(LLMError::Serialisation(
        "Completion did not contain a JSON object".to_string(),
    ))
}

/// Bodies of markdown code fences, language tag stripped.
fn fenced_blocks(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("```") {
        let after = &rest[open + 3..];
        let body_start = after.find('\n').map_or(0, |i| i + 1);
        let Some(close) = after[body_start..].find("```") else {
            break;
        };
        out.push(after[body_start..body_start + close].trim());
        rest = &after[body_start + close + 3..];
    }
    out
}

/// First `{...}` span with balanced braces, ignoring braces inside strings.
fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
