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

//! Row Stream Decoder: gzip JSON-lines bytes in, parsed records out.
//!
//! Decompression and line splitting happen per chunk as bytes arrive, so
//! memory stays bounded by the chunk size plus one partial line.

use crate::error::{QueryError, QueryResult};
use crate::storage::ByteStream;
use flate2::write::MultiGzDecoder;
use futures::StreamExt;
use serde_json::Value;
use std::collections::VecDeque;
use std::io::Write;
use tracing::{debug, warn};

/// One decoded row. Column order is preserved as written.
pub type Record = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Unparsable lines are dropped.
    #[default]
    Lenient,
    /// The first unparsable non-blank line fails the read.
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeStats {
    pub parsed: u64,
    pub skipped: u64,
}

/// Push-based gunzip plus line splitter.
pub struct LineDecoder {
    gz: Option<MultiGzDecoder<Vec<u8>>>,
    partial: Vec<u8>,
}

impl Default for LineDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl LineDecoder {
    pub fn new() -> Self {
        Self {
            gz: Some(MultiGzDecoder::new(Vec::new())),
            partial: Vec::new(),
        }
    }

    /// Feeds compressed bytes, returning every line completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        let Some(gz) = self.gz.as_mut() else {
            return Vec::new();
        };
        if let Err(e) = gz.write_all(chunk).and_then(|()| gz.flush()) {
            // A corrupt tail reads the same as the end of the stream.
            warn!(error = %e, "Decompression failed, ending stream early");
            self.salvage();
            return self.split_lines();
        }
        let inflated = std::mem::take(gz.get_mut());
        self.partial.extend_from_slice(&inflated);
        self.split_lines()
    }

    /// Flushes the decompressor and returns the remaining lines, including
    /// a final line without a trailing newline.
    pub fn finish(&mut self) -> Vec<String> {
        if let Some(gz) = self.gz.take() {
            match gz.finish() {
                Ok(rest) => self.partial.extend_from_slice(&rest),
                Err(e) => warn!(error = %e, "Compressed stream ended uncleanly"),
            }
        }
        let mut lines = self.split_lines();
        if !self.partial.is_empty() {
            let tail = std::mem::take(&mut self.partial);
            lines.push(to_line(&tail));
        }
        lines
    }

    fn salvage(&mut self) {
        if let Some(mut gz) = self.gz.take() {
            let inflated = std::mem::take(gz.get_mut());
            self.partial.extend_from_slice(&inflated);
        }
    }

    fn split_lines(&mut self) -> Vec<String> {
        let Some(last_newline) = self.partial.iter().rposition(|b| *b == b'\n') else {
            return Vec::new();
        };
        let rest = self.partial.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.partial, rest);
        complete[..last_newline]
            .split(|b| *b == b'\n')
            .map(to_line)
            .collect()
    }
}

fn to_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn parse_record(line: &str) -> Option<Record> {
    match serde_json::from_str::<Value>(line) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Lazy, finite, non-restartable sequence of records from one object.
pub struct RowStream {
    key: String,
    source: ByteStream,
    decoder: LineDecoder,
    ready: VecDeque<String>,
    mode: DecodeMode,
    stats: DecodeStats,
    line_no: u64,
    done: bool,
}

impl RowStream {
    pub fn new(key: impl Into<String>, source: ByteStream, mode: DecodeMode) -> Self {
        Self {
            key: key.into(),
            source,
            decoder: LineDecoder::new(),
            ready: VecDeque::new(),
            mode,
            stats: DecodeStats::default(),
            line_no: 0,
            done: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub const fn stats(&self) -> DecodeStats {
        self.stats
    }

    /// Next parsed record, or `None` once the object is exhausted.
    ///
    /// The only suspension point is the chunk read from the source.
    pub async fn next_record(&mut self) -> QueryResult<Option<Record>> {
        loop {
            if let Some(line) = self.ready.pop_front() {
                self.line_no += 1;
                if line.trim().is_empty() {
                    continue;
                }
                if let Some(record) = parse_record(&line) {
                    self.stats.parsed += 1;
                    return Ok(Some(record));
                }
                if self.mode == DecodeMode::Strict {
                    return Err(QueryError::MalformedLine {
                        key: self.key.clone(),
                        line: self.line_no,
                    });
                }
                self.stats.skipped += 1;
                continue;
            }

            if self.done {
                debug!(
                    key = %self.key,
                    parsed = self.stats.parsed,
                    skipped = self.stats.skipped,
                    "Row stream exhausted"
                );
                return Ok(None);
            }

            match self.source.next().await {
                Some(Ok(chunk)) => self.ready.extend(self.decoder.push(&chunk)),
                Some(Err(e)) => return Err(QueryError::unavailable(self.key.clone(), e)),
                None => {
                    self.ready.extend(self.decoder.finish());
                    self.done = true;
                }
            }
        }
    }
}
