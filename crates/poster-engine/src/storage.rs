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

//! Object-storage collaborators. Each table lives in one object,
//! `{db}/{table}.jsonl.gz`; a database is the prefix before the slash.

use crate::error::{QueryError, QueryResult};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt, TryStreamExt};
use std::path::{Component, Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::debug;

/// Raw (still compressed) bytes of one object, in arrival order.
pub type ByteStream = BoxStream<'static, std::io::Result<Vec<u8>>>;

pub const TABLE_SUFFIX: &str = ".jsonl.gz";

const READ_CHUNK_BYTES: usize = 64 * 1024;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Opens an object for streaming. A missing object or a failed
    /// transport is `SourceUnavailable`.
    async fn get_object(&self, key: &str) -> QueryResult<ByteStream>;

    async fn list_databases(&self) -> QueryResult<Vec<String>>;

    async fn list_tables(&self, db: &str) -> QueryResult<Vec<String>>;

    fn backend(&self) -> &'static str;
}

/// Serves objects from a directory tree: `root/{db}/{table}.jsonl.gz`.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> QueryResult<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(QueryError::unavailable(key, "invalid object key"));
        }
        Ok(self.root.join(relative))
    }

    async fn child_names(&self, dir: &Path) -> QueryResult<Vec<(String, bool)>> {
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| QueryError::unavailable(dir.display().to_string(), e))?;
        let mut out = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| QueryError::unavailable(dir.display().to_string(), e))?
        {
            let is_dir = entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false);
            if let Some(name) = entry.file_name().to_str() {
                out.push((name.to_string(), is_dir));
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    async fn get_object(&self, key: &str) -> QueryResult<ByteStream> {
        let path = self.resolve(key)?;
        let file = tokio::fs::File::open(&path)
            .await
            .map_err(|e| QueryError::unavailable(key, e))?;
        debug!(key, path = %path.display(), "Opened local object");

        let chunks = stream::try_unfold(file, |mut file| async move {
            let mut buf = vec![0u8; READ_CHUNK_BYTES];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                return Ok::<_, std::io::Error>(None);
            }
            buf.truncate(read);
            Ok(Some((buf, file)))
        });
        Ok(chunks.boxed())
    }

    async fn list_databases(&self) -> QueryResult<Vec<String>> {
        let mut dbs: Vec<String> = self
            .child_names(&self.root)
            .await?
            .into_iter()
            .filter_map(|(name, is_dir)| is_dir.then_some(name))
            .collect();
        dbs.sort();
        Ok(dbs)
    }

    async fn list_tables(&self, db: &str) -> QueryResult<Vec<String>> {
        let dir = self.resolve(db)?;
        let mut tables: Vec<String> = self
            .child_names(&dir)
            .await?
            .into_iter()
            .filter_map(|(name, is_dir)| {
                if is_dir {
                    return None;
                }
                name.strip_suffix(TABLE_SUFFIX).map(str::to_string)
            })
            .filter(|t| !t.is_empty())
            .collect();
        tables.sort();
        Ok(tables)
    }

    fn backend(&self) -> &'static str {
        "local"
    }
}

/// Reads objects with plain GETs against `{base_url}/{key}`, e.g. a public
/// bucket endpoint. Listing needs a provider-specific API and is not offered.
#[derive(Debug, Clone)]
pub struct HttpStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key.trim_start_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for HttpStore {
    async fn get_object(&self, key: &str) -> QueryResult<ByteStream> {
        let url = self.url_for(key);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| QueryError::unavailable(key, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(QueryError::unavailable(key, format!("HTTP {status}")));
        }
        debug!(key, url = %url, "Opened remote object");

        Ok(response
            .bytes_stream()
            .map_ok(|bytes| bytes.to_vec())
            .map_err(std::io::Error::other)
            .boxed())
    }

    async fn list_databases(&self) -> QueryResult<Vec<String>> {
        Err(QueryError::ListingUnsupported {
            backend: self.backend(),
        })
    }

    async fn list_tables(&self, _db: &str) -> QueryResult<Vec<String>> {
        Err(QueryError::ListingUnsupported {
            backend: self.backend(),
        })
    }

    fn backend(&self) -> &'static str {
        "http"
    }
}
