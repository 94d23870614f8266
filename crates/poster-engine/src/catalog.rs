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

//! Catalog discovery on top of an [`ObjectStore`]: databases, tables and
//! the columns inferred from a sample of each table's rows.

use crate::decoder::{DecodeMode, RowStream};
use crate::error::QueryResult;
use crate::storage::ObjectStore;
use poster_contracts::bindings::object_key;
use poster_contracts::{CatalogListing, CatalogSchema, CatalogTable};
use std::collections::BTreeSet;
use tracing::{debug, warn};

pub const COLUMN_SAMPLE_ROWS: usize = 50;

/// Sorted union of the column names seen in the first sampled records.
pub async fn infer_columns(store: &dyn ObjectStore, db: &str, table: &str) -> QueryResult<Vec<String>> {
    let key = object_key(db, table);
    let source = store.get_object(&key).await?;
    let mut rows = RowStream::new(&key, source, DecodeMode::Lenient);

    let mut columns = BTreeSet::new();
    let mut sampled = 0;
    while sampled < COLUMN_SAMPLE_ROWS {
        let Some(record) = rows.next_record().await? else {
            break;
        };
        columns.extend(record.keys().cloned());
        sampled += 1;
    }
    debug!(db, table, sampled, columns = columns.len(), "Inferred table columns");
    Ok(columns.into_iter().collect())
}

/// Answers a catalog lookup at the depth of the given arguments: databases,
/// the tables of `db`, or the columns of `db`/`table`.
pub async fn list(
    store: &dyn ObjectStore,
    db: Option<&str>,
    table: Option<&str>,
) -> QueryResult<CatalogListing> {
    match (db, table) {
        (Some(db), Some(table)) => Ok(CatalogListing::Columns {
            db: db.to_string(),
            table: table.to_string(),
            columns: infer_columns(store, db, table).await?,
        }),
        (Some(db), None) => Ok(CatalogListing::Tables {
            db: db.to_string(),
            tables: store.list_tables(db).await?,
        }),
        (None, _) => Ok(CatalogListing::Databases {
            dbs: store.list_databases().await?,
        }),
    }
}

/// Full `[{db, tables: [{table, columns}]}]` snapshot for the assistant.
///
/// Tables whose columns cannot be read are listed with no columns.
pub async fn snapshot(store: &dyn ObjectStore) -> QueryResult<Vec<CatalogSchema>> {
    let mut out = Vec::new();
    for db in store.list_databases().await? {
        let mut tables = Vec::new();
        for table in store.list_tables(&db).await? {
            let columns = match infer_columns(store, &db, &table).await {
                Ok(columns) => columns,
                Err(e) => {
                    warn!(db = %db, table = %table, error = %e, "Skipping column inference");
                    Vec::new()
                }
            };
            tables.push(CatalogTable { table, columns });
        }
        out.push(CatalogSchema { db, tables });
    }
    Ok(out)
}
