//! Request dispatch: the shared invalidate-and-retry combinator and the
//! per-row read operations built on it.
//!
//! Stale cached locations are the dominant recoverable failure in a store
//! whose regions split, merge and move. Every per-row call funnels through
//! one combinator so the invalidate/re-resolve/retry loop and its exhaustion
//! behavior exist in exactly one place.

use std::future::Future;
use std::sync::Arc;

use rangetable_proto::{ColumnName, RegionServer, RowKey, RpcResult, TableName};
use tracing::debug;

use crate::client::Client;
use crate::directory::RegionLocation;
use crate::error::Result;

impl Client {
    /// Runs `op` against the server currently responsible for `(table, row)`.
    ///
    /// Each attempt resolves the row through the directory cache and the
    /// pool. An error classified as stale-location invalidates the table's
    /// directory, re-resolves it, sleeps the configured pause and retries,
    /// up to the retry bound; the final failure is re-raised. Every other
    /// error propagates immediately.
    pub(crate) async fn call_region<T, F, Fut>(
        &self,
        table: &TableName,
        row: &RowKey,
        mut op: F,
    ) -> Result<T>
    where
        F: FnMut(Arc<dyn RegionServer>, RegionLocation) -> Fut,
        Fut: Future<Output = RpcResult<T>>,
    {
        let attempts = self.config.attempts();
        let mut tries = 0;
        loop {
            let location = self.directory.locate(table, row)?;
            let server = self.pool.region_server(&location.server).await?;
            match op(server, location.clone()).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_stale_location() => {
                    tries += 1;
                    if tries == attempts {
                        return Err(err.into());
                    }
                    debug!(
                        %table,
                        %row,
                        region = %location.region.name,
                        error = %err,
                        tries,
                        "stale region location, reloading directory"
                    );
                    self.relocate(&location).await?;
                    tokio::time::sleep(self.config.pause).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Reads the latest version of one cell.
    pub async fn get(
        &self,
        table: &TableName,
        row: &RowKey,
        column: &ColumnName,
    ) -> Result<Option<Vec<u8>>> {
        Self::ensure_table(table)?;
        Self::ensure_row(row)?;
        self.call_region(table, row, |server, location| async move {
            server.get(&location.region.name, row, column).await
        })
        .await
    }

    /// Reads up to `versions` newest versions of one cell, newest first.
    pub async fn get_versions(
        &self,
        table: &TableName,
        row: &RowKey,
        column: &ColumnName,
        versions: u32,
    ) -> Result<Vec<Vec<u8>>> {
        Self::ensure_table(table)?;
        Self::ensure_row(row)?;
        self.call_region(table, row, |server, location| async move {
            server
                .get_versions(&location.region.name, row, column, versions)
                .await
        })
        .await
    }

    /// Reads up to `versions` versions of one cell at or before `timestamp`.
    pub async fn get_versions_before(
        &self,
        table: &TableName,
        row: &RowKey,
        column: &ColumnName,
        timestamp: u64,
        versions: u32,
    ) -> Result<Vec<Vec<u8>>> {
        Self::ensure_table(table)?;
        Self::ensure_row(row)?;
        self.call_region(table, row, |server, location| async move {
            server
                .get_versions_before(&location.region.name, row, column, timestamp, versions)
                .await
        })
        .await
    }

    /// Reads every cell of one row.
    pub async fn row(
        &self,
        table: &TableName,
        row: &RowKey,
    ) -> Result<Vec<(ColumnName, Vec<u8>)>> {
        Self::ensure_table(table)?;
        Self::ensure_row(row)?;
        self.call_region(table, row, |server, location| async move {
            server.row(&location.region.name, row).await
        })
        .await
    }
}
