//! Multi-region streaming scans.
//!
//! A table scan stitches one server-side scanner per region into a single
//! ordered iterator. The set of regions is snapshotted when the scan starts;
//! region movement is absorbed by the same invalidate-and-reload treatment
//! the dispatcher applies, with the snapshot recomputed before retrying.

use std::sync::Arc;

use rangetable_proto::{ColumnName, RegionServer, RowKey, ScanRow, ScannerId, TableName};
use tracing::{debug, warn};

use crate::client::Client;
use crate::directory::RegionLocation;
use crate::error::{ClientError, Result};

impl Client {
    /// Starts a scan over every region of `table` whose range intersects
    /// `[start_row, +inf)`, yielding rows in key order.
    ///
    /// An empty `start_row` scans the whole table. The table must have been
    /// opened first.
    pub async fn scan(
        &self,
        table: &TableName,
        columns: &[ColumnName],
        start_row: &RowKey,
    ) -> Result<TableScanner> {
        Self::ensure_table(table)?;
        let regions = self.directory.snapshot_from(table, start_row)?;
        let mut scanner = TableScanner {
            client: self.clone(),
            table: table.clone(),
            columns: columns.to_vec(),
            start_row: start_row.clone(),
            regions,
            current: None,
            server: None,
            scanner: None,
            opened_first: false,
            closed: false,
        };
        scanner.advance().await?;
        Ok(scanner)
    }
}

/// An ordered iterator over the rows of one table.
///
/// Call [`TableScanner::close`] when done; the drop handler can only warn,
/// not release the server-side scanner.
pub struct TableScanner {
    client: Client,
    table: TableName,
    columns: Vec<ColumnName>,
    start_row: RowKey,
    regions: Vec<RegionLocation>,
    current: Option<usize>,
    server: Option<Arc<dyn RegionServer>>,
    scanner: Option<ScannerId>,
    opened_first: bool,
    closed: bool,
}

impl std::fmt::Debug for TableScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableScanner")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("start_row", &self.start_row)
            .field("regions", &self.regions)
            .field("current", &self.current)
            .field("scanner", &self.scanner)
            .field("opened_first", &self.opened_first)
            .field("closed", &self.closed)
            .finish()
    }
}

impl TableScanner {
    /// Returns the next row, or `None` once every region is exhausted.
    pub async fn next(&mut self) -> Result<Option<ScanRow>> {
        if self.closed {
            return Ok(None);
        }
        loop {
            let (Some(server), Some(id)) = (self.server.clone(), self.scanner) else {
                self.closed = true;
                return Ok(None);
            };
            match server.next(id).await? {
                Some(row) => return Ok(Some(row)),
                None => {
                    // Current region drained; move on to the next one.
                    if !self.advance().await? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    /// Releases the open server-side scanner, if any, and ends the scan.
    ///
    /// Further `next` calls return `None`.
    pub async fn close(&mut self) {
        self.close_current().await;
        self.closed = true;
    }

    /// Closes the current region's scanner and opens one on the next region.
    ///
    /// Returns false once no region remains.
    async fn advance(&mut self) -> Result<bool> {
        self.close_current().await;
        let next = self.current.map_or(0, |index| index + 1);
        if next >= self.regions.len() {
            self.closed = true;
            return Ok(false);
        }
        self.current = Some(next);
        let hint = if self.opened_first {
            RowKey::empty()
        } else {
            self.start_row.clone()
        };
        self.open_current(hint).await?;
        Ok(true)
    }

    /// Opens a server-side scanner on the current region, reloading the
    /// directory and recomputing the region snapshot when the location turns
    /// out to be stale.
    async fn open_current(&mut self, mut hint: RowKey) -> Result<()> {
        let attempts = self.client.config.attempts();
        let mut tries = 0;
        loop {
            let index = self.current.unwrap_or(0);
            let location = self.regions[index].clone();
            let server = match self.client.pool.region_server(&location.server).await {
                Ok(server) => server,
                Err(err) => return Err(self.fail(err.into())),
            };
            match server
                .open_scanner(&location.region.name, &self.columns, &hint)
                .await
            {
                Ok(id) => {
                    self.server = Some(server);
                    self.scanner = Some(id);
                    self.opened_first = true;
                    return Ok(());
                }
                Err(err) if err.is_stale_location() => {
                    tries += 1;
                    if tries == attempts {
                        return Err(self.fail(err.into()));
                    }
                    debug!(
                        table = %self.table,
                        region = %location.region.name,
                        error = %err,
                        "scan hit a stale region, reloading and recomputing snapshot"
                    );
                    // Resume from the failed region's start key, or from the
                    // scan's start row if nothing was ever opened.
                    let resume = if self.opened_first {
                        location.region.start_key.clone()
                    } else {
                        self.start_row.clone()
                    };
                    if let Err(err) = self.client.relocate(&location).await {
                        return Err(self.fail(err));
                    }
                    match self.client.directory.snapshot_from(&self.table, &resume) {
                        Ok(regions) if !regions.is_empty() => self.regions = regions,
                        Ok(_) => {
                            return Err(self.fail(ClientError::RegionNotFound(format!(
                                "no region of {} covers {resume}",
                                self.table
                            ))));
                        }
                        Err(err) => return Err(self.fail(err)),
                    }
                    self.current = Some(0);
                    hint = resume;
                    tokio::time::sleep(self.client.config.pause).await;
                }
                Err(err) => return Err(self.fail(err.into())),
            }
        }
    }

    /// Marks the scan dead after a fatal error.
    fn fail(&mut self, err: ClientError) -> ClientError {
        self.closed = true;
        err
    }

    async fn close_current(&mut self) {
        if let (Some(server), Some(id)) = (self.server.take(), self.scanner.take()) {
            if let Err(err) = server.close_scanner(id).await {
                warn!(scanner = %id, error = %err, "failed to close region scanner");
            }
        }
    }
}

impl Drop for TableScanner {
    fn drop(&mut self) {
        if self.scanner.is_some() {
            warn!(
                table = %self.table,
                "table scanner dropped without close, leaking a server-side scanner"
            );
        }
    }
}
