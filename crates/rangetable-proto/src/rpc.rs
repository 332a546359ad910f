//! The region-server and master operations the client consumes.
//!
//! These traits are the opaque remote boundary: the client never sees wire
//! framing, only these semantic signatures. Handles are shared as
//! `Arc<dyn …>` so one connection can back many concurrent callers.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::RpcResult;
use crate::schema::{ColumnFamily, RegionDescriptor, TableDescriptor};
use crate::types::{ColumnName, LockId, RegionName, RowKey, ScannerId, ServerAddress, TableName};

/// One row produced by a server-side scanner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanRow {
    /// The row key.
    pub row: RowKey,
    /// The selected cells, as `(column, value)` pairs.
    pub cells: Vec<(ColumnName, Vec<u8>)>,
}

impl ScanRow {
    /// Looks up a cell by exact column name.
    pub fn cell(&self, column: &str) -> Option<&[u8]> {
        self.cells
            .iter()
            .find(|(name, _)| name.as_str() == column)
            .map(|(_, value)| value.as_slice())
    }
}

/// Operations served by a region server for the regions it hosts.
#[async_trait]
pub trait RegionServer: Send + Sync {
    /// Returns the named region's descriptor, or `NotServingRegion`.
    async fn region_info(&self, region: &RegionName) -> RpcResult<RegionDescriptor>;

    /// Reads the latest version of one cell.
    async fn get(
        &self,
        region: &RegionName,
        row: &RowKey,
        column: &ColumnName,
    ) -> RpcResult<Option<Vec<u8>>>;

    /// Reads up to `versions` newest versions of one cell, newest first.
    async fn get_versions(
        &self,
        region: &RegionName,
        row: &RowKey,
        column: &ColumnName,
        versions: u32,
    ) -> RpcResult<Vec<Vec<u8>>>;

    /// Reads up to `versions` versions of one cell at or before `timestamp`.
    async fn get_versions_before(
        &self,
        region: &RegionName,
        row: &RowKey,
        column: &ColumnName,
        timestamp: u64,
        versions: u32,
    ) -> RpcResult<Vec<Vec<u8>>>;

    /// Reads every cell of one row.
    async fn row(&self, region: &RegionName, row: &RowKey)
        -> RpcResult<Vec<(ColumnName, Vec<u8>)>>;

    /// Opens a scanner over `region` for the selected columns, positioned at
    /// the first row at or after `start_row`.
    async fn open_scanner(
        &self,
        region: &RegionName,
        columns: &[ColumnName],
        start_row: &RowKey,
    ) -> RpcResult<ScannerId>;

    /// Returns the scanner's next row, or `None` once exhausted.
    async fn next(&self, scanner: ScannerId) -> RpcResult<Option<ScanRow>>;

    /// Releases a scanner.
    async fn close_scanner(&self, scanner: ScannerId) -> RpcResult<()>;

    /// Opens a server-side lock on one row for an atomic update.
    async fn start_update(
        &self,
        region: &RegionName,
        client_id: u64,
        row: &RowKey,
    ) -> RpcResult<LockId>;

    /// Stages a cell write under an open lock.
    async fn put(
        &self,
        region: &RegionName,
        client_id: u64,
        lock: LockId,
        column: &ColumnName,
        value: Vec<u8>,
    ) -> RpcResult<()>;

    /// Stages a cell delete under an open lock.
    async fn delete(
        &self,
        region: &RegionName,
        client_id: u64,
        lock: LockId,
        column: &ColumnName,
    ) -> RpcResult<()>;

    /// Discards all staged changes and releases the lock.
    async fn abort_update(
        &self,
        region: &RegionName,
        client_id: u64,
        lock: LockId,
    ) -> RpcResult<()>;

    /// Atomically applies all staged changes and releases the lock.
    async fn commit_update(
        &self,
        region: &RegionName,
        client_id: u64,
        lock: LockId,
    ) -> RpcResult<()>;
}

/// Operations served by the cluster master.
#[async_trait]
pub trait Master: Send + Sync {
    /// Cheap liveness probe.
    async fn is_running(&self) -> RpcResult<bool>;

    /// Where the root catalog region currently lives, if the master knows
    /// yet.
    async fn find_root_region(&self) -> RpcResult<Option<ServerAddress>>;

    /// Creates a table.
    async fn create_table(&self, table: &TableDescriptor) -> RpcResult<()>;

    /// Deletes a table.
    async fn delete_table(&self, table: &TableName) -> RpcResult<()>;

    /// Adds a column family to a table.
    async fn add_column(&self, table: &TableName, family: &ColumnFamily) -> RpcResult<()>;

    /// Removes a column family from a table.
    async fn delete_column(&self, table: &TableName, family: &str) -> RpcResult<()>;

    /// Brings a disabled table back online.
    async fn enable_table(&self, table: &TableName) -> RpcResult<()>;

    /// Takes a table offline.
    async fn disable_table(&self, table: &TableName) -> RpcResult<()>;

    /// Shuts the cluster down.
    async fn shutdown(&self) -> RpcResult<()>;
}

impl std::fmt::Debug for dyn Master {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("dyn Master").finish()
    }
}

/// Factory for RPC handles, implemented by the transport layer.
///
/// Implementations retry transient connect failures internally and return
/// [`crate::RpcError::Unreachable`] only once the address is declared
/// permanently dead.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Connects to a region server.
    async fn region_server(&self, addr: &ServerAddress) -> RpcResult<Arc<dyn RegionServer>>;

    /// Connects to the master.
    async fn master(&self, addr: &ServerAddress) -> RpcResult<Arc<dyn Master>>;
}
