//! The region directory: per-table ordered maps from region start key to the
//! region's current location.
//!
//! Lookup by row key is a floor search on start key. Entries go stale when
//! regions split, merge or move; staleness is detected reactively through RPC
//! error classification, and invalidation is deliberately coarse: any stale
//! entry wipes the whole table's directory, because splits and moves commonly
//! cascade through neighbor metadata.

use std::collections::BTreeMap;
use std::sync::Mutex;

use rangetable_proto::{RegionDescriptor, RowKey, ServerAddress, TableName};

use crate::error::{ClientError, Result};

/// Where one region currently lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegionLocation {
    /// The region.
    pub region: RegionDescriptor,
    /// The server currently assigned the region.
    pub server: ServerAddress,
}

/// One table's resolved directory, keyed by region start key.
pub type TableDirectory = BTreeMap<RowKey, RegionLocation>;

/// Cache of resolved directories for every opened table.
#[derive(Default)]
pub struct RegionDirectory {
    tables: Mutex<BTreeMap<TableName, TableDirectory>>,
}

impl RegionDirectory {
    /// Creates an empty directory cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the table has a cached directory.
    pub fn is_open(&self, table: &TableName) -> bool {
        self.tables.lock().unwrap().contains_key(table)
    }

    /// Returns the location of the single region covering `row`.
    ///
    /// Fails with `TableNotOpen` if the table was never resolved.
    pub fn locate(&self, table: &TableName, row: &RowKey) -> Result<RegionLocation> {
        let tables = self.tables.lock().unwrap();
        let directory = tables
            .get(table)
            .ok_or_else(|| ClientError::TableNotOpen(table.clone()))?;
        let (_, location) = directory.range(..=row).next_back().ok_or_else(|| {
            ClientError::RegionNotFound(format!("no region of {table} covers row {row}"))
        })?;
        Ok(location.clone())
    }

    /// Snapshots the ordered run of regions beginning at the region covering
    /// `start` and extending to the table's last region.
    pub fn snapshot_from(&self, table: &TableName, start: &RowKey) -> Result<Vec<RegionLocation>> {
        let tables = self.tables.lock().unwrap();
        let directory = tables
            .get(table)
            .ok_or_else(|| ClientError::TableNotOpen(table.clone()))?;
        let from = directory
            .range(..=start)
            .next_back()
            .map(|(key, _)| key.clone())
            .unwrap_or_else(RowKey::empty);
        Ok(directory.range(from..).map(|(_, loc)| loc.clone()).collect())
    }

    /// The location of the table's first region, if cached.
    pub fn first_location(&self, table: &TableName) -> Option<RegionLocation> {
        let tables = self.tables.lock().unwrap();
        tables
            .get(table)
            .and_then(|directory| directory.values().next().cloned())
    }

    /// Atomically replaces the table's directory.
    pub fn install(&self, table: TableName, directory: TableDirectory) {
        self.tables.lock().unwrap().insert(table, directory);
    }

    /// Drops the table's entire directory.
    pub fn invalidate(&self, table: &TableName) {
        self.tables.lock().unwrap().remove(table);
    }

    /// Drops the directory of the table the stale region belongs to, forcing
    /// a full reload on next access.
    pub fn invalidate_region(&self, stale: &RegionLocation) {
        self.invalidate(&stale.region.table.name);
    }
}
