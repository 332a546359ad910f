//! Catalog resolution: walking master, root and meta to build per-table
//! region directories.
//!
//! The catalog is a two-level index. The master knows where the root region
//! lives; the root region's rows describe the meta regions; the meta regions'
//! rows describe every user table's regions. Resolution walks down that chain
//! and installs the result into the region directory as a side effect.

use std::sync::Arc;
use std::time::Duration;

use rangetable_proto::catalog::{self, CATALOG_FAMILY, COL_REGION, COL_SERVER};
use rangetable_proto::{ColumnName, RegionServer, RpcError, RowKey, ScannerId, TableName};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::directory::{RegionDirectory, RegionLocation, TableDirectory};
use crate::error::{ClientError, Result};
use crate::master::MasterLocator;
use crate::pool::ServerPool;

/// Outcome of one pass over a catalog region.
enum CatalogScan {
    /// The table's full run of rows was collected.
    Complete,
    /// A row lacked a server assignment; the partial result was discarded.
    Unassigned,
}

/// Resolves table names to region directories, populating the cache.
pub struct CatalogResolver {
    pool: Arc<ServerPool>,
    master: Arc<MasterLocator>,
    directory: Arc<RegionDirectory>,
    attempts: usize,
    pause: Duration,
    // Serializes whole resolutions so concurrent callers cannot interleave
    // partial installs.
    gate: Mutex<()>,
}

impl CatalogResolver {
    /// Creates a resolver over the shared pool, master locator and directory.
    pub fn new(
        pool: Arc<ServerPool>,
        master: Arc<MasterLocator>,
        directory: Arc<RegionDirectory>,
        attempts: usize,
        pause: Duration,
    ) -> Self {
        Self {
            pool,
            master,
            directory,
            attempts,
            pause,
            gate: Mutex::new(()),
        }
    }

    /// Resolves `table` and installs its directory into the cache.
    pub async fn resolve(&self, table: &TableName) -> Result<TableDirectory> {
        let _gate = self.gate.lock().await;
        self.resolve_locked(table).await
    }

    /// The first meta region that would host rows of `table`, resolving meta
    /// if needed.
    pub(crate) async fn first_meta_region_for(&self, table: &TableName) -> Result<RegionLocation> {
        let _gate = self.gate.lock().await;
        self.meta_regions_for(table)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::RegionNotFound("meta table has no regions".into()))
    }

    /// Every meta region in start-key order, resolving meta if needed.
    pub(crate) async fn all_meta_regions(&self) -> Result<Vec<RegionLocation>> {
        let _gate = self.gate.lock().await;
        self.meta_regions_for(&TableName::new("")).await
    }

    async fn resolve_locked(&self, table: &TableName) -> Result<TableDirectory> {
        if *table == TableName::root() {
            return self.locate_root_region().await;
        }
        if *table == TableName::meta() {
            return self.load_meta_from_root().await;
        }

        let meta_regions = self.meta_regions_for(table).await?;
        let mut directory = TableDirectory::new();
        for (index, meta_region) in meta_regions.iter().enumerate() {
            match self.scan_catalog_region(meta_region, table).await {
                Ok(part) => directory.extend(part),
                // A later meta region holding no rows for the table just
                // means we scanned past the table's run.
                Err(ClientError::RegionNotFound(_)) if index > 0 => break,
                Err(err) => return Err(err),
            }
        }
        self.directory.install(table.clone(), directory.clone());
        debug!(%table, regions = directory.len(), "resolved table directory");
        Ok(directory)
    }

    /// Asks the master for the root region's server and validates the answer
    /// against the region itself.
    ///
    /// Two nested bounded loops: the inner one waits for the master to know a
    /// location at all, the outer one revalidates whatever address came back
    /// by asking that server to describe the root region. A stale answer
    /// restarts the outer loop after a pause.
    async fn locate_root_region(&self) -> Result<TableDirectory> {
        let master = self.master.ensure_master().await?;
        let root = catalog::root_region();
        let mut validated = None;

        'outer: for tries in 0..self.attempts {
            let mut address = None;
            let mut waits = 0;
            while address.is_none() && waits < self.attempts {
                address = master.find_root_region().await?;
                if address.is_none() {
                    debug!("master does not know the root region yet, sleeping");
                    tokio::time::sleep(self.pause).await;
                    waits += 1;
                }
            }
            let Some(addr) = address else {
                return Err(ClientError::NoServerForRegion(
                    "timed out waiting for the master to locate the root region".into(),
                ));
            };

            let server = self.pool.region_server(&addr).await?;
            match server.region_info(&root.name).await {
                Ok(_) => {
                    validated = Some(addr);
                    break 'outer;
                }
                Err(RpcError::NotServingRegion(_)) => {
                    if tries + 1 == self.attempts {
                        break 'outer;
                    }
                    debug!(%addr, "root region moved away, sleeping before relocating");
                    tokio::time::sleep(self.pause).await;
                }
                Err(err) => return Err(err.into()),
            }
        }

        let Some(addr) = validated else {
            return Err(ClientError::NoServerForRegion(
                "unable to validate a root region server".into(),
            ));
        };

        let mut directory = TableDirectory::new();
        directory.insert(
            RowKey::empty(),
            RegionLocation {
                region: root,
                server: addr,
            },
        );
        self.directory
            .install(TableName::root(), directory.clone());
        Ok(directory)
    }

    /// Scans the root region's rows to build the meta table's directory.
    async fn load_meta_from_root(&self) -> Result<TableDirectory> {
        let root = match self.directory.first_location(&TableName::root()) {
            Some(location) => location,
            None => {
                let root_directory = self.locate_root_region().await?;
                root_directory
                    .into_values()
                    .next()
                    .expect("root directory always holds its single region")
            }
        };
        let meta = self.scan_catalog_region(&root, &TableName::meta()).await?;
        self.directory.install(TableName::meta(), meta.clone());
        Ok(meta)
    }

    /// The run of meta regions that could hold rows of `table`: floor of the
    /// table name, then every later meta region.
    async fn meta_regions_for(&self, table: &TableName) -> Result<Vec<RegionLocation>> {
        let hint = table.as_row_key();
        if let Ok(regions) = self.directory.snapshot_from(&TableName::meta(), &hint) {
            return Ok(regions);
        }
        self.load_meta_from_root().await?;
        self.directory.snapshot_from(&TableName::meta(), &hint)
    }

    /// Scans one catalog region for the contiguous run of rows describing
    /// `table`'s regions.
    ///
    /// Rows for an unassigned region void the whole pass: the partial result
    /// is dropped and the scan retried after a pause, up to the retry budget.
    /// Zero matching rows mean the table does not exist in this catalog
    /// region.
    async fn scan_catalog_region(
        &self,
        catalog_region: &RegionLocation,
        table: &TableName,
    ) -> Result<TableDirectory> {
        let server = self.pool.region_server(&catalog_region.server).await?;
        let columns = [ColumnName::from(CATALOG_FAMILY)];
        let hint = table.as_row_key();

        for tries in 0..self.attempts {
            let mut regions = TableDirectory::new();
            let scanner = server
                .open_scanner(&catalog_region.region.name, &columns, &hint)
                .await?;
            let outcome = self
                .collect_catalog_rows(server.as_ref(), scanner, table, &mut regions)
                .await;
            if let Err(err) = server.close_scanner(scanner).await {
                warn!(%scanner, error = %err, "failed to close catalog scanner");
            }

            match outcome? {
                CatalogScan::Complete => {
                    debug!(
                        %table,
                        catalog = %catalog_region.region.name,
                        regions = regions.len(),
                        "collected catalog rows"
                    );
                    return Ok(regions);
                }
                CatalogScan::Unassigned => {
                    if tries + 1 == self.attempts {
                        break;
                    }
                    debug!(%table, "table not fully assigned yet, sleeping before rescan");
                    tokio::time::sleep(self.pause).await;
                }
            }
        }

        Err(ClientError::NoServerForRegion(format!(
            "no server assignment for {table} after {} tries",
            self.attempts
        )))
    }

    /// Drains one open catalog scanner into `out`.
    ///
    /// The caller owns the scanner and closes it whatever this returns.
    async fn collect_catalog_rows(
        &self,
        server: &dyn RegionServer,
        scanner: ScannerId,
        table: &TableName,
        out: &mut TableDirectory,
    ) -> Result<CatalogScan> {
        loop {
            let Some(scan_row) = server.next(scanner).await? else {
                if out.is_empty() {
                    return Err(ClientError::RegionNotFound(format!(
                        "table {table} has no catalog rows"
                    )));
                }
                return Ok(CatalogScan::Complete);
            };

            let Some(bytes) = scan_row.cell(COL_REGION) else {
                debug!(row = %scan_row.row, "catalog row without a region cell, skipping");
                continue;
            };
            let descriptor = catalog::decode_region(bytes)
                .map_err(|err| ClientError::CorruptCatalog(err.to_string()))?;

            if descriptor.table.name != *table {
                // Rows are ordered, so the table's run is over.
                if out.is_empty() {
                    return Err(ClientError::RegionNotFound(format!(
                        "table {table} has no catalog rows"
                    )));
                }
                return Ok(CatalogScan::Complete);
            }

            if descriptor.offline {
                return Err(ClientError::TableOffline(table.clone()));
            }

            match scan_row.cell(COL_SERVER).filter(|bytes| !bytes.is_empty()) {
                Some(bytes) => {
                    let addr = catalog::decode_server(bytes)
                        .map_err(|err| ClientError::CorruptCatalog(err.to_string()))?;
                    out.insert(
                        descriptor.start_key.clone(),
                        RegionLocation {
                            region: descriptor,
                            server: addr,
                        },
                    );
                }
                None => {
                    debug!(region = %descriptor.name, "region has no server assignment");
                    out.clear();
                    return Ok(CatalogScan::Unassigned);
                }
            }
        }
    }
}
