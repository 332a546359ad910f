//! Administrative operations and their wait-for-completion polls.
//!
//! Every mutating admin call has the same shape: guard the table name, issue
//! the master RPC, then poll the first meta region that would host the table
//! until its catalog row reflects the target state. The polls are bounded
//! and best-effort; the master call itself has already succeeded by the time
//! they run.

use std::collections::BTreeMap;

use rangetable_proto::catalog::{self, CATALOG_FAMILY, COL_REGION};
use rangetable_proto::{
    ColumnFamily, ColumnName, RegionDescriptor, RegionServer, RowKey, ScannerId, TableDescriptor,
    TableName,
};
use tracing::{debug, info, warn};

use crate::client::Client;
use crate::error::{ClientError, Result};

/// Catalog state a wait-loop polls for.
enum WaitTarget {
    /// Any catalog row for the table exists.
    Created,
    /// No catalog row for the table remains.
    Deleted,
    /// The first row's descriptor is not offline.
    Enabled,
    /// The first row's descriptor is offline.
    Disabled,
}

impl Client {
    /// Creates a table and waits until its first region appears in the
    /// catalog.
    pub async fn create_table(&self, table: &TableDescriptor) -> Result<()> {
        Self::ensure_user_table(&table.name)?;
        let master = self.master.ensure_master().await?;
        master.create_table(table).await?;
        self.wait_for_catalog(&table.name, WaitTarget::Created)
            .await?;
        info!(table = %table.name, "table created");
        Ok(())
    }

    /// Deletes a table and waits until its first region leaves the catalog.
    pub async fn delete_table(&self, table: &TableName) -> Result<()> {
        Self::ensure_user_table(table)?;
        let master = self.master.ensure_master().await?;
        master.delete_table(table).await?;
        self.wait_for_catalog(table, WaitTarget::Deleted).await?;
        info!(%table, "table deleted");
        Ok(())
    }

    /// Brings a disabled table back online and waits for the catalog to show
    /// it enabled.
    pub async fn enable_table(&self, table: &TableName) -> Result<()> {
        Self::ensure_user_table(table)?;
        let master = self.master.ensure_master().await?;
        master.enable_table(table).await?;
        self.wait_for_catalog(table, WaitTarget::Enabled).await?;
        info!(%table, "table enabled");
        Ok(())
    }

    /// Takes a table offline and waits for the catalog to show it disabled.
    pub async fn disable_table(&self, table: &TableName) -> Result<()> {
        Self::ensure_user_table(table)?;
        let master = self.master.ensure_master().await?;
        master.disable_table(table).await?;
        self.wait_for_catalog(table, WaitTarget::Disabled).await?;
        info!(%table, "table disabled");
        Ok(())
    }

    /// Adds a column family to a table.
    pub async fn add_column(&self, table: &TableName, family: &ColumnFamily) -> Result<()> {
        Self::ensure_user_table(table)?;
        let master = self.master.ensure_master().await?;
        master.add_column(table, family).await?;
        Ok(())
    }

    /// Removes a column family from a table.
    pub async fn delete_column(&self, table: &TableName, family: &str) -> Result<()> {
        Self::ensure_user_table(table)?;
        let master = self.master.ensure_master().await?;
        master.delete_column(table, family).await?;
        Ok(())
    }

    /// Shuts the whole cluster down.
    pub async fn shutdown(&self) -> Result<()> {
        let master = self.master.ensure_master().await?;
        master.shutdown().await?;
        Ok(())
    }

    /// Lists every user table known to the catalog.
    ///
    /// Scans all meta regions and keeps one descriptor per table, taken from
    /// the region whose start key is empty.
    pub async fn list_tables(&self) -> Result<Vec<TableDescriptor>> {
        let mut tables = BTreeMap::new();
        for meta_region in self.resolver.all_meta_regions().await? {
            let server = self.pool.region_server(&meta_region.server).await?;
            let columns = [ColumnName::from(CATALOG_FAMILY)];
            let scanner = server
                .open_scanner(&meta_region.region.name, &columns, &RowKey::empty())
                .await?;
            let outcome = Self::collect_table_descriptors(server.as_ref(), scanner, &mut tables).await;
            if let Err(err) = server.close_scanner(scanner).await {
                warn!(scanner = %scanner, error = %err, "failed to close catalog scanner");
            }
            outcome?;
        }
        Ok(tables.into_values().collect())
    }

    async fn collect_table_descriptors(
        server: &dyn RegionServer,
        scanner: ScannerId,
        out: &mut BTreeMap<TableName, TableDescriptor>,
    ) -> Result<()> {
        while let Some(scan_row) = server.next(scanner).await? {
            let Some(bytes) = scan_row.cell(COL_REGION) else {
                continue;
            };
            let descriptor = catalog::decode_region(bytes)
                .map_err(|err| ClientError::CorruptCatalog(err.to_string()))?;
            // One row per table suffices: the first region has an empty
            // start key.
            if descriptor.start_key.is_empty() {
                out.insert(descriptor.table.name.clone(), descriptor.table);
            }
        }
        Ok(())
    }

    /// Polls the first meta region hosting `table` until the catalog shows
    /// `target`, up to the retry budget.
    ///
    /// An empty first poll means the catalog has not caught up yet and
    /// counts as "not yet", never as "no such table". Exhausting the budget
    /// is logged and tolerated; the master operation itself already
    /// succeeded.
    async fn wait_for_catalog(&self, table: &TableName, target: WaitTarget) -> Result<()> {
        let first_meta = self.resolver.first_meta_region_for(table).await?;
        let server = self.pool.region_server(&first_meta.server).await?;
        let columns = [ColumnName::from(COL_REGION)];
        let attempts = self.config.attempts();

        for tries in 0..attempts {
            let scanner = server
                .open_scanner(&first_meta.region.name, &columns, &table.as_row_key())
                .await?;
            let probe = Self::probe_first_row(server.as_ref(), scanner, table).await;
            if let Err(err) = server.close_scanner(scanner).await {
                warn!(scanner = %scanner, error = %err, "failed to close catalog scanner");
            }

            let satisfied = match (&target, probe?) {
                (WaitTarget::Created, Some(_)) => true,
                (WaitTarget::Deleted, None) => true,
                (WaitTarget::Enabled, Some(descriptor)) => !descriptor.offline,
                (WaitTarget::Disabled, Some(descriptor)) => descriptor.offline,
                _ => false,
            };
            if satisfied {
                return Ok(());
            }
            if tries + 1 == attempts {
                break;
            }
            debug!(%table, tries, "catalog does not reflect the change yet, sleeping");
            tokio::time::sleep(self.config.pause).await;
        }

        warn!(%table, "gave up waiting for the catalog to reflect the change");
        Ok(())
    }

    /// Reads the first catalog row for `table`, or `None` if the first row
    /// at or after the hint belongs to another table.
    async fn probe_first_row(
        server: &dyn RegionServer,
        scanner: ScannerId,
        table: &TableName,
    ) -> Result<Option<RegionDescriptor>> {
        let Some(scan_row) = server.next(scanner).await? else {
            return Ok(None);
        };
        let Some(bytes) = scan_row.cell(COL_REGION) else {
            return Ok(None);
        };
        let descriptor = catalog::decode_region(bytes)
            .map_err(|err| ClientError::CorruptCatalog(err.to_string()))?;
        if descriptor.table.name == *table {
            Ok(Some(descriptor))
        } else {
            Ok(None)
        }
    }
}
