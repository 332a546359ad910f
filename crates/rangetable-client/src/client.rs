//! The client handle tying the pool, master locator, directory and resolver
//! together.

use std::sync::Arc;

use rangetable_proto::{Connector, RowKey, TableName};
use tracing::debug;

use crate::config::ClientConfig;
use crate::directory::{RegionDirectory, RegionLocation};
use crate::error::{ClientError, Result};
use crate::master::MasterLocator;
use crate::pool::ServerPool;
use crate::resolver::CatalogResolver;

/// Client for a rangetable cluster.
///
/// Cheap to clone; all clones share one connection pool, one master handle
/// and one region directory.
#[derive(Clone)]
pub struct Client {
    pub(crate) config: ClientConfig,
    pub(crate) pool: Arc<ServerPool>,
    pub(crate) master: Arc<MasterLocator>,
    pub(crate) directory: Arc<RegionDirectory>,
    pub(crate) resolver: Arc<CatalogResolver>,
}

impl Client {
    /// Creates a client over the given transport.
    pub fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let pool = Arc::new(ServerPool::new(connector.clone()));
        let master = Arc::new(MasterLocator::new(
            connector,
            config.master_address.clone(),
            config.attempts(),
            config.pause,
        ));
        let directory = Arc::new(RegionDirectory::new());
        let resolver = Arc::new(CatalogResolver::new(
            pool.clone(),
            master.clone(),
            directory.clone(),
            config.attempts(),
            config.pause,
        ));
        Self {
            config,
            pool,
            master,
            directory,
            resolver,
        }
    }

    /// Loads the table's region directory so it can be operated on.
    ///
    /// Idempotent: reopening an already-open table reuses the cached
    /// directory.
    pub async fn open_table(&self, table: &TableName) -> Result<()> {
        Self::ensure_table(table)?;
        if self.directory.is_open(table) {
            return Ok(());
        }
        debug!(%table, "no cached directory, resolving");
        self.resolver.resolve(table).await?;
        Ok(())
    }

    /// True if the cluster master answers its liveness probe.
    pub async fn is_master_running(&self) -> bool {
        self.master.is_running().await
    }

    /// The shared region directory cache.
    pub fn directory(&self) -> &RegionDirectory {
        &self.directory
    }

    /// Drops the stale region's table from the directory and resolves it
    /// afresh.
    pub(crate) async fn relocate(&self, stale: &RegionLocation) -> Result<()> {
        debug!(
            region = %stale.region.name,
            server = %stale.server,
            "dropping cached directory for {}",
            stale.region.table.name
        );
        self.directory.invalidate_region(stale);
        self.resolver.resolve(&stale.region.table.name).await?;
        Ok(())
    }

    /// Rejects empty table names before any RPC happens.
    pub(crate) fn ensure_table(table: &TableName) -> Result<()> {
        if table.is_empty() {
            return Err(ClientError::InvalidArgument(
                "table name cannot be zero length".into(),
            ));
        }
        Ok(())
    }

    /// Rejects empty row keys before any RPC happens.
    pub(crate) fn ensure_row(row: &RowKey) -> Result<()> {
        if row.is_empty() {
            return Err(ClientError::InvalidArgument(
                "row key cannot be zero length".into(),
            ));
        }
        Ok(())
    }

    /// Rejects reserved and empty table names on admin operations.
    pub(crate) fn ensure_user_table(table: &TableName) -> Result<()> {
        Self::ensure_table(table)?;
        if table.is_reserved() {
            return Err(ClientError::InvalidArgument(format!(
                "{table} is a reserved table name"
            )));
        }
        Ok(())
    }
}
