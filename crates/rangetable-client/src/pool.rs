//! Pooled region-server connections.

use std::collections::HashMap;
use std::sync::Arc;

use rangetable_proto::{Connector, RegionServer, RpcResult, ServerAddress};
use tokio::sync::Mutex;
use tracing::debug;

/// Maps server address to a reusable RPC handle, connecting lazily.
///
/// Connects are single-flight: the pool lock is held across the first connect
/// to an address, so concurrent first-connects cannot produce duplicate
/// handles. Entries live until the client is dropped; there is no eviction.
pub struct ServerPool {
    connector: Arc<dyn Connector>,
    servers: Mutex<HashMap<ServerAddress, Arc<dyn RegionServer>>>,
}

impl ServerPool {
    /// Creates an empty pool over the given transport.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            servers: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the pooled handle for `addr`, connecting on first use.
    ///
    /// Idempotent per address: a second call returns the same handle.
    pub async fn region_server(&self, addr: &ServerAddress) -> RpcResult<Arc<dyn RegionServer>> {
        let mut servers = self.servers.lock().await;
        if let Some(server) = servers.get(addr) {
            return Ok(server.clone());
        }
        debug!(%addr, "connecting to region server");
        let server = self.connector.region_server(addr).await?;
        servers.insert(addr.clone(), server.clone());
        Ok(server)
    }

    /// Number of live connections, for observability and tests.
    pub async fn connected(&self) -> usize {
        self.servers.lock().await.len()
    }
}
