//! Master discovery and liveness.

use std::sync::Arc;
use std::time::Duration;

use rangetable_proto::{Connector, Master, RpcError, RpcResult, ServerAddress};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{ClientError, Result};

/// Finds the master, verifies it is alive, and caches the handle.
pub struct MasterLocator {
    connector: Arc<dyn Connector>,
    address: ServerAddress,
    attempts: usize,
    pause: Duration,
    master: Mutex<Option<Arc<dyn Master>>>,
}

impl MasterLocator {
    /// Creates a locator for the configured master address.
    pub fn new(
        connector: Arc<dyn Connector>,
        address: ServerAddress,
        attempts: usize,
        pause: Duration,
    ) -> Self {
        Self {
            connector,
            address,
            attempts,
            pause,
            master: Mutex::new(None),
        }
    }

    /// Returns a live master handle, connecting and probing if none is
    /// cached yet.
    ///
    /// Makes up to the configured number of attempts, sleeping the configured
    /// pause between them, and fails with `MasterNotRunning` once the budget
    /// is spent.
    pub async fn ensure_master(&self) -> Result<Arc<dyn Master>> {
        let mut cached = self.master.lock().await;
        if let Some(master) = cached.as_ref() {
            return Ok(master.clone());
        }

        for tries in 0..self.attempts {
            match self.probe().await {
                Ok(master) => {
                    info!(addr = %self.address, "connected to master");
                    *cached = Some(master.clone());
                    return Ok(master);
                }
                Err(err) => {
                    if tries + 1 == self.attempts {
                        // Last chance spent, don't bother sleeping.
                        break;
                    }
                    debug!(
                        addr = %self.address,
                        attempt = tries,
                        error = %err,
                        "master probe failed, sleeping before retry"
                    );
                    tokio::time::sleep(self.pause).await;
                }
            }
        }

        Err(ClientError::MasterNotRunning)
    }

    /// Liveness check that swallows the failure into `false`.
    pub async fn is_running(&self) -> bool {
        self.ensure_master().await.is_ok()
    }

    async fn probe(&self) -> RpcResult<Arc<dyn Master>> {
        let master = self.connector.master(&self.address).await?;
        if master.is_running().await? {
            Ok(master)
        } else {
            Err(RpcError::Remote("master reports it is not running".into()))
        }
    }
}
