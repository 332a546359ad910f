//! Single-row atomic update sessions.
//!
//! [`Client::start_update`] resolves the row through the same
//! invalidate-and-retry combinator as every other per-row call, then pins the
//! resolved region and server into an owned [`RowUpdate`]. The pinned pair is
//! used for the whole session; `commit` and `abort` consume the session, so
//! no "mutation without a session" state exists to misuse.

use std::sync::Arc;

use rand::Rng;
use rangetable_proto::{ColumnName, LockId, RegionName, RegionServer, RowKey, RpcError, TableName};
use tracing::warn;

use crate::client::Client;
use crate::error::{ClientError, Result};

impl Client {
    /// Opens a server-side lock on `row` and returns the update session
    /// bound to it.
    pub async fn start_update(&self, table: &TableName, row: &RowKey) -> Result<RowUpdate> {
        Self::ensure_table(table)?;
        Self::ensure_row(row)?;
        // A fresh id per session; it only has to distinguish concurrent
        // sessions on the server, so a non-cryptographic source is enough.
        let client_id: u64 = rand::thread_rng().gen();
        self.call_region(table, row, |server, location| async move {
            let lock = server
                .start_update(&location.region.name, client_id, row)
                .await?;
            Ok(RowUpdate {
                server,
                region: location.region.name.clone(),
                client_id,
                lock,
                open: true,
            })
        })
        .await
    }
}

/// An open single-row update: a server-side row lock plus the staged
/// mutations behind it.
///
/// The session is pinned to the region and server resolved at start; it does
/// not chase region movement. A failed `put` or `delete` aborts the lock
/// best-effort and poisons the session; `commit` and `abort` consume it
/// either way.
pub struct RowUpdate {
    server: Arc<dyn RegionServer>,
    region: RegionName,
    client_id: u64,
    lock: LockId,
    open: bool,
}

impl std::fmt::Debug for RowUpdate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowUpdate")
            .field("region", &self.region)
            .field("client_id", &self.client_id)
            .field("lock", &self.lock)
            .field("open", &self.open)
            .finish()
    }
}

impl RowUpdate {
    /// The server-assigned lock id.
    pub fn lock_id(&self) -> LockId {
        self.lock
    }

    /// Stages a cell write.
    pub async fn put(&mut self, column: &ColumnName, value: Vec<u8>) -> Result<()> {
        self.ensure_open()?;
        match self
            .server
            .put(&self.region, self.client_id, self.lock, column, value)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail_and_abort(err).await),
        }
    }

    /// Stages a cell delete.
    pub async fn delete(&mut self, column: &ColumnName) -> Result<()> {
        self.ensure_open()?;
        match self
            .server
            .delete(&self.region, self.client_id, self.lock, column)
            .await
        {
            Ok(()) => Ok(()),
            Err(err) => Err(self.fail_and_abort(err).await),
        }
    }

    /// Atomically applies every staged mutation and releases the lock.
    pub async fn commit(mut self) -> Result<()> {
        self.ensure_open()?;
        self.open = false;
        self.server
            .commit_update(&self.region, self.client_id, self.lock)
            .await
            .map_err(Into::into)
    }

    /// Discards every staged mutation and releases the lock.
    pub async fn abort(mut self) -> Result<()> {
        self.ensure_open()?;
        self.open = false;
        self.server
            .abort_update(&self.region, self.client_id, self.lock)
            .await
            .map_err(Into::into)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.open {
            Ok(())
        } else {
            Err(ClientError::Lock(format!(
                "update {} was already terminated",
                self.lock
            )))
        }
    }

    /// Aborts the lock best-effort and surfaces the original error.
    async fn fail_and_abort(&mut self, original: RpcError) -> ClientError {
        self.open = false;
        if let Err(abort_err) = self
            .server
            .abort_update(&self.region, self.client_id, self.lock)
            .await
        {
            warn!(
                lock = %self.lock,
                error = %abort_err,
                "best-effort abort after failed mutation also failed"
            );
        }
        original.into()
    }
}

impl Drop for RowUpdate {
    fn drop(&mut self) {
        if self.open {
            warn!(
                lock = %self.lock,
                region = %self.region,
                "row update dropped without commit or abort, leaving the lock to expire"
            );
        }
    }
}
