//! Client-side error kinds and the remote-error translator.

use rangetable_proto::{RpcError, ServerAddress, TableName};
use thiserror::Error;

/// Errors surfaced by the client core.
///
/// Remote errors are rematerialized as local kinds by the [`From<RpcError>`]
/// translator at the dispatcher boundary; stale-location kinds are normally
/// consumed by the invalidate-and-retry loop and only escape once the retry
/// budget is spent.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The master could not be reached, or kept reporting itself down.
    #[error("master is not running")]
    MasterNotRunning,

    /// The root region could not be located, or a region exists but stayed
    /// unassigned through every retry.
    #[error("no server for region: {0}")]
    NoServerForRegion(String),

    /// No region matched: the table has no catalog rows, or a server no
    /// longer knows the named region.
    #[error("region not found: {0}")]
    RegionNotFound(String),

    /// A region server declined a request for a region it no longer serves.
    #[error("region {0} is not served here")]
    NotServingRegion(String),

    /// A row was dispatched to a region whose range does not cover it.
    #[error("row routed to wrong region: {0}")]
    WrongRegion(String),

    /// A catalog scan found one of the table's regions marked offline.
    #[error("table {0} is offline")]
    TableOffline(TableName),

    /// An operation referenced a table that was never opened.
    #[error("table {0} is not open")]
    TableNotOpen(TableName),

    /// Empty table or row key, or a reserved table name.
    #[error("{0}")]
    InvalidArgument(String),

    /// A catalog row could not be decoded.
    #[error("corrupt catalog row: {0}")]
    CorruptCatalog(String),

    /// Invalid column name, relayed from the server.
    #[error("invalid column name: {0}")]
    InvalidColumnName(String),

    /// Row-lock failure, relayed from the server.
    #[error("lock error: {0}")]
    Lock(String),

    /// The table must be disabled first, relayed from the server.
    #[error("table {0} is not disabled")]
    TableNotDisabled(TableName),

    /// A server address the RPC layer declared permanently dead.
    #[error("server {addr} unreachable: {reason}")]
    Unreachable {
        /// The dead address.
        addr: ServerAddress,
        /// Underlying transport failure.
        reason: String,
    },

    /// Any other remote failure, relayed as text.
    #[error("remote error: {0}")]
    Remote(String),
}

impl From<RpcError> for ClientError {
    fn from(err: RpcError) -> Self {
        match err {
            RpcError::NotServingRegion(region) => {
                ClientError::NotServingRegion(region.as_str().to_string())
            }
            RpcError::WrongRegion(msg) => ClientError::WrongRegion(msg),
            RpcError::RegionNotFound(msg) => ClientError::RegionNotFound(msg),
            RpcError::InvalidColumnName(msg) => ClientError::InvalidColumnName(msg),
            RpcError::Lock(msg) => ClientError::Lock(msg),
            RpcError::TableNotDisabled(table) => ClientError::TableNotDisabled(table),
            RpcError::Unreachable { addr, reason } => ClientError::Unreachable { addr, reason },
            RpcError::Remote(msg) => ClientError::Remote(msg),
        }
    }
}

/// Result alias used throughout the client.
pub type Result<T> = std::result::Result<T, ClientError>;
