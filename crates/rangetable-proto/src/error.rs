//! Remote error kinds surfaced across the RPC boundary.

use thiserror::Error;

use crate::types::{RegionName, ServerAddress, TableName};

/// Errors a region server, master, or the connect path can return.
///
/// The client cares about one property above all: whether an error means its
/// cached region location has gone stale (see [`RpcError::is_stale_location`]).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// The addressed server no longer serves the named region.
    #[error("region {0} is not served here")]
    NotServingRegion(RegionName),

    /// The row was routed to a region whose range does not cover it.
    #[error("row routed to wrong region: {0}")]
    WrongRegion(String),

    /// The named region does not exist on the addressed server.
    #[error("region not found: {0}")]
    RegionNotFound(String),

    /// A column name the server could not parse or does not know.
    #[error("invalid column name: {0}")]
    InvalidColumnName(String),

    /// A row-lock operation failed (unknown lock, wrong owner, expired).
    #[error("lock error: {0}")]
    Lock(String),

    /// An operation that requires a disabled table found it enabled.
    #[error("table {0} is not disabled")]
    TableNotDisabled(TableName),

    /// The RPC layer gave up on the address permanently.
    #[error("server {addr} unreachable: {reason}")]
    Unreachable {
        /// Address that could not be reached.
        addr: ServerAddress,
        /// Underlying transport failure.
        reason: String,
    },

    /// Any other remote failure, relayed as text.
    #[error("remote error: {0}")]
    Remote(String),
}

impl RpcError {
    /// True for the error kinds that mean a cached region location is stale
    /// and a catalog re-resolution may fix the call.
    pub fn is_stale_location(&self) -> bool {
        matches!(
            self,
            RpcError::NotServingRegion(_) | RpcError::WrongRegion(_) | RpcError::RegionNotFound(_)
        )
    }
}

/// Result alias for the RPC boundary.
pub type RpcResult<T> = Result<T, RpcError>;
