#![warn(missing_docs)]

//! Shared surface between the rangetable client and the cluster it talks to.
//!
//! This crate defines everything both sides must agree on:
//! - key and name types with the ordering the catalog depends on
//! - table, column-family and region descriptors
//! - the catalog row layout and its serialization
//! - the region-server and master operations as async traits
//! - the remote error kinds the client classifies
//!
//! No server lives here; the traits are the opaque boundary the client
//! dispatches against.

pub mod catalog;
pub mod error;
pub mod rpc;
pub mod schema;
pub mod types;

pub use error::{RpcError, RpcResult};
pub use rpc::{Connector, Master, RegionServer, ScanRow};
pub use schema::{ColumnFamily, RegionDescriptor, TableDescriptor};
pub use types::{ColumnName, LockId, RegionName, RowKey, ScannerId, ServerAddress, TableName};
