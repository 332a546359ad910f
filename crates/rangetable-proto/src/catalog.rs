//! Catalog row layout shared by the root and meta tables.
//!
//! Each catalog row describes one region: the `info:region` column holds the
//! serialized region descriptor and the `info:server` column holds the
//! address of the server currently assigned the region. A row without
//! `info:server` describes a region that is not assigned anywhere yet.

use thiserror::Error;

use crate::rpc::ScanRow;
use crate::schema::{ColumnFamily, RegionDescriptor, TableDescriptor};
use crate::types::{ColumnName, RowKey, ServerAddress, TableName};

/// Column holding the serialized region descriptor.
pub const COL_REGION: &str = "info:region";

/// Column holding the assigned server address, UTF-8 `host:port`.
pub const COL_SERVER: &str = "info:server";

/// Family selector fetching every catalog column.
pub const CATALOG_FAMILY: &str = "info:";

/// A catalog cell that could not be decoded.
#[derive(Debug, Error)]
#[error("corrupt catalog cell: {0}")]
pub struct CatalogError(String);

/// The fixed descriptor of the root catalog region.
///
/// The root table is a single immovable region; every client derives the same
/// descriptor for it and only its server address is ever looked up.
pub fn root_region() -> RegionDescriptor {
    let table = TableDescriptor::new(TableName::root(), vec![ColumnFamily::new("info")]);
    RegionDescriptor::new(table, RowKey::empty(), RowKey::empty(), 0)
}

/// Serializes a region descriptor into an `info:region` cell.
pub fn encode_region(descriptor: &RegionDescriptor) -> Vec<u8> {
    bincode::serialize(descriptor).expect("region descriptor serialization should never fail")
}

/// Decodes an `info:region` cell.
pub fn decode_region(bytes: &[u8]) -> Result<RegionDescriptor, CatalogError> {
    bincode::deserialize(bytes).map_err(|e| CatalogError(e.to_string()))
}

/// Decodes an `info:server` cell.
pub fn decode_server(bytes: &[u8]) -> Result<ServerAddress, CatalogError> {
    let addr = std::str::from_utf8(bytes)
        .map_err(|e| CatalogError(format!("server address is not UTF-8: {e}")))?;
    Ok(ServerAddress::new(addr))
}

/// The catalog row key for a region: `table,start-key`.
///
/// Keyed this way, all rows of one table form a contiguous run that sorts at
/// or after the bare table name, which is what lets resolvers use the table
/// name itself as the scan hint.
pub fn catalog_row_key(descriptor: &RegionDescriptor) -> RowKey {
    let mut key = descriptor.table.name.as_str().as_bytes().to_vec();
    key.push(b',');
    key.extend_from_slice(descriptor.start_key.as_bytes());
    RowKey::new(key)
}

/// Builds the full catalog row for a region, omitting `info:server` when the
/// region is unassigned.
pub fn catalog_row(descriptor: &RegionDescriptor, server: Option<&ServerAddress>) -> ScanRow {
    let mut cells = vec![(ColumnName::from(COL_REGION), encode_region(descriptor))];
    if let Some(addr) = server {
        cells.push((ColumnName::from(COL_SERVER), addr.as_str().as_bytes().to_vec()));
    }
    ScanRow {
        row: catalog_row_key(descriptor),
        cells,
    }
}
