//! Table, column-family and region descriptors.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{RegionName, RowKey, TableName};

/// Definition of one column family within a table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnFamily {
    /// Family name, without the trailing colon.
    pub name: String,
    /// How many versions of each cell the family retains.
    pub max_versions: u32,
}

impl ColumnFamily {
    /// Creates a family with the default retention of three versions.
    pub fn new(name: impl Into<String>) -> Self {
        ColumnFamily {
            name: name.into(),
            max_versions: 3,
        }
    }
}

/// A table: its name plus its column families.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescriptor {
    /// The table name.
    pub name: TableName,
    /// The table's column families.
    pub families: Vec<ColumnFamily>,
}

impl TableDescriptor {
    /// Creates a descriptor.
    pub fn new(name: TableName, families: Vec<ColumnFamily>) -> Self {
        TableDescriptor { name, families }
    }
}

/// One region of a table: a contiguous key range served by one server at a
/// time.
///
/// The range is `[start_key, end_key)`; an empty `end_key` means the range is
/// unbounded above, and the first region of a table has an empty `start_key`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    /// Unique region name, the handle every per-region RPC routes by.
    pub name: RegionName,
    /// Inclusive lower bound of the region's key range.
    pub start_key: RowKey,
    /// Exclusive upper bound; empty means unbounded.
    pub end_key: RowKey,
    /// The owning table.
    pub table: TableDescriptor,
    /// Set while the table is disabled.
    pub offline: bool,
}

impl RegionDescriptor {
    /// Creates a descriptor, deriving the region name from the table name,
    /// start key and a disambiguating id.
    pub fn new(table: TableDescriptor, start_key: RowKey, end_key: RowKey, region_id: u64) -> Self {
        let name = RegionName::new(format!(
            "{},{},{}",
            table.name,
            String::from_utf8_lossy(start_key.as_bytes()),
            region_id
        ));
        RegionDescriptor {
            name,
            start_key,
            end_key,
            table,
            offline: false,
        }
    }

    /// True if `row` falls inside this region's `[start, end)` range.
    pub fn contains(&self, row: &RowKey) -> bool {
        *row >= self.start_key && (self.end_key.is_empty() || *row < self.end_key)
    }
}

impl fmt::Display for RegionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name.as_str())
    }
}
