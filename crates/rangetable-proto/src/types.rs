//! Key and name newtypes shared by the client and the wire boundary.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the single-region root catalog table.
pub const ROOT_TABLE_NAME: &str = ".root";

/// Name of the multi-region meta catalog table.
pub const META_TABLE_NAME: &str = ".meta";

/// An opaque row key, ordered lexicographically byte by byte.
///
/// The empty key is a sentinel: as a region start key it means "less than
/// any key", as a region end key it means "greater than any key".
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RowKey(Vec<u8>);

impl RowKey {
    /// The empty sentinel key.
    pub const fn empty() -> Self {
        RowKey(Vec::new())
    }

    /// Wraps raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        RowKey(bytes.into())
    }

    /// True for the empty sentinel.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for RowKey {
    fn from(s: &str) -> Self {
        RowKey(s.as_bytes().to_vec())
    }
}

impl From<&[u8]> for RowKey {
    fn from(b: &[u8]) -> Self {
        RowKey(b.to_vec())
    }
}

impl From<Vec<u8>> for RowKey {
    fn from(b: Vec<u8>) -> Self {
        RowKey(b)
    }
}

impl fmt::Debug for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RowKey({})", String::from_utf8_lossy(&self.0))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.0))
    }
}

/// A table name.
///
/// Table names are valid UTF-8 and double as row-key hints when scanning the
/// catalog tables, so their byte ordering matters.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TableName(String);

impl TableName {
    /// Wraps a table name.
    pub fn new(name: impl Into<String>) -> Self {
        TableName(name.into())
    }

    /// The root catalog table.
    pub fn root() -> Self {
        TableName(ROOT_TABLE_NAME.to_string())
    }

    /// The meta catalog table.
    pub fn meta() -> Self {
        TableName(META_TABLE_NAME.to_string())
    }

    /// True if this is one of the two reserved catalog table names.
    pub fn is_reserved(&self) -> bool {
        self.0 == ROOT_TABLE_NAME || self.0 == META_TABLE_NAME
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for the empty name.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The name reinterpreted as a row key, for catalog floor lookups.
    pub fn as_row_key(&self) -> RowKey {
        RowKey::from(self.0.as_str())
    }
}

impl From<&str> for TableName {
    fn from(s: &str) -> Self {
        TableName(s.to_string())
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The unique name of one region, used as the routing handle in every
/// per-region RPC.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionName(String);

impl RegionName {
    /// Wraps a region name.
    pub fn new(name: impl Into<String>) -> Self {
        RegionName(name.into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A column name in `family:qualifier` form.
///
/// A name consisting of just `family:` selects the whole family; catalog
/// scans use this to fetch every catalog column in one pass.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ColumnName(String);

impl ColumnName {
    /// Wraps a column name.
    pub fn new(name: impl Into<String>) -> Self {
        ColumnName(name.into())
    }

    /// The name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The family part of the name.
    pub fn family(&self) -> &str {
        self.0.split_once(':').map(|(family, _)| family).unwrap_or(&self.0)
    }

    /// True if the name selects a whole family (`family:`).
    pub fn is_family_only(&self) -> bool {
        self.0.ends_with(':')
    }

    /// True if `other` is selected by this name: exact match, or same family
    /// when this name is family-only.
    pub fn selects(&self, other: &ColumnName) -> bool {
        if self.is_family_only() {
            self.family() == other.family()
        } else {
            self == other
        }
    }
}

impl From<&str> for ColumnName {
    fn from(s: &str) -> Self {
        ColumnName(s.to_string())
    }
}

impl fmt::Display for ColumnName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A region server or master address in `host:port` form.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerAddress(String);

impl ServerAddress {
    /// Wraps an address string.
    pub fn new(addr: impl Into<String>) -> Self {
        ServerAddress(addr.into())
    }

    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ServerAddress {
    fn from(s: &str) -> Self {
        ServerAddress(s.to_string())
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Server-assigned handle for an open server-side scanner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScannerId(u64);

impl ScannerId {
    /// Wraps a raw scanner id.
    pub fn new(id: u64) -> Self {
        ScannerId(id)
    }

    /// The raw id value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScannerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-assigned handle for a single-row update lock.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LockId(u64);

impl LockId {
    /// Wraps a raw lock id.
    pub fn new(id: u64) -> Self {
        LockId(id)
    }

    /// The raw id value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for LockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
