#![warn(missing_docs)]

//! Client core for the rangetable store: region-directory resolution and
//! request dispatch.
//!
//! A table is an ordered sequence of regions, each covering a contiguous key
//! range and served by one region server at a time. Two catalog tables form
//! the lookup index: the single-region root table indexes the meta table,
//! and the meta table indexes every user table. This crate resolves row keys
//! to the responsible server by walking that index, caches the resolutions,
//! detects staleness through RPC error classification, and wraps reads,
//! scans and single-row updates in a bounded invalidate-and-retry loop.
//!
//! The wire layer is abstracted behind the traits in `rangetable-proto`;
//! hand a [`Client`] a connector and it does the rest.

pub mod admin;
pub mod client;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod master;
pub mod pool;
pub mod resolver;
pub mod scanner;
pub mod update;

pub use client::Client;
pub use config::ClientConfig;
pub use directory::{RegionDirectory, RegionLocation, TableDirectory};
pub use error::{ClientError, Result};
pub use master::MasterLocator;
pub use pool::ServerPool;
pub use resolver::CatalogResolver;
pub use scanner::TableScanner;
pub use update::RowUpdate;
