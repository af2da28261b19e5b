// Bookshelf - Core Library
// Exposes the catalog and account registry for the CLI, the API server, and tests

pub mod accounts;
pub mod catalog;
pub mod error;
pub mod mirror;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use accounts::{Account, AccountRegistry};
pub use catalog::{parse_seed, BookRecord, Catalog, Reviews, SeedBook, DEFAULT_SEED};
pub use error::CatalogError;
pub use mirror::{LocalCatalog, MirroredCatalog, RemoteCatalog, SnapshotMirror};
