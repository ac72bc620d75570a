//! In-memory catalog storage for the pet store.
//!
//! Every collection lives behind a single async lock; reads clone records out
//! and writes (including a sale's customer and pet side effects) are applied
//! while the write guard is held.

pub mod fixtures;
pub mod store;

pub use fixtures::SeedDataset;
pub use store::{Catalog, CatalogStore, Collection, Record, SaleReceipt, StoreError};
