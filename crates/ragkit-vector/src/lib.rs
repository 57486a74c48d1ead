//! ragkit-vector
//!
//! The exact inner-product [`VectorIndex`] and its LanceDB-backed
//! [`IndexStore`] for persisted snapshots.

pub mod index;
pub mod schema;
pub mod store;
pub mod table;

pub use index::VectorIndex;
pub use store::IndexStore;
