//! LanceDB-backed persistence for embedded chunks.
//!
//! One table holds every chunk row: identity, flattened metadata columns,
//! the raw text and a fixed-size embedding vector. Consistency under
//! concurrent readers and writers is delegated entirely to LanceDB.

pub mod schema;
pub mod store;

pub use store::KnowledgeStore;
