//! In-memory document source for the docjson codec.
//!
//! Provides [`InMemoryLoader`], a HashMap-backed implementation of the
//! [`DocumentLoader`](docjson_core::document::DocumentLoader) contract.
//! Useful for tests and for serving reference-following and field pagination
//! without a database.

mod store;

pub use store::InMemoryLoader;
