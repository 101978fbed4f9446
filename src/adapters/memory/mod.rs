//! Memory adapters - thread and run store implementations.

mod in_memory;
mod postgres_thread_store;

pub use in_memory::{InMemoryRunStore, InMemoryThreadStore};
pub use postgres_thread_store::PostgresThreadStore;
