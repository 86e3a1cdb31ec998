//! Store abstractions and their backends.
//!
//! Services only ever see the traits in [`traits`]; the binary picks the
//! backend at start-up (Postgres when a database URL is configured, the
//! in-memory store otherwise).

pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use traits::{ProductStore, SaleStore, StoreError, StoreResult, UserStore};
