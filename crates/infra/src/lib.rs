//! Infrastructure layer: persistence backends for users, products and sales.

pub mod store;

pub use store::{
    InMemoryStore, PostgresStore, ProductStore, SaleStore, StoreError, StoreResult, UserStore,
};
