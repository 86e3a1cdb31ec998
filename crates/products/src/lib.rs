//! Products domain module.
//!
//! The catalog is read-only from the point of view of this backend: products
//! are listed to buyers and referenced by sale line items.

pub mod catalog;
pub mod product;

pub use catalog::starter_catalog;
pub use product::{NewProduct, Product};
