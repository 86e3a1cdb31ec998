//! Sales domain module.
//!
//! This crate contains the business rules for sales (orders): the record
//! shapes, creation-time invariants and the status lifecycle, implemented as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod lifecycle;
pub mod sale;

pub use lifecycle::{next_status, transition_for, Transition, TRANSITIONS};
pub use sale::{
    LineItem, NewSale, Sale, SaleDetails, SaleFilter, SaleLineItem, SaleStatus, MAX_TOTAL_PRICE,
};
