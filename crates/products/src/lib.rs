//! Products domain module.
//!
//! This crate contains business rules for car listings and their price history,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod price_history;
pub mod product;

pub use price_history::PriceHistory;
pub use product::{
    CreateProduct, Guards, Product, ProductRecord, ProductState, UpdateProduct,
};
