//! Domain models for checkout and reconciliation.

pub mod cart;
pub mod order;

pub use cart::CartLine;
pub use order::{OrderItemSummary, ShippingAddress};
