//! Business services for checkout and webhook reconciliation.

pub mod checkout;
pub mod reconcile;

pub use checkout::{CheckoutService, CreatedCheckout};
pub use reconcile::{ReconcileService, ReconciledOrder};
