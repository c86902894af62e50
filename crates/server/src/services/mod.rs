//! Application services.

pub mod checkout;

pub use checkout::{CheckoutError, CheckoutService};
