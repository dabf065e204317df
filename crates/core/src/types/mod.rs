//! Core types for Sugarplum.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod status;

pub use id::*;
pub use money::{MoneyError, from_cents, to_cents};
pub use status::*;
