//! Sugarplum Core - Shared types library.
//!
//! This crate provides common types used across Sugarplum components:
//! - `storefront` - Storefront server (checkout + webhook reconciliation)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money conversion, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
