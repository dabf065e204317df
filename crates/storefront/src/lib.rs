//! Sugarplum Storefront library.
//!
//! This crate provides the storefront server functionality as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod datastore;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod stripe;
