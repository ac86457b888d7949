//! Clearcut - Background-removal image service
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod removal;
pub mod server;
pub mod store;

pub use error::{Error, Result};
