//! # E-Deposit Common Library
//!
//! Shared code for the e-deposit services:
//! - Error type shared by storage and configuration code
//! - Bootstrap configuration and root folder resolution
//! - SQLite initialization and schema
//! - Credential hashing and Basic auth header parsing
//! - Timestamp helpers

pub mod api;
pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod time;

pub use error::{Error, Result};
