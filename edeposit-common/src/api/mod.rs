//! Shared HTTP API functionality
//!
//! # Design Principle
//!
//! This module contains ONLY pure functions and shared types, with no HTTP
//! framework dependencies. Services wrap these with framework-specific
//! middleware (Axum, etc.).

pub mod auth;

pub use auth::{
    generate_salt, hash_password, parse_basic_auth, verify_password, ApiAuthError,
    BasicCredentials,
};
