//! HTTP Basic authentication primitives
//!
//! # Credential Storage
//!
//! - Each user has a random 16-byte salt (hex encoded)
//! - Stored hash is SHA-256 over `salt || password`, as 64 hex characters
//! - Verification compares every byte regardless of where the first
//!   mismatch occurs
//!
//! # Header Format
//!
//! `Authorization: Basic <base64(username:password)>`; the password may
//! itself contain colons, the username may not.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

// ========================================
// Error Types
// ========================================

/// Authentication error types
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiAuthError {
    /// Authorization header absent
    MissingCredentials,

    /// Header present but not a `Basic` scheme
    UnsupportedScheme(String),

    /// Credentials not valid base64 / UTF-8 / `user:pass`
    MalformedCredentials(String),

    /// Username or password rejected by the user directory
    InvalidCredentials,
}

impl std::fmt::Display for ApiAuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiAuthError::MissingCredentials => write!(f, "Missing credentials"),
            ApiAuthError::UnsupportedScheme(scheme) => {
                write!(f, "Unsupported authorization scheme: {}", scheme)
            }
            ApiAuthError::MalformedCredentials(reason) => {
                write!(f, "Malformed credentials: {}", reason)
            }
            ApiAuthError::InvalidCredentials => write!(f, "Invalid username or password"),
        }
    }
}

impl std::error::Error for ApiAuthError {}

// ========================================
// Password Hashing
// ========================================

/// Generate a fresh random salt (32 hex characters)
pub fn generate_salt() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Calculate the stored hash for a password
///
/// # Examples
///
/// ```
/// use edeposit_common::api::auth::hash_password;
///
/// let hash = hash_password("secret", "00ff");
/// assert_eq!(hash.len(), 64);
/// assert_eq!(hash, hash_password("secret", "00ff"));
/// ```
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Check a password against a stored salt and hash
pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let calculated = hash_password(password, salt);
    if calculated.len() != expected_hash.len() {
        return false;
    }

    calculated
        .bytes()
        .zip(expected_hash.bytes())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

// ========================================
// Basic Auth Header Parsing
// ========================================

/// Decoded Basic credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicCredentials {
    pub username: String,
    pub password: String,
}

/// Parse an `Authorization` header value
///
/// # Examples
///
/// ```
/// use edeposit_common::api::auth::parse_basic_auth;
///
/// // "user:pass"
/// let creds = parse_basic_auth("Basic dXNlcjpwYXNz").unwrap();
/// assert_eq!(creds.username, "user");
/// assert_eq!(creds.password, "pass");
/// ```
pub fn parse_basic_auth(header_value: &str) -> Result<BasicCredentials, ApiAuthError> {
    let header_value = header_value.trim();
    let (scheme, encoded) = header_value
        .split_once(' ')
        .ok_or_else(|| ApiAuthError::MalformedCredentials("missing credentials".to_string()))?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(ApiAuthError::UnsupportedScheme(scheme.to_string()));
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiAuthError::MalformedCredentials(format!("invalid base64: {}", e)))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|_| ApiAuthError::MalformedCredentials("not valid UTF-8".to_string()))?;

    let (username, password) = decoded
        .split_once(':')
        .ok_or_else(|| ApiAuthError::MalformedCredentials("missing ':' separator".to_string()))?;

    if username.is_empty() {
        return Err(ApiAuthError::MalformedCredentials("empty username".to_string()));
    }

    Ok(BasicCredentials {
        username: username.to_string(),
        password: password.to_string(),
    })
}

// ========================================
// Tests
// ========================================
