//! Tracking identifier issuance
//!
//! Identifiers are random UUIDv4 values drawn from the OS-seeded generator,
//! so issuance needs no shared state and never blocks. A collision would
//! surface later as a `Conflict` from the artifact cache.

use crate::models::TrackingId;

/// Issue a fresh tracking identifier
pub fn issue() -> TrackingId {
    TrackingId::new_random()
}
