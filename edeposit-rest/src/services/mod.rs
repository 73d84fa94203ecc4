//! Submission pipeline services

pub mod coordinator;
pub mod issuer;
pub mod normalizer;

pub use coordinator::{SubmissionCoordinator, Upload};
pub use issuer::issue;
pub use normalizer::{normalize, parse_raw_metadata};
