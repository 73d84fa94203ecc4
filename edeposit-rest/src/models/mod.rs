//! Data model for deposits

pub mod artifact;
pub mod metadata;
pub mod status;
pub mod tracking_id;

pub use artifact::CachedArtifact;
pub use metadata::{
    CanonicalMetadata, FieldKind, FieldSpec, FIELD_MAP, FILENAME_FIELD, FORMATS, LIBRARIES_FIELD,
    TRACKING_ID_FIELD,
};
pub use status::{StateTransition, StatusRecord, SubmissionState};
pub use tracking_id::TrackingId;
