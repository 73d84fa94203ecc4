//! HTTP API handlers

pub mod auth;
pub mod health;
pub mod structures;
pub mod submit;
pub mod track;

pub use auth::{basic_auth_middleware, AuthError, AuthenticatedUser};
pub use health::health_routes;
pub use structures::structure_routes;
pub use submit::submit_publication;
pub use track::{track_publication, track_publications};
