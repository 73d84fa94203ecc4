//! HTTP Basic authentication middleware
//!
//! Consults the user directory once per request, before any handler runs.
//! Health and reference-structure routes are mounted outside this layer.

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use edeposit_common::api::{parse_basic_auth, ApiAuthError};
use serde_json::json;
use tracing::{debug, error, warn};

use crate::AppState;

/// Value of the `WWW-Authenticate` challenge
pub const BASIC_REALM: &str = r#"Basic realm="edeposit""#;

/// Username of the authenticated caller, stored in request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.0
    }
}

pub async fn basic_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::Rejected(ApiAuthError::MissingCredentials))?
        .to_str()
        .map_err(|_| {
            AuthError::Rejected(ApiAuthError::MalformedCredentials(
                "non-ASCII header".to_string(),
            ))
        })?;

    let credentials = parse_basic_auth(header_value).map_err(AuthError::Rejected)?;

    let valid = state
        .users
        .is_valid_user(&credentials.username, &credentials.password)
        .await
        .map_err(|e| AuthError::Backend(e.to_string()))?;

    if !valid {
        warn!(username = %credentials.username, "Authentication failed");
        return Err(AuthError::Rejected(ApiAuthError::InvalidCredentials));
    }

    debug!(username = %credentials.username, "Authenticated");
    request
        .extensions_mut()
        .insert(AuthenticatedUser(credentials.username));

    Ok(next.run(request).await)
}

#[derive(Debug)]
pub enum AuthError {
    /// Credentials missing, malformed or wrong (401)
    Rejected(ApiAuthError),
    /// User directory unavailable (500)
    Backend(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Rejected(reason) => {
                let body = Json(json!({
                    "error": {
                        "code": "UNAUTHORIZED",
                        "message": reason.to_string(),
                    }
                }));
                let mut response = (StatusCode::UNAUTHORIZED, body).into_response();
                response.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static(BASIC_REALM),
                );
                response
            }
            AuthError::Backend(msg) => {
                error!(error = %msg, "User directory lookup failed");
                let body = Json(json!({
                    "error": {
                        "code": "STORAGE_ERROR",
                        "message": format!("Authentication backend error: {}", msg),
                    }
                }));
                (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
            }
        }
    }
}
