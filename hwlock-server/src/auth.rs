//! Admin authentication.
//!
//! Accepts either an `X-Admin-Key` header or HTTP basic auth whose password is
//! the admin key. Both sides are hashed to equal length and compared in
//! constant time.

use crate::config::AdminCredentials;
use crate::error::ApiError;
use crate::AppState;
use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hwlock_license::api::ADMIN_KEY_HEADER;
use hwlock_license::LicenseError;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::warn;

/// Compares the exact bytes of two secrets; no trimming or normalization.
fn secret_eq(presented: &str, expected: &str) -> bool {
    let presented = Sha256::digest(presented.as_bytes());
    let expected = Sha256::digest(expected.as_bytes());
    bool::from(presented.as_slice().ct_eq(expected.as_slice()))
}

/// Extracts `(user, password)` from a basic `Authorization` header.
fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let encoded = value.strip_prefix("Basic ")?;
    let decoded = BASE64.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;
    Some((user.to_string(), password.to_string()))
}

impl AdminCredentials {
    /// Returns true if the request headers carry a valid admin credential.
    #[must_use]
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        if let Some(key) = headers.get(ADMIN_KEY_HEADER).and_then(|v| v.to_str().ok()) {
            return secret_eq(key, &self.key);
        }
        match basic_credentials(headers) {
            Some((user, password)) => {
                // Both comparisons always run.
                let user_ok = secret_eq(&user, &self.user);
                let key_ok = secret_eq(&password, &self.key);
                user_ok & key_ok
            }
            None => false,
        }
    }
}

/// Middleware guarding every admin route.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.admin.authorize(request.headers()) {
        next.run(request).await
    } else {
        warn!("rejected unauthenticated admin request to {}", request.uri().path());
        ApiError::from(LicenseError::Unauthorized).into_response()
    }
}
