//! HTTP client for applications that check their own license.

use crate::api::{ActivateResponse, ClientErrorResponse, ClientRequest, VerifyResponse};
use crate::device::HardwareId;
use crate::engine::{ActivateStatus, VerifyStatus};
use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Talks to the client endpoints of a license server.
pub struct LicenseClient {
    base_url: String,
    client: Client,
}

impl LicenseClient {
    /// Creates a client for the server at `base_url` (e.g. `https://licenses.example.com`).
    pub fn new(base_url: impl Into<String>) -> LicenseResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| LicenseError::Network(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: &ClientRequest) -> LicenseResult<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| LicenseError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::BAD_REQUEST {
            let err: ClientErrorResponse = resp
                .json()
                .await
                .map_err(|e| LicenseError::Network(e.to_string()))?;
            return Err(LicenseError::Validation(err.message));
        }
        if !status.is_success() {
            return Err(LicenseError::Network(format!("{url} returned {status}")));
        }
        resp.json()
            .await
            .map_err(|e| LicenseError::Network(format!("invalid response from {url}: {e}")))
    }

    /// Checks the license without binding it.
    pub async fn verify(&self, token: &str, hwid: &HardwareId) -> LicenseResult<VerifyResponse> {
        self.post("/api/v1/verify", &ClientRequest::new(token, hwid.as_str()))
            .await
    }

    /// Binds the license to this device, or reports why it cannot be bound.
    pub async fn activate(&self, token: &str, hwid: &HardwareId) -> LicenseResult<ActivateResponse> {
        self.post("/api/v1/activate", &ClientRequest::new(token, hwid.as_str()))
            .await
    }

    /// Makes sure this device holds the license, activating it on first use.
    ///
    /// Returns the expiry on success.
    ///
    /// # Errors
    ///
    /// `Expired`, `Inactive` or `HwidMismatch` when the license can't be used
    /// here, `Network` when the server can't be reached.
    pub async fn ensure_licensed(
        &self,
        token: &str,
        hwid: &HardwareId,
    ) -> LicenseResult<Option<DateTime<Utc>>> {
        let verified = self.verify(token, hwid).await?;
        debug!("license verify -> {}", verified.status);
        match verified.status {
            VerifyStatus::Valid => Ok(verified.expires_at),
            VerifyStatus::ValidUnbound => {
                let activated = self.activate(token, hwid).await?;
                match activated.status {
                    ActivateStatus::Bound | ActivateStatus::AlreadyBoundHere => {
                        Ok(activated.expiry_date)
                    }
                    ActivateStatus::HwidMismatch => Err(LicenseError::HwidMismatch),
                    ActivateStatus::Expired => Err(expired(activated.expiry_date)),
                    ActivateStatus::InvalidOrInactive => Err(LicenseError::Inactive),
                }
            }
            VerifyStatus::Expired => Err(expired(verified.expires_at)),
            VerifyStatus::HwidMismatch => Err(LicenseError::HwidMismatch),
            VerifyStatus::InvalidOrInactive => Err(LicenseError::Inactive),
        }
    }
}

fn expired(at: Option<DateTime<Utc>>) -> LicenseError {
    LicenseError::Expired(at.map_or_else(|| "unknown date".to_string(), |d| d.to_rfc3339()))
}
