//! JSON request and response bodies exchanged with the license server.
//!
//! Shared by the server, the admin CLI and the online client so the three
//! cannot drift apart.

use crate::engine::{ActivateStatus, LicenseEngine, VerifyStatus};
use crate::error::{LicenseError, LicenseResult};
use crate::record::{Expiry, LicenseId, LicenseRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display format for dates in admin output.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Header carrying the admin key.
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Formats a timestamp for admin display.
#[must_use]
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format(DATE_FORMAT).to_string()
}

/// `POST /api/v1/admin/issue`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Issue a license that never expires.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub perpetual: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl IssueRequest {
    /// Resolves the requested expiry. At most one of `duration_days`,
    /// `expires_at` and `perpetual` may be given; none means the default.
    pub fn expiry(&self, default_days: u32) -> LicenseResult<Expiry> {
        match (self.duration_days, self.expires_at, self.perpetual) {
            (None, None, false) => Ok(Expiry::Days(default_days)),
            (Some(days), None, false) => Ok(Expiry::Days(days)),
            (None, Some(at), false) => Ok(Expiry::At(at)),
            (None, None, true) => Ok(Expiry::Never),
            _ => Err(LicenseError::Validation(
                "give only one of duration_days, expires_at or perpetual".into(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueResponse {
    pub success: bool,
    pub id: LicenseId,
    pub license_key: String,
    /// `DD-MM-YYYY`, or `None` for perpetual licenses.
    pub expiry_date: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Addresses a license either by id or by its raw key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LicenseRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_key: Option<String>,
}

impl LicenseRef {
    #[must_use]
    pub fn by_key(key: impl Into<String>) -> Self {
        Self {
            id: None,
            license_key: Some(key.into()),
        }
    }

    #[must_use]
    pub fn by_id(id: LicenseId) -> Self {
        Self {
            id: Some(id.to_string()),
            license_key: None,
        }
    }

    /// Resolves to a license id. The id wins when both are present.
    pub fn resolve(&self, engine: &LicenseEngine) -> LicenseResult<LicenseId> {
        if let Some(id) = self.id.as_deref().filter(|s| !s.trim().is_empty()) {
            return LicenseId::parse(id)
                .map_err(|e| LicenseError::Validation(format!("invalid license id: {e}")));
        }
        match self.license_key.as_deref() {
            Some(key) if !key.trim().is_empty() => engine.resolve(key),
            _ => Err(LicenseError::Validation(
                "id or license_key is required".into(),
            )),
        }
    }
}

/// `POST /api/v1/admin/set_active`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SetActiveRequest {
    #[serde(flatten)]
    pub target: LicenseRef,
    pub active: Option<bool>,
}

/// Generic admin reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    pub success: bool,
    pub message: String,
}

impl ActionResponse {
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// One row of the admin listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseView {
    pub id: LicenseId,
    /// Raw keys are never retrievable after issuance, so the id stands in.
    pub key: String,
    pub status: String,
    pub hwid: Option<String>,
    pub duration: String,
    pub created: String,
    pub expires: Option<String>,
    pub description: Option<String>,
    pub active: bool,
}

impl LicenseView {
    /// Builds the display row for `record` as seen at `now`.
    #[must_use]
    pub fn from_record(record: &LicenseRecord, now: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            key: record.id.to_string(),
            status: record.state_at(now).to_string(),
            hwid: record.bound_hwid.clone(),
            duration: record
                .duration_days()
                .map_or_else(|| "perpetual".to_string(), |d| format!("{d} days")),
            created: format_date(record.created_at),
            expires: record.expires_at.map(format_date),
            description: record.description.clone(),
            active: record.active,
        }
    }
}

/// `GET /api/v1/admin/list`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub success: bool,
    pub licenses: Vec<LicenseView>,
}

/// Body of `POST /api/v1/verify` and `POST /api/v1/activate`.
///
/// `license_key` is accepted in place of `token`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientRequest {
    #[serde(default, alias = "license_key")]
    pub token: Option<String>,
    #[serde(default)]
    pub hwid: Option<String>,
}

impl ClientRequest {
    #[must_use]
    pub fn new(token: impl Into<String>, hwid: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            hwid: Some(hwid.into()),
        }
    }

    /// Returns `(token, hwid)`, rejecting missing or blank fields.
    pub fn fields(&self) -> LicenseResult<(&str, &str)> {
        let token = present("token", self.token.as_deref())?;
        let hwid = present("hwid", self.hwid.as_deref())?;
        Ok((token, hwid))
    }
}

fn present<'a>(field: &str, value: Option<&'a str>) -> LicenseResult<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(LicenseError::Validation(format!("{field} is required"))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub status: VerifyStatus,
    pub message: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivateResponse {
    pub status: ActivateStatus,
    pub message: String,
    pub expiry_date: Option<DateTime<Utc>>,
}

/// Error body returned to license clients for malformed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientErrorResponse {
    pub status: String,
    pub message: String,
}
