//! The persisted license record and its identifiers.

use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Maximum length of a hardware id or description.
pub const MAX_FIELD_LEN: usize = 255;

/// Unique identifier for a license record.
/// Uses UUID v7 which embeds a timestamp for natural ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseId(Uuid);

impl LicenseId {
    /// Creates a new license ID with the current timestamp.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates a license ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a license ID from a string.
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for LicenseId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LicenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for LicenseId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// How long a newly issued license stays valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Expires the given number of days after issuance.
    Days(u32),
    /// Expires at a fixed instant.
    At(DateTime<Utc>),
    /// Never expires.
    Never,
}

impl Expiry {
    /// Resolves the expiry relative to the issuance time.
    ///
    /// Fails with `Validation` when a day count lands past the representable
    /// calendar range.
    pub fn resolve(&self, issued_at: DateTime<Utc>) -> LicenseResult<Option<DateTime<Utc>>> {
        match self {
            Self::Days(days) => Duration::try_days(i64::from(*days))
                .and_then(|span| issued_at.checked_add_signed(span))
                .map(Some)
                .ok_or_else(|| LicenseError::Validation("duration_days out of range".into())),
            Self::At(at) => Ok(Some(*at)),
            Self::Never => Ok(None),
        }
    }
}

/// Administrative view of a record's state, derived on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LicenseState {
    /// Issued, not yet claimed by any device.
    Unbound,
    /// Claimed by a device.
    Bound,
    /// Past its expiry date.
    Expired,
    /// Disabled by an administrator.
    Inactive,
}

impl LicenseState {
    /// Returns the wire/display name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unbound => "unbound",
            Self::Bound => "bound",
            Self::Expired => "expired",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for LicenseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One issued license.
///
/// `used` is true exactly when `bound_hwid` is set; both are only changed
/// through [`LicenseRecord::bind`] and [`LicenseRecord::unbind`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Stable identifier assigned by the store.
    pub id: LicenseId,
    /// SHA-256 hex digest of the raw token.
    pub token_digest: String,
    /// Free-text administrative label.
    pub description: Option<String>,
    /// Hardware id of the device that claimed the license.
    pub bound_hwid: Option<String>,
    /// Issuance time.
    pub created_at: DateTime<Utc>,
    /// Whether a device has claimed the license.
    pub used: bool,
    /// Administrative kill switch.
    pub active: bool,
    /// Expiry instant, or `None` for perpetual licenses.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the current binding happened.
    #[serde(default)]
    pub activated_at: Option<DateTime<Utc>>,
}

impl LicenseRecord {
    /// Creates a fresh, unbound, active record.
    #[must_use]
    pub fn new(
        token_digest: String,
        description: Option<String>,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: LicenseId::new(),
            token_digest,
            description,
            bound_hwid: None,
            created_at,
            used: false,
            active: true,
            expires_at,
            activated_at: None,
        }
    }

    /// Returns true if the record is past its expiry at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| now > exp)
    }

    /// Returns true if `hwid` is the device this license is bound to.
    #[must_use]
    pub fn is_bound_to(&self, hwid: &str) -> bool {
        self.used && self.bound_hwid.as_deref() == Some(hwid)
    }

    /// Claims the license for `hwid`.
    pub fn bind(&mut self, hwid: &str, now: DateTime<Utc>) {
        self.bound_hwid = Some(hwid.to_string());
        self.used = true;
        self.activated_at = Some(now);
    }

    /// Releases the binding.
    pub fn unbind(&mut self) {
        self.bound_hwid = None;
        self.used = false;
        self.activated_at = None;
    }

    /// Derives the administrative state at `now`. Inactive wins over expired,
    /// expired wins over binding.
    #[must_use]
    pub fn state_at(&self, now: DateTime<Utc>) -> LicenseState {
        if !self.active {
            LicenseState::Inactive
        } else if self.is_expired_at(now) {
            LicenseState::Expired
        } else if self.used {
            LicenseState::Bound
        } else {
            LicenseState::Unbound
        }
    }

    /// Whole days between issuance and expiry, or `None` for perpetual.
    #[must_use]
    pub fn duration_days(&self) -> Option<i64> {
        self.expires_at
            .map(|exp| (exp - self.created_at).num_days())
    }
}
