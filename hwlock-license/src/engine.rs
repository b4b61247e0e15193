//! License lifecycle: issuance, binding, verification and administration.
//!
//! Verification outcomes are evaluated in a fixed order:
//!
//! 1. unknown token or disabled license → `invalid_or_inactive`
//! 2. past `expires_at` → `expired`
//! 3. not yet claimed → `valid_unbound` (verify) / bind (activate)
//! 4. claimed by the presented hwid → `valid` / `already_bound_here`
//! 5. claimed by another hwid → `hwid_mismatch`
//!
//! Verification never writes. Activation performs its decision inside a
//! single [`LicenseStore::update`] so that concurrent first claims on the same
//! token are linearized by the store.

use crate::error::{LicenseError, LicenseResult};
use crate::hasher::{digest, generate_token, short};
use crate::record::{Expiry, LicenseId, LicenseRecord, MAX_FIELD_LEN};
use crate::store::LicenseStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Default license lifetime when issuance does not specify one.
pub const DEFAULT_DURATION_DAYS: u32 = 30;

/// Engine tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Prefix of generated tokens (`PREFIX_<hex>`).
    pub token_prefix: String,
    /// Lifetime used when an issuance request gives none.
    pub default_duration_days: u32,
    /// How many fresh tokens to try before giving up on digest collisions.
    pub max_generation_attempts: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            token_prefix: "LIC".to_string(),
            default_duration_days: DEFAULT_DURATION_DAYS,
            max_generation_attempts: 3,
        }
    }
}

/// Result of a read-only verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyStatus {
    /// Bound to the presented hwid.
    Valid,
    /// Valid but not yet claimed; the client must activate first.
    ValidUnbound,
    /// Past its expiry date.
    Expired,
    /// Unknown token or disabled license.
    InvalidOrInactive,
    /// Bound to another device.
    HwidMismatch,
}

impl VerifyStatus {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::ValidUnbound => "valid_unbound",
            Self::Expired => "expired",
            Self::InvalidOrInactive => "invalid_or_inactive",
            Self::HwidMismatch => "hwid_mismatch",
        }
    }

    /// Returns a human-readable explanation.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Valid => "license is valid",
            Self::ValidUnbound => "license is valid but not yet activated",
            Self::Expired => "license has expired",
            Self::InvalidOrInactive => "license is invalid or inactive",
            Self::HwidMismatch => "license is already in use on another device",
        }
    }

    /// Returns true only for a license bound to the caller.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

impl fmt::Display for VerifyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of an activation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivateStatus {
    /// This call claimed the license.
    Bound,
    /// The license was already claimed by the same hwid.
    AlreadyBoundHere,
    /// The license is claimed by another device.
    HwidMismatch,
    /// Past its expiry date.
    Expired,
    /// Unknown token or disabled license.
    InvalidOrInactive,
}

impl ActivateStatus {
    /// Returns the wire name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bound => "bound",
            Self::AlreadyBoundHere => "already_bound_here",
            Self::HwidMismatch => "hwid_mismatch",
            Self::Expired => "expired",
            Self::InvalidOrInactive => "invalid_or_inactive",
        }
    }

    /// Returns a human-readable explanation.
    #[must_use]
    pub fn message(&self) -> &'static str {
        match self {
            Self::Bound => "activation successful",
            Self::AlreadyBoundHere => "license is already active on this device",
            Self::HwidMismatch => "license is already in use on another device",
            Self::Expired => "license has expired",
            Self::InvalidOrInactive => "license is invalid or inactive",
        }
    }

    /// Returns true if the caller now holds the license.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Bound | Self::AlreadyBoundHere)
    }
}

impl fmt::Display for ActivateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verification outcome plus the expiry shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verification {
    pub status: VerifyStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Activation outcome plus the expiry shown to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Activation {
    pub status: ActivateStatus,
    pub expires_at: Option<DateTime<Utc>>,
}

/// A freshly issued license. The raw token is only ever available here.
#[derive(Debug, Clone)]
pub struct IssuedLicense {
    pub token: String,
    pub record: LicenseRecord,
}

/// Evaluates the verification decision table for a record at `now`.
#[must_use]
pub fn evaluate(record: Option<&LicenseRecord>, hwid: &str, now: DateTime<Utc>) -> VerifyStatus {
    match record {
        None => VerifyStatus::InvalidOrInactive,
        Some(r) if !r.active => VerifyStatus::InvalidOrInactive,
        Some(r) if r.is_expired_at(now) => VerifyStatus::Expired,
        Some(r) if !r.used => VerifyStatus::ValidUnbound,
        Some(r) if r.is_bound_to(hwid) => VerifyStatus::Valid,
        Some(_) => VerifyStatus::HwidMismatch,
    }
}

/// Rejections shared by both sides of activation. `None` means the record may
/// be claimed or compared.
fn activation_gate(record: &LicenseRecord, now: DateTime<Utc>) -> Option<ActivateStatus> {
    if !record.active {
        Some(ActivateStatus::InvalidOrInactive)
    } else if record.is_expired_at(now) {
        Some(ActivateStatus::Expired)
    } else {
        None
    }
}

fn require(field: &str, value: &str) -> LicenseResult<()> {
    if value.trim().is_empty() {
        return Err(LicenseError::Validation(format!("{field} is required")));
    }
    if value.len() > MAX_FIELD_LEN {
        return Err(LicenseError::Validation(format!(
            "{field} exceeds {MAX_FIELD_LEN} characters"
        )));
    }
    Ok(())
}

/// The license lifecycle engine.
pub struct LicenseEngine {
    store: Arc<dyn LicenseStore>,
    config: EngineConfig,
}

impl LicenseEngine {
    /// Creates an engine over the given store.
    pub fn new(store: Arc<dyn LicenseStore>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Returns the engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn LicenseStore> {
        &self.store
    }

    /// Issues a new license.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an oversized description or an out-of-range
    /// duration, `GenerationCollision`
    /// if every generated token collided, or the store's error.
    pub fn issue(&self, expiry: Expiry, description: Option<String>) -> LicenseResult<IssuedLicense> {
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(d) = &description {
            require("description", d)?;
        }

        let now = Utc::now();
        let expires_at = expiry.resolve(now)?;

        for attempt in 1..=self.config.max_generation_attempts {
            let token = generate_token(&self.config.token_prefix);
            let record = LicenseRecord::new(digest(&token), description.clone(), now, expires_at);
            match self.store.create(record.clone()) {
                Ok(id) => {
                    info!(
                        "issued license {id} ({}), expires {}",
                        short(&record.token_digest),
                        expires_at.map_or_else(|| "never".to_string(), |e| e.to_rfc3339())
                    );
                    return Ok(IssuedLicense { token, record });
                }
                Err(LicenseError::DuplicateToken) => {
                    warn!("token digest collision on attempt {attempt}, regenerating");
                }
                Err(e) => return Err(e),
            }
        }
        Err(LicenseError::GenerationCollision(self.config.max_generation_attempts))
    }

    /// Issues a license with the configured default duration.
    pub fn issue_default(&self, description: Option<String>) -> LicenseResult<IssuedLicense> {
        self.issue(Expiry::Days(self.config.default_duration_days), description)
    }

    fn lookup(&self, token: &str) -> LicenseResult<Option<LicenseRecord>> {
        match self.store.get_by_digest(&digest(token)) {
            Ok(record) => Ok(Some(record)),
            Err(LicenseError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Checks a token against a hwid without changing anything.
    pub fn verify(&self, token: &str, hwid: &str) -> LicenseResult<Verification> {
        require("token", token)?;
        require("hwid", hwid)?;
        let hwid = hwid.trim();

        let record = self.lookup(token)?;
        let status = evaluate(record.as_ref(), hwid, Utc::now());
        debug!("verify {} -> {status}", short(&digest(token)));
        Ok(Verification {
            status,
            expires_at: record.and_then(|r| r.expires_at),
        })
    }

    /// Claims a license for `hwid`, or reports why it cannot be claimed.
    pub fn activate(&self, token: &str, hwid: &str) -> LicenseResult<Activation> {
        require("token", token)?;
        require("hwid", hwid)?;
        let hwid = hwid.trim();

        let Some(record) = self.lookup(token)? else {
            return Ok(Activation {
                status: ActivateStatus::InvalidOrInactive,
                expires_at: None,
            });
        };

        let now = Utc::now();
        if let Some(status) = activation_gate(&record, now) {
            return Ok(Activation {
                status,
                expires_at: record.expires_at,
            });
        }

        let mut status = ActivateStatus::InvalidOrInactive;
        let updated = self.store.update(record.id, &mut |current: &mut LicenseRecord| {
            if let Some(rejected) = activation_gate(current, now) {
                status = rejected;
                return false;
            }
            if !current.used {
                current.bind(hwid, now);
                status = ActivateStatus::Bound;
                true
            } else if current.is_bound_to(hwid) {
                status = ActivateStatus::AlreadyBoundHere;
                false
            } else {
                status = ActivateStatus::HwidMismatch;
                false
            }
        });

        let updated = match updated {
            Ok(updated) => updated,
            // Deleted between lookup and update.
            Err(LicenseError::NotFound(_)) => {
                return Ok(Activation {
                    status: ActivateStatus::InvalidOrInactive,
                    expires_at: None,
                });
            }
            Err(e) => return Err(e),
        };

        match status {
            ActivateStatus::Bound => info!("license {} bound to a device", updated.id),
            ActivateStatus::HwidMismatch => {
                warn!("license {} activation rejected: bound to another device", updated.id);
            }
            _ => debug!("license {} activation -> {status}", updated.id),
        }
        Ok(Activation {
            status,
            expires_at: updated.expires_at,
        })
    }

    /// Finds the id of the license behind a raw token.
    pub fn resolve(&self, token: &str) -> LicenseResult<LicenseId> {
        require("license_key", token)?;
        self.lookup(token)?
            .map(|r| r.id)
            .ok_or_else(|| LicenseError::NotFound("license key".into()))
    }

    /// Releases a license from its device.
    pub fn unbind(&self, id: LicenseId) -> LicenseResult<LicenseRecord> {
        let record = self.store.update(id, &mut |current: &mut LicenseRecord| {
            if !current.used && current.bound_hwid.is_none() {
                return false;
            }
            current.unbind();
            true
        })?;
        info!("license {id} unbound");
        Ok(record)
    }

    /// Enables or disables a license.
    pub fn set_active(&self, id: LicenseId, active: bool) -> LicenseResult<LicenseRecord> {
        let record = self.store.update(id, &mut |current: &mut LicenseRecord| {
            if current.active == active {
                return false;
            }
            current.active = active;
            true
        })?;
        info!("license {id} {}", if active { "enabled" } else { "disabled" });
        Ok(record)
    }

    /// Deletes a license permanently.
    pub fn remove(&self, id: LicenseId) -> LicenseResult<()> {
        self.store.delete(id)?;
        info!("license {id} removed");
        Ok(())
    }

    /// Returns all licenses, newest first.
    pub fn list(&self) -> LicenseResult<Vec<LicenseRecord>> {
        self.store.list_all()
    }
}
