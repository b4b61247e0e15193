//! License issuance, hardware binding and verification for hwlock.
//!
//! This crate handles:
//! - Token generation and SHA-256 digests (raw tokens are never stored)
//! - License records and their persistence (SQLite or JSON file)
//! - The lifecycle engine: issue, verify, activate, unbind, toggle, remove
//! - Wire types shared by the server and its clients
//! - Hardware ids for client applications
//!
//! # Design Principles
//!
//! - **One-time binding**: the first successful activation claims a license
//!   for one HWID until an administrator unbinds it
//! - **Read-only verification**: verify never changes state
//! - **Per-record serialization**: concurrent first claims on one token are
//!   linearized by the store, exactly one wins
//! - **Kill switch**: an inactive license never verifies

pub mod api;
mod device;
mod engine;
mod error;
mod hasher;
mod record;
pub mod store;

#[cfg(feature = "online")]
mod client;

pub use device::HardwareId;
pub use engine::{
    evaluate, ActivateStatus, Activation, EngineConfig, IssuedLicense, LicenseEngine,
    Verification, VerifyStatus, DEFAULT_DURATION_DAYS,
};
pub use error::{LicenseError, LicenseResult};
pub use hasher::{digest, generate_token, DIGEST_LEN, TOKEN_ENTROPY_BYTES};
pub use record::{Expiry, LicenseId, LicenseRecord, LicenseState, MAX_FIELD_LEN};
pub use store::{open_store, JsonFileLicenseStore, LicenseStore, SqliteLicenseStore, StoreConfig};

#[cfg(feature = "online")]
pub use client::LicenseClient;
