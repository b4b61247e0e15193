//! Token generation and one-way digests.
//!
//! Raw license tokens are handed to the customer once and never stored. The
//! store only ever sees the SHA-256 digest, hex-encoded.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Length of a hex-encoded token digest.
pub const DIGEST_LEN: usize = 64;

/// Number of random bytes in a generated token.
pub const TOKEN_ENTROPY_BYTES: usize = 16;

/// Computes the SHA-256 hex digest of a raw token.
///
/// Surrounding whitespace is ignored so that pasted keys hash the same as
/// the originals.
#[must_use]
pub fn digest(raw_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_token.trim().as_bytes());
    hex::encode(hasher.finalize())
}

/// Generates a fresh raw token of the form `PREFIX_<32 uppercase hex>`.
///
/// Randomness comes from the operating system CSPRNG.
#[must_use]
pub fn generate_token(prefix: &str) -> String {
    let mut bytes = [0u8; TOKEN_ENTROPY_BYTES];
    OsRng.fill_bytes(&mut bytes);
    let body = hex::encode_upper(bytes);
    if prefix.is_empty() {
        body
    } else {
        format!("{prefix}_{body}")
    }
}

/// Returns a short, log-safe prefix of a digest.
pub(crate) fn short(digest: &str) -> &str {
    digest.get(..12).unwrap_or(digest)
}
