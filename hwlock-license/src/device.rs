//! Hardware identifiers for license binding.
//!
//! Client applications present a HWID when activating. This module derives a
//! stable one from the machine so that applications don't have to.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;

/// A stable identifier for the current machine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HardwareId(String);

impl HardwareId {
    /// Derives the hardware id of the current device.
    ///
    /// Combines OS, architecture, hostname and the platform machine id, so it
    /// survives reboots but changes if the machine is replaced.
    #[must_use]
    pub fn detect() -> Self {
        Self::from_components(&device_components())
    }

    /// Derives a hardware id from explicit components.
    #[must_use]
    pub fn from_components<S: AsRef<str>>(components: &[S]) -> Self {
        let combined = components
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("|");

        let mut hasher = Sha256::new();
        hasher.update(combined.as_bytes());
        let hash = hasher.finalize();

        Self(hex::encode_upper(&hash[..16]))
    }

    /// Wraps an externally supplied identifier as-is.
    #[must_use]
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Returns the identifier string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for HardwareId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// OS, arch, hostname and, where available, the platform machine id.
fn device_components() -> Vec<String> {
    let mut parts = vec![
        env::consts::OS.to_string(),
        env::consts::ARCH.to_string(),
        host_name(),
    ];

    if let Some(id) = machine_id() {
        parts.push(id);
    }

    parts
}

fn host_name() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.into_string().ok())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Platform machine id: IOPlatformUUID, /etc/machine-id or the SMBIOS UUID.
fn machine_id() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("ioreg")
            .args(["-rd1", "-c", "IOPlatformExpertDevice"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .find(|l| l.contains("IOPlatformUUID"))
                    .and_then(|l| l.split('"').nth(3))
                    .map(String::from)
            })
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/machine-id")
            .or_else(|_| std::fs::read_to_string("/var/lib/dbus/machine-id"))
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(target_os = "windows")]
    {
        // SMBIOS system UUID
        std::process::Command::new("wmic")
            .args(["csproduct", "get", "uuid"])
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .and_then(|output| {
                output
                    .lines()
                    .map(str::trim)
                    .find(|l| !l.is_empty() && !l.eq_ignore_ascii_case("uuid"))
                    .map(String::from)
            })
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
    {
        None
    }
}
