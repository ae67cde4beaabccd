//! FirmwareGate - reachability and remediation-capability detection.
//!
//! Older firmware lacks a safe programmatic power-cycle path. The gate runs
//! once per invocation, before any remediation attempt, and its result is
//! immutable for the run.

use tracing::{debug, error, warn};

use crate::command::DeviceCommand;
use crate::probe::DeviceProbe;

/// Marker substring every firmware-version reply carries.
const FIRMWARE_MARKER: &str = "FW";

/// Prefix ahead of the dotted version components.
const VERSION_PREFIX: &str = "FW: ";

/// Minimum version (both components) for the programmatic power-cycle path.
const POWER_CYCLE_MIN_VERSION: f64 = 2.50;

#[derive(Debug, Clone, Copy)]
pub struct FirmwareCapability {
    pub reachable: bool,
    pub reboot_capable: bool,
}

impl FirmwareCapability {
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            reboot_capable: false,
        }
    }
}

/// Probe the firmware version and derive what this run may do.
///
/// Unreachable is a hard stop for the caller; a malformed version string is
/// not - it only degrades `reboot_capable` to false.
pub fn check(probe: &DeviceProbe) -> FirmwareCapability {
    let out = probe.probe(DeviceCommand::GetVersion);
    if out.transport_failed() || !out.stdout.contains(FIRMWARE_MARKER) {
        error!("Switcher is not responding to serial communication");
        return FirmwareCapability::unreachable();
    }

    debug!("Parsing firmware info: {}", out.stdout);
    FirmwareCapability {
        reachable: true,
        reboot_capable: parse_reboot_capable(&out.stdout),
    }
}

/// Parse "FW: a.b.c.d" into two two-part versions a.b and c.d, and require
/// both at or above the capability threshold.
fn parse_reboot_capable(reply: &str) -> bool {
    let Some(version) = reply.split(VERSION_PREFIX).nth(1) else {
        warn!("Failed to parse firmware version from '{}'", reply.trim());
        return false;
    };

    let parts: Vec<&str> = version.trim().split('.').collect();
    if parts.len() != 4 {
        warn!("Unexpected firmware version layout: '{}'", version.trim());
        return false;
    }

    let first = format!("{}.{}", parts[0], parts[1]).parse::<f64>();
    let second = format!("{}.{}", parts[2], parts[3]).parse::<f64>();
    match (first, second) {
        (Ok(v1), Ok(v2)) => {
            debug!("Parsed versions - {} - {}", v1, v2);
            v1 >= POWER_CYCLE_MIN_VERSION && v2 >= POWER_CYCLE_MIN_VERSION
        }
        _ => {
            warn!("Failed to parse firmware version numbers: '{}'", version.trim());
            false
        }
    }
}
