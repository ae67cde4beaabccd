//! Serial-port auto-discovery.
//!
//! Used when no device path is given: zero candidates is an error, a single
//! candidate is used directly, and with several candidates each one gets a
//! firmware-handshake probe until one acknowledges.

use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::command::DeviceCommand;
use crate::error::SentryError;
use crate::probe::DeviceProbe;
use crate::transport::Transport;

const DEV_DIR: &str = "/dev";

/// Name prefixes that usually indicate a USB serial adapter.
const CANDIDATE_PREFIXES: &[&str] = &["ttyUSB", "ttyACM", "tty.usbserial", "cu.usbserial"];

/// Whether the configured device path exists at all. A missing port is a
/// configuration error, not a transient signal issue.
pub fn port_exists(device: &str) -> bool {
    Path::new(device).exists()
}

/// Auto-discover the switcher's serial port.
pub fn discover_port(transport: &dyn Transport) -> Result<String, SentryError> {
    let candidates = list_candidates(Path::new(DEV_DIR))?;
    debug!("Serial ports available: {:?}", candidates);
    pick_port(transport, candidates)
}

/// Enumerate plausible serial device nodes under `dev_dir`.
fn list_candidates(dev_dir: &Path) -> Result<Vec<String>, SentryError> {
    let mut candidates = Vec::new();
    for entry in fs::read_dir(dev_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if CANDIDATE_PREFIXES.iter().any(|p| name.starts_with(p)) {
            candidates.push(entry.path().to_string_lossy().to_string());
        }
    }
    candidates.sort();
    Ok(candidates)
}

/// Resolve a candidate list to a single port.
fn pick_port(transport: &dyn Transport, candidates: Vec<String>) -> Result<String, SentryError> {
    match candidates.len() {
        0 => Err(SentryError::NoPortDiscovered),
        1 => {
            let port = candidates.into_iter().next().unwrap();
            info!("Auto-discovered serial port {}", port);
            Ok(port)
        }
        n => {
            info!("{} candidate serial ports, probing each for the switcher", n);
            for candidate in &candidates {
                let probe = DeviceProbe::new(transport, candidate.clone());
                let out = probe.probe(DeviceCommand::GetVersion);
                if !out.transport_failed() && out.stdout.contains("FW") {
                    info!("Switcher acknowledged on {}", candidate);
                    return Ok(candidate.clone());
                }
                warn!("No acknowledgement on {}", candidate);
            }
            Err(SentryError::NoPortAcknowledged(n))
        }
    }
}
