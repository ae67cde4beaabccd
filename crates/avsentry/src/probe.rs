//! DeviceProbe - issues symbolic commands and returns raw text responses.
//!
//! Pure pass-through to the transport collaborator; no retries at this layer.
//! A spawn failure is folded into a synthetic transport-failure output so the
//! caller sees a uniform (stdout, stderr, exit code) triple.

use tracing::{debug, warn};

use crate::command::DeviceCommand;
use crate::transport::{CommandOutput, Transport};

pub struct DeviceProbe<'a> {
    transport: &'a dyn Transport,
    port: String,
}

impl<'a> DeviceProbe<'a> {
    pub fn new(transport: &'a dyn Transport, port: impl Into<String>) -> Self {
        Self {
            transport,
            port: port.into(),
        }
    }

    pub fn port(&self) -> &str {
        &self.port
    }

    pub fn probe(&self, command: DeviceCommand) -> CommandOutput {
        debug!("Probing {} on {}", command, self.port);
        match self.transport.execute(&self.port, command) {
            Ok(output) => output,
            Err(e) => {
                warn!("Probe {} could not run: {:#}", command, e);
                CommandOutput::spawn_failure(e)
            }
        }
    }
}
