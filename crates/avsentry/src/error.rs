//! Error types for avsentry.
//!
//! Only connectivity failures are fatal to a run; everything else is absorbed
//! into the remediation loop's decision inputs and surfaces through log lines
//! and the event/email side effects.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SentryError {
    #[error("serial device '{0}' is not visible as an available serial port")]
    DeviceNotFound(String),

    #[error("switcher on '{0}' is not responding to serial communication")]
    Handshake(String),

    #[error("no candidate serial ports found for auto-discovery")]
    NoPortDiscovered,

    #[error("none of the {0} candidate serial ports acknowledged the firmware handshake")]
    NoPortAcknowledged(usize),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SentryError {
    /// Process exit code for a run aborted by this error.
    pub fn exit_code(&self) -> i32 {
        // Every fatal path is a connectivity/handshake failure.
        1
    }
}
