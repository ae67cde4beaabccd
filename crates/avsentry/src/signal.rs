//! SignalComparator - expected-vs-measured checks per monitored channel.
//!
//! Matching is substring containment, not equality: the switcher's replies
//! carry extra framing around the interesting token. A channel with no
//! configured expectation never blocks success.

use tracing::{error, info};

use crate::command::DeviceCommand;
use crate::probe::DeviceProbe;

/// The monitored channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Rx0,
    Rx1,
    Tx0,
    Tx1,
    Input,
}

impl Channel {
    pub const TRACKED: [Channel; 5] = [
        Channel::Rx0,
        Channel::Rx1,
        Channel::Tx0,
        Channel::Tx1,
        Channel::Input,
    ];

    pub fn status_command(&self) -> DeviceCommand {
        match self {
            Channel::Rx0 => DeviceCommand::GetStatusRx0,
            Channel::Rx1 => DeviceCommand::GetStatusRx1,
            Channel::Tx0 => DeviceCommand::GetStatusTx0,
            Channel::Tx1 => DeviceCommand::GetStatusTx1,
            Channel::Input => DeviceCommand::GetInput,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Rx0 => "RX0",
            Channel::Rx1 => "RX1",
            Channel::Tx0 => "TX0",
            Channel::Tx1 => "TX1",
            Channel::Input => "INPUT",
        }
    }
}

/// Result of one expected-vs-measured comparison. Created fresh each round.
#[derive(Debug, Clone)]
pub struct ChannelCheck {
    pub channel: Channel,
    pub expected: Option<String>,
    pub measured: String,
    pub matched: bool,
    pub probe_error: Option<String>,
}

impl ChannelCheck {
    /// An unconfigured channel is vacuously matched without probing.
    fn vacuous(channel: Channel) -> Self {
        Self {
            channel,
            expected: None,
            measured: String::new(),
            matched: true,
            probe_error: None,
        }
    }
}

pub struct SignalComparator<'a> {
    probe: &'a DeviceProbe<'a>,
}

impl<'a> SignalComparator<'a> {
    pub fn new(probe: &'a DeviceProbe<'a>) -> Self {
        Self { probe }
    }

    /// Compare one channel against its expected substring, if any.
    pub fn compare(&self, channel: Channel, expected: Option<&str>) -> ChannelCheck {
        let Some(expected) = expected.filter(|e| !e.is_empty()) else {
            return ChannelCheck::vacuous(channel);
        };

        let command = channel.status_command();
        let out = self.probe.probe(command);

        if out.transport_failed() {
            // Transport failure aborts this comparison, not the loop.
            error!("Error executing command - {}: {}", command, out.stderr);
            return ChannelCheck {
                channel,
                expected: Some(expected.to_string()),
                measured: out.stdout,
                matched: false,
                probe_error: Some(out.stderr),
            };
        }

        let matched = out.stdout.contains(expected);
        if matched {
            info!("MATCH: {} == {}", command, out.stdout);
        } else {
            info!("MISMATCH: {} == {}", command, out.stdout);
        }

        ChannelCheck {
            channel,
            expected: Some(expected.to_string()),
            measured: out.stdout,
            matched,
            probe_error: None,
        }
    }
}
