//! Symbolic command vocabulary for the switcher.
//!
//! A closed set of command kinds, each mapping 1:1 to a protocol string owned
//! by the transport helper. The core never handles the wire grammar itself;
//! it hands the helper a symbolic name and matches substrings in the reply.

use clap::ValueEnum;
use std::fmt;

/// Input routing mode of the switcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum InputMode {
    Bot,
    Top,
    Thru,
    Swap,
}

impl InputMode {
    /// Substring the switcher reports for this mode in input-status replies.
    pub fn reported(&self) -> &'static str {
        match self {
            InputMode::Bot => "bot",
            InputMode::Top => "top",
            InputMode::Thru => "thru",
            InputMode::Swap => "swap",
        }
    }
}

impl fmt::Display for InputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reported())
    }
}

/// Commands the core can ask the transport helper to issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceCommand {
    GetVersion,
    GetStatusRx0,
    GetStatusRx1,
    GetStatusTx0,
    GetStatusTx1,
    GetTx0Sink,
    GetTx1Sink,
    GetScale,
    GetInput,
    SetInput(InputMode),
    SendHotplug,
    /// Power-cycles the switcher itself. Distinct from the managed reboot of
    /// the host, which never goes through the serial channel.
    PowerCycle,
}

impl DeviceCommand {
    /// Symbolic name understood by the transport helper.
    pub fn name(&self) -> &'static str {
        match self {
            DeviceCommand::GetVersion => "getVersion",
            DeviceCommand::GetStatusRx0 => "getStatusRx0",
            DeviceCommand::GetStatusRx1 => "getStatusRx1",
            DeviceCommand::GetStatusTx0 => "getStatusTx0",
            DeviceCommand::GetStatusTx1 => "getStatusTx1",
            DeviceCommand::GetTx0Sink => "getTx0Sink",
            DeviceCommand::GetTx1Sink => "getTx1Sink",
            DeviceCommand::GetScale => "getScale",
            DeviceCommand::GetInput => "getInput",
            DeviceCommand::SetInput(InputMode::Bot) => "setInputBot",
            DeviceCommand::SetInput(InputMode::Top) => "setInputTop",
            DeviceCommand::SetInput(InputMode::Thru) => "setInputThru",
            DeviceCommand::SetInput(InputMode::Swap) => "setInputSwap",
            DeviceCommand::SendHotplug => "sendHotplug",
            DeviceCommand::PowerCycle => "powerCycle",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_input_names_follow_mode() {
        assert_eq!(DeviceCommand::SetInput(InputMode::Top).name(), "setInputTop");
        assert_eq!(DeviceCommand::SetInput(InputMode::Bot).name(), "setInputBot");
        assert_eq!(DeviceCommand::SetInput(InputMode::Thru).name(), "setInputThru");
        assert_eq!(DeviceCommand::SetInput(InputMode::Swap).name(), "setInputSwap");
    }

    #[test]
    fn test_reported_substrings() {
        assert_eq!(InputMode::Top.reported(), "top");
        assert_eq!(InputMode::Swap.reported(), "swap");
    }
}
