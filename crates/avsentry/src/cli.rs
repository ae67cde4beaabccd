//! CLI - command-line argument parsing.
//!
//! Keeps argument parsing separate from execution logic.

use clap::Parser;
use std::path::PathBuf;

use crate::command::InputMode;
use crate::engine::Expectations;

/// Signal monitor and automated remediation for serial-attached AV switchers
#[derive(Debug, Parser)]
#[command(name = "avsentry")]
#[command(about = "Watch an AV switcher for signal issues and fix them", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Serial device connected to the switcher (auto-discovered when omitted)
    #[arg(long)]
    pub device: Option<String>,

    /// Print all current signal info and exit, bypassing the main loop
    #[arg(long)]
    pub interrogate: bool,

    /// Emit interrogation results as JSON
    #[arg(long, requires = "interrogate")]
    pub json: bool,

    /// Expected substring of the RX0 status reply
    #[arg(long)]
    pub rx0: Option<String>,

    /// Expected substring of the RX1 status reply
    #[arg(long)]
    pub rx1: Option<String>,

    /// Expected substring of the TX0 status reply
    #[arg(long)]
    pub tx0: Option<String>,

    /// Expected substring of the TX1 status reply
    #[arg(long)]
    pub tx1: Option<String>,

    /// Expected input routing mode
    #[arg(long, value_enum)]
    pub input: Option<InputMode>,

    /// Attempt remediation when mismatches are discovered
    #[arg(long)]
    pub fix: bool,

    /// Perform a managed shutdown if max fix attempts fail; the reboot mute
    /// flag then stops further reboots until the issue resolves
    #[arg(long)]
    pub reboot: bool,

    /// Email support about bad states; the alert mute flag then stops
    /// further emails until the issue resolves
    #[arg(long)]
    pub notify: bool,

    /// If an alert is needed, ignore the mute state and send it regardless
    #[arg(long)]
    pub force: bool,

    /// Number of attempts to fix an issue before standing down
    #[arg(long, default_value_t = 3)]
    pub tries: u32,

    /// Print debug output on the console
    #[arg(long)]
    pub debug: bool,

    /// Append log output to this file
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Configuration file path
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Channel expectations, with empty strings treated as unconfigured.
    pub fn expectations(&self) -> Expectations {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());
        Expectations {
            rx0: non_empty(&self.rx0),
            rx1: non_empty(&self.rx1),
            tx0: non_empty(&self.tx0),
            tx1: non_empty(&self.tx1),
            input: self.input,
        }
    }
}
