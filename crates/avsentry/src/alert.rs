//! AlertDispatcher - event reports and deduplicated email alerts.
//!
//! Every distinct failure produces an event-report entry; email is gated by
//! the per-category mute flag so at most one message is outstanding per
//! category until something explicitly clears it.

use chrono::Local;
use std::process::Command;
use tracing::{info, warn};

use crate::config::AlertConfig;
use crate::mute::{MuteState, MuteStore};
use crate::signal::ChannelCheck;
use crate::transport::SideEffects;

pub struct AlertDispatcher<'a> {
    side_effects: &'a dyn SideEffects,
    mute: &'a dyn MuteStore,
    config: &'a AlertConfig,
    hostname: String,
    notify: bool,
    force: bool,
}

impl<'a> AlertDispatcher<'a> {
    pub fn new(
        side_effects: &'a dyn SideEffects,
        mute: &'a dyn MuteStore,
        config: &'a AlertConfig,
        hostname: String,
        notify: bool,
        force: bool,
    ) -> Self {
        Self {
            side_effects,
            mute,
            config,
            hostname,
            notify,
            force,
        }
    }

    fn subject(&self) -> String {
        format!("{} - {}", self.hostname, self.config.subject_suffix)
    }

    /// Record an event report. Operational telemetry is never deduplicated.
    pub fn report(&self, message: &str) {
        let argv = vec![
            self.config.event_program.clone(),
            "-s".to_string(),
            self.subject(),
            "-t".to_string(),
            self.config.event_tag.clone(),
            "-m".to_string(),
            message.to_string(),
        ];
        if let Err(e) = self.side_effects.run(&argv) {
            warn!("Event report failed: {:#}", e);
        }
    }

    /// Send an email alert unless the category is muted. Sending mutes the
    /// category; `force` bypasses the gate but still (re)mutes on send.
    pub fn alert(&self, message: &str, category: &str) {
        if !self.notify {
            info!("Not alerting");
            return;
        }
        if self.mute.status(category) == MuteState::Unmuted || self.force {
            let argv = vec![
                self.config.email_program.clone(),
                "-s".to_string(),
                self.subject(),
                "-m".to_string(),
                message.to_string(),
            ];
            if let Err(e) = self.side_effects.run(&argv) {
                warn!("Email alert failed: {:#}", e);
            }
            self.mute.mute(category);
            info!("Alert sent");
        } else {
            info!("Alerts muted");
        }
    }
}

/// Best-effort hostname for alert subjects.
pub fn hostname() -> String {
    Command::new("hostname")
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|h| !h.is_empty())
        .unwrap_or_else(|| "unknown-host".to_string())
}

/// Compose a self-describing issue message: timestamp, detail, and the
/// expected/measured grids so the alert needs no log correlation.
pub fn issue_message(detail: &str, checks: &[ChannelCheck]) -> String {
    let expected: Vec<String> = checks
        .iter()
        .map(|c| format!("{}='{}'", c.channel.label(), c.expected.as_deref().unwrap_or("")))
        .collect();
    let measured: Vec<String> = checks
        .iter()
        .map(|c| format!("{}='{}'", c.channel.label(), c.measured))
        .collect();
    format!(
        "Issue time: {}  -  {} Expected signal: [{}] || Measured signal: [{}]",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        detail,
        expected.join(", "),
        measured.join(", ")
    )
}

/// Compose a connectivity-failure message (no grid available yet).
pub fn connectivity_message(detail: &str) -> String {
    format!(
        "Issue time: {}  -  {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        detail
    )
}
