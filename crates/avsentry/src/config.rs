//! Configuration management for avsentry.
//!
//! Loads settings from /etc/avsentry/config.toml or uses defaults. Settle
//! delays are empirically chosen for specific hardware and therefore live
//! here rather than in the engine.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Config file path
pub const CONFIG_PATH: &str = "/etc/avsentry/config.toml";

/// Collaborator and state locations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Transport helper that owns the serial protocol strings
    #[serde(default = "default_helper")]
    pub helper: String,

    /// Directory holding the per-device mute flag files
    #[serde(default = "default_mute_dir")]
    pub mute_dir: PathBuf,
}

fn default_helper() -> String {
    "/usr/local/libexec/avsentry-serial".to_string()
}

fn default_mute_dir() -> PathBuf {
    PathBuf::from("/var/lib/avsentry")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            helper: default_helper(),
            mute_dir: default_mute_dir(),
        }
    }
}

/// Settle delays applied after remediation actions, in seconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Wait after a hotplug before re-probing
    #[serde(default = "default_hotplug_settle")]
    pub hotplug_settle_secs: u64,

    /// Wait after power-cycling the switcher before re-probing
    #[serde(default = "default_power_cycle_settle")]
    pub power_cycle_settle_secs: u64,

    /// Wait after an input-mode switch before the follow-up hotplug
    #[serde(default = "default_input_switch_settle")]
    pub input_switch_settle_secs: u64,
}

fn default_hotplug_settle() -> u64 {
    15
}

fn default_power_cycle_settle() -> u64 {
    30
}

fn default_input_switch_settle() -> u64 {
    5
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            hotplug_settle_secs: default_hotplug_settle(),
            power_cycle_settle_secs: default_power_cycle_settle(),
            input_switch_settle_secs: default_input_switch_settle(),
        }
    }
}

/// Notification collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertConfig {
    /// Command invoked to send a support email
    #[serde(default = "default_email_program")]
    pub email_program: String,

    /// Command invoked to record an event report
    #[serde(default = "default_event_program")]
    pub event_program: String,

    /// Event category tag passed to the event reporter
    #[serde(default = "default_event_tag")]
    pub event_tag: String,

    /// Subject line suffix; the hostname is prepended at send time
    #[serde(default = "default_subject_suffix")]
    pub subject_suffix: String,
}

fn default_email_program() -> String {
    "/usr/local/libexec/send-support-alert".to_string()
}

fn default_event_program() -> String {
    "/usr/local/libexec/event-report".to_string()
}

fn default_event_tag() -> String {
    "avswitcher".to_string()
}

fn default_subject_suffix() -> String {
    "AV Switcher Signal Check".to_string()
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            email_program: default_email_program(),
            event_program: default_event_program(),
            event_tag: default_event_tag(),
            subject_suffix: default_subject_suffix(),
        }
    }
}

/// Managed-reboot collaborators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebootConfig {
    /// Command invoked with the wake time (HH:MM:SS) to schedule a wake timer
    #[serde(default = "default_wake_program")]
    pub wake_program: String,

    /// Command invoked with "shutdown" to perform the managed shutdown
    #[serde(default = "default_shutdown_program")]
    pub shutdown_program: String,

    /// Minutes from now at which the wake timer fires
    #[serde(default = "default_wake_offset_mins")]
    pub wake_offset_mins: i64,
}

fn default_wake_program() -> String {
    "/usr/local/libexec/schedule-wake".to_string()
}

fn default_shutdown_program() -> String {
    "/usr/local/libexec/power-control".to_string()
}

fn default_wake_offset_mins() -> i64 {
    3
}

impl Default for RebootConfig {
    fn default() -> Self {
        Self {
            wake_program: default_wake_program(),
            shutdown_program: default_shutdown_program(),
            wake_offset_mins: default_wake_offset_mins(),
        }
    }
}

/// Full configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub delays: DelayConfig,

    #[serde(default)]
    pub alerting: AlertConfig,

    #[serde(default)]
    pub reboot: RebootConfig,
}

impl Config {
    /// Load config from the default path, or return defaults
    pub fn load() -> Self {
        Self::load_from_path(Path::new(CONFIG_PATH)).unwrap_or_else(|e| {
            warn!("Config not found, using defaults: {}", e);
            Config::default()
        })
    }

    /// Load config from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!("Loaded config from {}", path.display());
        Ok(config)
    }
}
