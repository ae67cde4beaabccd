//! One-shot interrogation: dump all current signal info, bypassing the loop.

use serde::Serialize;
use tracing::info;

use crate::command::DeviceCommand;
use crate::probe::DeviceProbe;

const INTERROGATION: &[(DeviceCommand, &str)] = &[
    (DeviceCommand::GetVersion, "VERSION"),
    (DeviceCommand::GetScale, "SCALING"),
    (DeviceCommand::GetInput, "INPUT PORT"),
    (DeviceCommand::GetStatusRx0, "INP0 SIGNAL"),
    (DeviceCommand::GetStatusRx1, "INP1 SIGNAL"),
    (DeviceCommand::GetStatusTx0, "OUT0 SIGNAL"),
    (DeviceCommand::GetStatusTx1, "OUT1 SIGNAL"),
    (DeviceCommand::GetTx0Sink, "OUT0 EDID"),
    (DeviceCommand::GetTx1Sink, "OUT1 EDID"),
];

#[derive(Debug, Clone, Serialize)]
pub struct Reading {
    pub label: String,
    pub value: String,
}

/// Collect one reading per interrogation command. Transport failures are
/// recorded in place of the value rather than aborting the dump.
pub fn collect(probe: &DeviceProbe) -> Vec<Reading> {
    INTERROGATION
        .iter()
        .map(|(command, label)| {
            let out = probe.probe(*command);
            let value = if out.transport_failed() {
                format!("<error: {}>", out.stderr)
            } else {
                out.stdout.trim().to_string()
            };
            Reading {
                label: (*label).to_string(),
                value,
            }
        })
        .collect()
}

/// Run the interrogation and emit it, labeled, to the log or as JSON.
pub fn run(probe: &DeviceProbe, json: bool) -> anyhow::Result<()> {
    let readings = collect(probe);
    if json {
        println!("{}", serde_json::to_string_pretty(&readings)?);
    } else {
        for reading in &readings {
            info!("{} :: {}", reading.label, reading.value);
        }
    }
    Ok(())
}
