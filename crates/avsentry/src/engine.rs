//! RemediationEngine - the monitoring/remediation control loop.
//!
//! One run walks START -> PROBE_ROUND -> {ALL_OK, NEED_FIX, EXHAUSTED}. The
//! firmware capability is derived before the engine is built and stays fixed
//! for the run; it selects between the power-cycle and hotplug fix paths.
//! Escalation to a managed host reboot is a separate, at-most-once operation,
//! gated by the persistent reboot mute flag.

use chrono::Local;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::alert::{self, AlertDispatcher};
use crate::command::{DeviceCommand, InputMode};
use crate::config::{DelayConfig, RebootConfig};
use crate::firmware::FirmwareCapability;
use crate::mute::{alert_category, reboot_category, MuteState, MuteStore};
use crate::probe::DeviceProbe;
use crate::signal::{Channel, ChannelCheck, SignalComparator};
use crate::transport::SideEffects;

/// Expected values for the monitored channels. None = unconfigured.
#[derive(Debug, Clone, Default)]
pub struct Expectations {
    pub rx0: Option<String>,
    pub rx1: Option<String>,
    pub tx0: Option<String>,
    pub tx1: Option<String>,
    pub input: Option<InputMode>,
}

impl Expectations {
    pub fn expected_for(&self, channel: Channel) -> Option<&str> {
        match channel {
            Channel::Rx0 => self.rx0.as_deref(),
            Channel::Rx1 => self.rx1.as_deref(),
            Channel::Tx0 => self.tx0.as_deref(),
            Channel::Tx1 => self.tx1.as_deref(),
            Channel::Input => self.input.map(|m| m.reported()),
        }
    }
}

/// Fix chosen for one NEED_FIX transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStrategy {
    /// Input routing is wrong: switch it back, then hotplug. The lighter
    /// fix is tried first for routing problems regardless of capability.
    InputSwitchThenHotplug,
    PowerCycle,
    Hotplug,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub auto_fix: bool,
    pub permit_reboot: bool,
    pub max_tries: u32,
}

/// Terminal result of the retry loop.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub resolved: bool,
    pub final_checks: Vec<ChannelCheck>,
    pub escalated_reboot: bool,
}

pub struct RemediationEngine<'a> {
    probe: &'a DeviceProbe<'a>,
    side_effects: &'a dyn SideEffects,
    mute: &'a dyn MuteStore,
    delays: &'a DelayConfig,
    reboot_cfg: &'a RebootConfig,
    expectations: Expectations,
    capability: FirmwareCapability,
    options: EngineOptions,
    device_id: String,
}

impl<'a> RemediationEngine<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        probe: &'a DeviceProbe<'a>,
        side_effects: &'a dyn SideEffects,
        mute: &'a dyn MuteStore,
        delays: &'a DelayConfig,
        reboot_cfg: &'a RebootConfig,
        expectations: Expectations,
        capability: FirmwareCapability,
        options: EngineOptions,
        device_id: String,
    ) -> Self {
        Self {
            probe,
            side_effects,
            mute,
            delays,
            reboot_cfg,
            expectations,
            capability,
            options,
            device_id,
        }
    }

    /// Name of the fix this run would use, for logs and alert bodies.
    pub fn fix_method(&self) -> &'static str {
        if self.capability.reboot_capable {
            "power cycle"
        } else {
            "hotplug"
        }
    }

    /// Run the retry loop to a terminal outcome. With auto-fix disabled the
    /// rounds still happen but nothing is actuated between them, giving a
    /// dry-run monitor that only resolves if the hardware self-recovers.
    pub fn run(&self) -> RunOutcome {
        let comparator = SignalComparator::new(self.probe);
        info!("Setting {} as fix method", self.fix_method());

        let mut final_checks: Vec<ChannelCheck> = Vec::new();
        let mut try_number: u32 = 0;

        while try_number <= self.options.max_tries {
            let checks: Vec<ChannelCheck> = Channel::TRACKED
                .iter()
                .map(|&ch| comparator.compare(ch, self.expected_for_round(ch)))
                .collect();
            try_number += 1;

            if checks.iter().all(|c| c.matched) {
                info!("No issues");
                // Successful recovery clears prior dedup state.
                self.mute.unmute(&alert_category(&self.device_id));
                self.mute.unmute(&reboot_category(&self.device_id));
                return RunOutcome {
                    resolved: true,
                    final_checks: checks,
                    escalated_reboot: false,
                };
            }

            let input_mismatched = checks
                .iter()
                .any(|c| c.channel == Channel::Input && !c.matched);
            final_checks = checks;

            if self.options.auto_fix && try_number <= self.options.max_tries {
                let strategy = self.choose_strategy(input_mismatched);
                self.apply_fix(strategy, try_number);
            }
        }

        info!(
            "Mismatch persisted after {} comparison round(s)",
            try_number
        );
        RunOutcome {
            resolved: false,
            final_checks,
            escalated_reboot: false,
        }
    }

    fn expected_for_round(&self, channel: Channel) -> Option<&str> {
        self.expectations.expected_for(channel)
    }

    fn choose_strategy(&self, input_mismatched: bool) -> FixStrategy {
        if input_mismatched {
            FixStrategy::InputSwitchThenHotplug
        } else if self.capability.reboot_capable {
            FixStrategy::PowerCycle
        } else {
            FixStrategy::Hotplug
        }
    }

    fn apply_fix(&self, strategy: FixStrategy, try_number: u32) {
        match strategy {
            FixStrategy::InputSwitchThenHotplug => {
                if let Some(mode) = self.expectations.input {
                    info!("Switching input mode to {}", mode);
                    self.probe.probe(DeviceCommand::SetInput(mode));
                    self.settle(self.delays.input_switch_settle_secs);
                }
                self.hotplug(try_number);
            }
            FixStrategy::PowerCycle => {
                info!(
                    "Attempting to fix by power cycling the switcher {}/{} ...",
                    try_number, self.options.max_tries
                );
                self.probe.probe(DeviceCommand::PowerCycle);
                self.settle(self.delays.power_cycle_settle_secs);
            }
            FixStrategy::Hotplug => self.hotplug(try_number),
        }
    }

    fn hotplug(&self, try_number: u32) {
        info!(
            "Attempting to fix with hotplug {}/{} ...",
            try_number, self.options.max_tries
        );
        self.probe.probe(DeviceCommand::SendHotplug);
        self.settle(self.delays.hotplug_settle_secs);
    }

    fn settle(&self, secs: u64) {
        if secs > 0 {
            debug!("Settling for {}s", secs);
            thread::sleep(Duration::from_secs(secs));
        }
    }

    /// Last-resort escalation: schedule a wake timer, mute the reboot
    /// category, and shut the host down. While the category stays muted the
    /// physical reboot is skipped, capping reboots at one per mute cycle.
    /// Returns whether the shutdown was actually issued.
    pub fn escalate_reboot(&self) -> bool {
        let category = reboot_category(&self.device_id);
        if self.mute.status(&category) == MuteState::Muted {
            info!("Reboots muted");
            return false;
        }

        let wake_time = (Local::now() + chrono::Duration::minutes(self.reboot_cfg.wake_offset_mins))
            .format("%H:%M:%S")
            .to_string();
        debug!("Scheduling wake timer for {}", wake_time);
        if let Err(e) = self
            .side_effects
            .run(&[self.reboot_cfg.wake_program.clone(), wake_time])
        {
            warn!("Wake timer scheduling failed: {:#}", e);
        }

        info!("Rebooting....");
        self.mute.mute(&category);
        if let Err(e) = self.side_effects.run(&[
            self.reboot_cfg.shutdown_program.clone(),
            "shutdown".to_string(),
        ]) {
            warn!("Managed shutdown failed: {:#}", e);
        }
        true
    }

    /// Terminal alerting for an exhausted loop, then reboot escalation when
    /// permitted. Wording differentiates the four fix/reboot cases; the grid
    /// of expected-vs-measured values makes each message self-describing.
    pub fn dispatch_exhausted(&self, dispatcher: &AlertDispatcher, outcome: &mut RunOutcome) {
        if outcome.resolved {
            return;
        }

        let fix_method = self.fix_method();
        let checks = outcome.final_checks.clone();
        match (self.options.auto_fix, self.options.permit_reboot) {
            (false, false) => {
                info!("Issue detected - no {} attempted", fix_method);
                let message = alert::issue_message(
                    "Signal issue detected, but the run was made without corrective-action privileges.",
                    &checks,
                );
                dispatcher.report(&message);
                dispatcher.alert(&message, &alert_category(&self.device_id));
            }
            (false, true) => {
                info!("Issue detected - no {} attempted", fix_method);
                let message = alert::issue_message(
                    &format!(
                        "Signal issue detected - {} fixes were skipped and the corrective action was escalated directly to a managed shutdown. Rebooting in an attempt to fix.",
                        fix_method
                    ),
                    &checks,
                );
                dispatcher.report(&message);
                if self.mute.status(&reboot_category(&self.device_id)) == MuteState::Muted {
                    let failed = alert::issue_message(
                        &format!(
                            "Signal issue detected - {} fixes were skipped and the corrective action was escalated directly to a managed shutdown, but the issue was not resolved.",
                            fix_method
                        ),
                        &checks,
                    );
                    dispatcher.report(&failed);
                    dispatcher.alert(&failed, &alert_category(&self.device_id));
                }
                outcome.escalated_reboot = self.escalate_reboot();
            }
            (true, false) => {
                info!("Failed to resolve - standing down");
                let message = alert::issue_message(
                    &format!(
                        "Signal issue detected, but it failed to resolve even after attempting {} fixes. Standing down.",
                        fix_method
                    ),
                    &checks,
                );
                dispatcher.report(&message);
                dispatcher.alert(&message, &alert_category(&self.device_id));
            }
            (true, true) => {
                info!("Failed to resolve - attempting to reboot");
                let message = alert::issue_message(
                    &format!(
                        "Signal issue detected, but it failed to resolve even after attempting {} fixes. Performing a managed shutdown in an attempt to fix.",
                        fix_method
                    ),
                    &checks,
                );
                dispatcher.report(&message);
                if self.mute.status(&reboot_category(&self.device_id)) == MuteState::Muted {
                    let failed = alert::issue_message(
                        &format!(
                            "Signal issue detected, but it failed to resolve even after attempting {} fixes. A managed shutdown did not resolve it either.",
                            fix_method
                        ),
                        &checks,
                    );
                    dispatcher.report(&failed);
                    dispatcher.alert(&failed, &alert_category(&self.device_id));
                }
                outcome.escalated_reboot = self.escalate_reboot();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AlertConfig;
    use crate::mute::MemoryMuteStore;
    use crate::transport::{CommandOutput, Transport};
    use std::cell::RefCell;
    use std::collections::{HashMap, VecDeque};

    struct ScriptedTransport {
        replies: RefCell<HashMap<String, VecDeque<String>>>,
        errors: RefCell<HashMap<String, String>>,
        calls: RefCell<Vec<String>>,
    }

    impl ScriptedTransport {
        fn new() -> Self {
            Self {
                replies: RefCell::new(HashMap::new()),
                errors: RefCell::new(HashMap::new()),
                calls: RefCell::new(Vec::new()),
            }
        }

        /// Queue a reply. The last queued reply for a command is sticky.
        fn reply(&self, command: &str, stdout: &str) {
            self.replies
                .borrow_mut()
                .entry(command.to_string())
                .or_default()
                .push_back(stdout.to_string());
        }

        fn fail(&self, command: &str, stderr: &str) {
            self.errors
                .borrow_mut()
                .insert(command.to_string(), stderr.to_string());
        }

        fn count(&self, command: &str) -> usize {
            self.calls.borrow().iter().filter(|c| *c == command).count()
        }
    }

    impl Transport for ScriptedTransport {
        fn execute(
            &self,
            _port: &str,
            command: DeviceCommand,
        ) -> anyhow::Result<CommandOutput> {
            let name = command.name().to_string();
            self.calls.borrow_mut().push(name.clone());

            if let Some(stderr) = self.errors.borrow().get(&name) {
                return Ok(CommandOutput {
                    stdout: String::new(),
                    stderr: stderr.clone(),
                    exit_code: 0,
                });
            }

            let stdout = {
                let mut replies = self.replies.borrow_mut();
                match replies.get_mut(&name) {
                    Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
                    Some(queue) => queue.front().cloned().unwrap_or_default(),
                    None => String::new(),
                }
            };
            Ok(CommandOutput {
                stdout,
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    struct RecordingSideEffects {
        runs: RefCell<Vec<Vec<String>>>,
    }

    impl RecordingSideEffects {
        fn new() -> Self {
            Self {
                runs: RefCell::new(Vec::new()),
            }
        }
    }

    impl SideEffects for RecordingSideEffects {
        fn run(&self, argv: &[String]) -> anyhow::Result<CommandOutput> {
            self.runs.borrow_mut().push(argv.to_vec());
            Ok(CommandOutput {
                stdout: String::new(),
                stderr: String::new(),
                exit_code: 0,
            })
        }
    }

    fn zero_delays() -> DelayConfig {
        DelayConfig {
            hotplug_settle_secs: 0,
            power_cycle_settle_secs: 0,
            input_switch_settle_secs: 0,
        }
    }

    fn capability(reboot_capable: bool) -> FirmwareCapability {
        FirmwareCapability {
            reachable: true,
            reboot_capable,
        }
    }

    #[test]
    fn test_no_expectations_resolves_on_first_round() {
        let transport = ScriptedTransport::new();
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        mute.mute("alert:dev0");
        mute.mute("reboot:dev0");
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();

        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            Expectations::default(),
            capability(true),
            EngineOptions {
                auto_fix: true,
                permit_reboot: false,
                max_tries: 3,
            },
            "dev0".to_string(),
        );
        let outcome = engine.run();

        assert!(outcome.resolved);
        assert!(!outcome.escalated_reboot);
        // Vacuous match: nothing was probed.
        assert!(transport.calls.borrow().is_empty());
        // Successful recovery clears prior dedup state.
        assert_eq!(mute.status("alert:dev0"), MuteState::Unmuted);
        assert_eq!(mute.status("reboot:dev0"), MuteState::Unmuted);
    }

    #[test]
    fn test_dry_run_does_rounds_but_no_actions() {
        let transport = ScriptedTransport::new();
        transport.reply("getStatusRx0", "rx0: no signal");
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();

        let expectations = Expectations {
            rx0: Some("1080p60".to_string()),
            ..Default::default()
        };
        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            expectations,
            capability(true),
            EngineOptions {
                auto_fix: false,
                permit_reboot: false,
                max_tries: 3,
            },
            "dev0".to_string(),
        );
        let outcome = engine.run();

        assert!(!outcome.resolved);
        // N+1 comparison rounds, zero remediation side effects.
        assert_eq!(transport.count("getStatusRx0"), 4);
        assert_eq!(transport.count("sendHotplug"), 0);
        assert_eq!(transport.count("powerCycle"), 0);
        assert!(side_effects.runs.borrow().is_empty());
    }

    #[test]
    fn test_permanent_mismatch_issues_exactly_n_hotplugs() {
        let transport = ScriptedTransport::new();
        transport.reply("getStatusRx0", "rx0: no signal");
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();

        let expectations = Expectations {
            rx0: Some("1080p60".to_string()),
            ..Default::default()
        };
        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            expectations,
            capability(false),
            EngineOptions {
                auto_fix: true,
                permit_reboot: false,
                max_tries: 3,
            },
            "dev0".to_string(),
        );
        let outcome = engine.run();

        assert!(!outcome.resolved);
        // Round-then-fix ordering: one fewer action than rounds.
        assert_eq!(transport.count("getStatusRx0"), 4);
        assert_eq!(transport.count("sendHotplug"), 3);
        assert_eq!(transport.count("powerCycle"), 0);
        let calls = transport.calls.borrow();
        assert_eq!(calls.first().map(String::as_str), Some("getStatusRx0"));
        assert_eq!(calls.last().map(String::as_str), Some("getStatusRx0"));
    }

    #[test]
    fn test_reboot_capable_firmware_power_cycles_instead() {
        let transport = ScriptedTransport::new();
        transport.reply("getStatusTx1", "tx1: no signal");
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();

        let expectations = Expectations {
            tx1: Some("2160p30".to_string()),
            ..Default::default()
        };
        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            expectations,
            capability(true),
            EngineOptions {
                auto_fix: true,
                permit_reboot: false,
                max_tries: 2,
            },
            "dev0".to_string(),
        );
        let outcome = engine.run();

        assert!(!outcome.resolved);
        assert_eq!(transport.count("powerCycle"), 2);
        assert_eq!(transport.count("sendHotplug"), 0);
    }

    #[test]
    fn test_input_mismatch_switches_input_then_recovers() {
        let transport = ScriptedTransport::new();
        transport.reply("getInput", "input: bot");
        transport.reply("getInput", "input: top");
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        mute.mute("alert:dev0");
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();

        let expectations = Expectations {
            input: Some(InputMode::Top),
            ..Default::default()
        };
        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            expectations,
            capability(true),
            EngineOptions {
                auto_fix: true,
                permit_reboot: false,
                max_tries: 1,
            },
            "dev0".to_string(),
        );
        let outcome = engine.run();

        assert!(outcome.resolved);
        assert_eq!(transport.count("setInputTop"), 1);
        assert_eq!(transport.count("sendHotplug"), 1);
        // Input-routing problems never start with a power cycle.
        assert_eq!(transport.count("powerCycle"), 0);
        assert_eq!(transport.count("getInput"), 2);
        assert_eq!(mute.status("alert:dev0"), MuteState::Unmuted);
    }

    #[test]
    fn test_input_mismatch_takes_precedence_over_power_cycle() {
        let transport = ScriptedTransport::new();
        transport.reply("getInput", "input: swap");
        transport.reply("getStatusRx0", "rx0: no signal");
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();

        let expectations = Expectations {
            rx0: Some("1080p60".to_string()),
            input: Some(InputMode::Thru),
            ..Default::default()
        };
        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            expectations,
            capability(true),
            EngineOptions {
                auto_fix: true,
                permit_reboot: false,
                max_tries: 1,
            },
            "dev0".to_string(),
        );
        engine.run();

        assert_eq!(transport.count("setInputThru"), 1);
        assert_eq!(transport.count("sendHotplug"), 1);
        assert_eq!(transport.count("powerCycle"), 0);
    }

    #[test]
    fn test_transport_failure_counts_as_mismatch() {
        let transport = ScriptedTransport::new();
        transport.fail("getStatusRx0", "serial port busy");
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();

        let expectations = Expectations {
            rx0: Some("1080p60".to_string()),
            ..Default::default()
        };
        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            expectations,
            capability(false),
            EngineOptions {
                auto_fix: false,
                permit_reboot: false,
                max_tries: 0,
            },
            "dev0".to_string(),
        );
        let outcome = engine.run();

        assert!(!outcome.resolved);
        let rx0 = outcome
            .final_checks
            .iter()
            .find(|c| c.channel == Channel::Rx0)
            .unwrap();
        assert!(!rx0.matched);
        assert_eq!(rx0.probe_error.as_deref(), Some("serial port busy"));
    }

    #[test]
    fn test_escalation_fires_once_then_is_muted() {
        let transport = ScriptedTransport::new();
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();

        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            Expectations::default(),
            capability(true),
            EngineOptions {
                auto_fix: false,
                permit_reboot: true,
                max_tries: 3,
            },
            "dev0".to_string(),
        );

        assert!(engine.escalate_reboot());
        {
            let runs = side_effects.runs.borrow();
            assert_eq!(runs.len(), 2);
            assert_eq!(runs[0][0], reboot_cfg.wake_program);
            assert_eq!(runs[1][0], reboot_cfg.shutdown_program);
            assert_eq!(runs[1][1], "shutdown");
        }
        assert_eq!(mute.status("reboot:dev0"), MuteState::Muted);

        // Second identical escalation performs no physical reboot.
        assert!(!engine.escalate_reboot());
        assert_eq!(side_effects.runs.borrow().len(), 2);
    }

    fn programs(runs: &[Vec<String>]) -> Vec<String> {
        runs.iter().map(|r| r[0].clone()).collect()
    }

    #[test]
    fn test_second_exhausted_run_alerts_instead_of_rebooting() {
        let transport = ScriptedTransport::new();
        transport.reply("getStatusRx0", "rx0: no signal");
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();
        let alert_cfg = AlertConfig::default();
        let dispatcher = AlertDispatcher::new(
            &side_effects,
            &mute,
            &alert_cfg,
            "testhost".to_string(),
            true,
            false,
        );

        let expectations = Expectations {
            rx0: Some("1080p60".to_string()),
            ..Default::default()
        };
        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            expectations,
            capability(true),
            EngineOptions {
                auto_fix: false,
                permit_reboot: true,
                max_tries: 0,
            },
            "dev0".to_string(),
        );

        // First run: exhausted, physical reboot fires, no failure email yet.
        let mut outcome = engine.run();
        assert!(!outcome.resolved);
        engine.dispatch_exhausted(&dispatcher, &mut outcome);
        assert!(outcome.escalated_reboot);
        {
            let runs = side_effects.runs.borrow();
            let seen = programs(&runs);
            assert!(seen.contains(&reboot_cfg.wake_program));
            assert!(seen.contains(&reboot_cfg.shutdown_program));
            assert!(seen.contains(&alert_cfg.event_program));
            assert!(!seen.contains(&alert_cfg.email_program));
        }
        assert_eq!(mute.status("reboot:dev0"), MuteState::Muted);
        side_effects.runs.borrow_mut().clear();

        // Second identical run: no second physical reboot, only the
        // failed-to-resolve event and email.
        let mut outcome = engine.run();
        assert!(!outcome.resolved);
        engine.dispatch_exhausted(&dispatcher, &mut outcome);
        assert!(!outcome.escalated_reboot);
        let runs = side_effects.runs.borrow();
        let seen = programs(&runs);
        assert!(!seen.contains(&reboot_cfg.wake_program));
        assert!(!seen.contains(&reboot_cfg.shutdown_program));
        assert!(seen.contains(&alert_cfg.email_program));
        assert!(runs.iter().any(|r| {
            r[0] == alert_cfg.event_program
                && r.last().is_some_and(|m| m.contains("was not resolved"))
        }));
        assert!(runs.iter().any(|r| {
            r[0] == alert_cfg.email_program
                && r.last().is_some_and(|m| m.contains("was not resolved"))
        }));
        assert_eq!(mute.status("reboot:dev0"), MuteState::Muted);
    }

    #[test]
    fn test_exhausted_without_privileges_stands_down_with_alert() {
        let transport = ScriptedTransport::new();
        transport.reply("getStatusTx0", "tx0: no signal");
        let probe = DeviceProbe::new(&transport, "/dev/ttyUSB0");
        let side_effects = RecordingSideEffects::new();
        let mute = MemoryMuteStore::new();
        let delays = zero_delays();
        let reboot_cfg = RebootConfig::default();
        let alert_cfg = AlertConfig::default();
        let dispatcher = AlertDispatcher::new(
            &side_effects,
            &mute,
            &alert_cfg,
            "testhost".to_string(),
            true,
            false,
        );

        let expectations = Expectations {
            tx0: Some("1080p60".to_string()),
            ..Default::default()
        };
        let engine = RemediationEngine::new(
            &probe,
            &side_effects,
            &mute,
            &delays,
            &reboot_cfg,
            expectations,
            capability(false),
            EngineOptions {
                auto_fix: false,
                permit_reboot: false,
                max_tries: 0,
            },
            "dev0".to_string(),
        );

        let mut outcome = engine.run();
        engine.dispatch_exhausted(&dispatcher, &mut outcome);

        assert!(!outcome.escalated_reboot);
        let runs = side_effects.runs.borrow();
        let seen = programs(&runs);
        assert!(seen.contains(&alert_cfg.event_program));
        assert!(seen.contains(&alert_cfg.email_program));
        assert!(!seen.contains(&reboot_cfg.shutdown_program));
        assert!(runs.iter().any(|r| {
            r[0] == alert_cfg.email_program
                && r.last()
                    .is_some_and(|m| m.contains("without corrective-action privileges"))
        }));
        assert_eq!(mute.status("alert:dev0"), MuteState::Muted);
    }
}
