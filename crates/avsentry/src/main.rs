//! avsentry - watches a serial-attached AV switcher for signal issues,
//! fixes what it can, and escalates the rest.

use anyhow::Result;
use clap::Parser;
use std::process;
use tracing::{debug, error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;

use avsentry::alert::{self, AlertDispatcher};
use avsentry::cli::Cli;
use avsentry::config::Config;
use avsentry::discover;
use avsentry::engine::{EngineOptions, RemediationEngine};
use avsentry::error::SentryError;
use avsentry::firmware;
use avsentry::interrogate;
use avsentry::mute::{alert_category, device_id, FileMuteStore};
use avsentry::probe::DeviceProbe;
use avsentry::transport::{HelperTransport, ProcessSideEffects};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = init_logging(&cli) {
        eprintln!("failed to initialize logging: {e:#}");
        process::exit(1);
    }
    info!("avsentry v{} starting", env!("CARGO_PKG_VERSION"));
    debug!("Input args: {:?}", cli);

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("{:#}", e);
            process::exit(1);
        }
    }
}

/// Console layer at INFO (DEBUG with --debug); optional append-mode file
/// layer at INFO when a log path is given.
fn init_logging(cli: &Cli) -> Result<()> {
    let console_level = if cli.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(console_level);

    match &cli.log_path {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            let file_layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(file)
                .with_filter(LevelFilter::INFO);
            tracing_subscriber::registry()
                .with(console)
                .with(file_layer)
                .init();
        }
        None => tracing_subscriber::registry().with(console).init(),
    }
    Ok(())
}

fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load(),
    };

    let transport = HelperTransport::new(&config.paths.helper);
    let side_effects = ProcessSideEffects;
    let mute = FileMuteStore::new(&config.paths.mute_dir);
    let dispatcher = AlertDispatcher::new(
        &side_effects,
        &mute,
        &config.alerting,
        alert::hostname(),
        cli.notify,
        cli.force,
    );

    // Resolve the device. A missing or undiscoverable port is a
    // configuration error: report it, alert, and stop.
    let device = match &cli.device {
        Some(d) => {
            if !discover::port_exists(d) {
                let err = SentryError::DeviceNotFound(d.clone());
                error!("{}", err);
                let message = alert::connectivity_message(&format!(
                    "{}. Unable to communicate with the switcher.",
                    err
                ));
                dispatcher.report(&message);
                dispatcher.alert(&message, &alert_category(&device_id(d)));
                return Ok(err.exit_code());
            }
            d.clone()
        }
        None => match discover::discover_port(&transport) {
            Ok(port) => port,
            Err(err) => {
                error!("{}", err);
                let message = alert::connectivity_message(&format!(
                    "{}. Unable to communicate with the switcher.",
                    err
                ));
                dispatcher.report(&message);
                dispatcher.alert(&message, &alert_category("unknown"));
                return Ok(err.exit_code());
            }
        },
    };

    let id = device_id(&device);
    let probe = DeviceProbe::new(&transport, device.clone());

    // The one firmware derivation of the run; it precedes any remediation.
    let capability = firmware::check(&probe);
    if !capability.reachable {
        let err = SentryError::Handshake(device.clone());
        let message = alert::connectivity_message(&format!(
            "{}. Communication may be temporarily interrupted or the serial connection is disconnected.",
            err
        ));
        dispatcher.report(&message);
        dispatcher.alert(&message, &alert_category(&id));
        return Ok(err.exit_code());
    }

    if cli.interrogate {
        interrogate::run(&probe, cli.json)?;
        return Ok(0);
    }

    let engine = RemediationEngine::new(
        &probe,
        &side_effects,
        &mute,
        &config.delays,
        &config.reboot,
        cli.expectations(),
        capability,
        EngineOptions {
            auto_fix: cli.fix,
            permit_reboot: cli.reboot,
            max_tries: cli.tries,
        },
        id,
    );

    let mut outcome = engine.run();
    if !outcome.resolved {
        engine.dispatch_exhausted(&dispatcher, &mut outcome);
    }

    debug!("Run outcome: {:?}", outcome);
    Ok(0)
}
