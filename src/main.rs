//! Application entry point — audio capture probe.
//!
//! # Startup sequence
//!
//! 1. Initialise logging (`RUST_LOG` overrides the `info` default).
//! 2. Load [`ProbeConfig`] from disk (returns default on first run).
//! 3. Enumerate devices on the default cpal host and log them.
//! 4. Open with fallback, capture for the opened profile's run length, stop.
//! 5. Print the [`ProbeOutcome`] as one JSON line on stdout.
//!
//! Flags:
//!
//! * `--list-devices` — print the device inventory as JSON and exit.
//! * `--init-config`  — write the default `settings.toml` if none exists.
//!
//! "No audio" is a normal outcome: the process still exits successfully.

use anyhow::{Context, Result};
use audio_probe::{
    audio::{list_devices, CpalHost},
    config::{AppPaths, ProbeConfig},
    pipeline::{run_probe, ProbeOutcome},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("audio-probe starting up");

    let args: Vec<String> = std::env::args().skip(1).collect();
    let has_flag = |flag: &str| args.iter().any(|a| a == flag);

    // 2. Configuration
    if has_flag("--init-config") {
        let paths = AppPaths::new();
        if paths.settings_file.exists() {
            log::info!("config already present at {}", paths.settings_file.display());
        } else {
            ProbeConfig::default()
                .save()
                .context("failed to write default settings")?;
            log::info!("wrote default config to {}", paths.settings_file.display());
        }
        return Ok(());
    }

    let config = ProbeConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config ({e}); using defaults");
        ProbeConfig::default()
    });
    config.validate().context("invalid settings")?;

    // 3. Device inventory
    let host = CpalHost::new();
    log::info!("audio host: {}", host.name());

    let devices = list_devices(&host).unwrap_or_else(|e| {
        log::warn!("device enumeration failed: {e}");
        Vec::new()
    });
    for device in &devices {
        log::info!(
            "device #{}: {} ({} input channels)",
            device.index,
            device.name,
            device.max_input_channels
        );
    }

    if has_flag("--list-devices") {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    // 4. Capture
    let (outcome, _session) = run_probe(&host, &config).await;
    match &outcome {
        ProbeOutcome::Captured { config, summary } => log::info!(
            "capture complete on {config}: {} blocks, {} bytes",
            summary.blocks_received,
            summary.bytes_received
        ),
        ProbeOutcome::NoInputDevice => log::warn!("No input devices found!"),
        ProbeOutcome::NoAudio { reason } => {
            log::warn!("continuing without audio: {reason}")
        }
    }

    // 5. Report
    println!("{}", serde_json::to_string(&outcome)?);
    Ok(())
}
