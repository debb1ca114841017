//! Probe settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files.
//!
//! ```toml
//! [capture]
//! queue_capacity = 256
//! run_secs = 3.0
//!
//! [preferred]
//! device = "first_input"
//! channels = 1
//! sample_rate = 44100
//! sample_format = "i16"
//! block_size = 2048
//!
//! [alternate]
//! device = "default"
//! channels = 1
//! sample_rate = 22050
//! sample_format = "f32"
//! block_size = 1024
//! run_secs = 2.0
//! ```
//!
//! A profile's optional `run_secs` overrides `capture.run_secs` when that
//! profile is the one that opened.

use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use super::AppPaths;
use crate::audio::{CaptureConfig, SampleFormat};

// ---------------------------------------------------------------------------
// DeviceChoice
// ---------------------------------------------------------------------------

/// How a profile picks its input device.
///
/// Indices are never persisted: they change between enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceChoice {
    /// First input-capable device in host order.
    FirstInput,
    /// Let the host pick its default input device.
    Default,
    /// Input device with this display name.
    Name(String),
}

// ---------------------------------------------------------------------------
// ProfileConfig
// ---------------------------------------------------------------------------

/// One capture configuration candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileConfig {
    pub device: DeviceChoice,
    pub channels: u16,
    /// Hz.
    pub sample_rate: u32,
    pub sample_format: SampleFormat,
    /// Frames per delivered block.
    pub block_size: u32,
    /// Capture length in seconds when this profile opened.  Falls back to
    /// `capture.run_secs`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_secs: Option<f32>,
}

impl ProfileConfig {
    /// First input device, mono, 44.1 kHz, 16-bit, 2048 frames.
    pub fn preferred() -> Self {
        Self::from_capture(DeviceChoice::FirstInput, &CaptureConfig::preferred(0))
    }

    /// Default device, mono, 22.05 kHz, float, 1024 frames, 2 s run.
    pub fn alternate() -> Self {
        Self {
            run_secs: Some(2.0),
            ..Self::from_capture(DeviceChoice::Default, &CaptureConfig::alternate())
        }
    }

    fn from_capture(device: DeviceChoice, capture: &CaptureConfig) -> Self {
        Self {
            device,
            channels: capture.channels,
            sample_rate: capture.sample_rate,
            sample_format: capture.sample_format,
            block_size: capture.block_size,
            run_secs: None,
        }
    }

    /// Bind this profile to a resolved device index.
    pub fn to_capture_config(&self, device: Option<usize>) -> CaptureConfig {
        CaptureConfig {
            device,
            channels: self.channels,
            sample_rate: self.sample_rate,
            sample_format: self.sample_format,
            block_size: self.block_size,
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureSettings
// ---------------------------------------------------------------------------

/// Queueing and run-length settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureSettings {
    /// Blocks the delivery queue holds before dropping new ones.
    pub queue_capacity: usize,
    /// How long the probe captures, in seconds.
    pub run_secs: f32,
}

impl CaptureSettings {
    /// `run_secs` as a [`Duration`]; zero for values that cannot be one.
    pub fn run_duration(&self) -> Duration {
        secs_to_duration(self.run_secs)
    }
}

fn secs_to_duration(secs: f32) -> Duration {
    Duration::try_from_secs_f32(secs).unwrap_or(Duration::ZERO)
}

fn check_secs(field: &str, secs: f32) -> Result<()> {
    if !secs.is_finite() || secs < 0.0 {
        bail!("{field} must be a non-negative number (got {secs})");
    }
    Ok(())
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            run_secs: 3.0,
        }
    }
}

// ---------------------------------------------------------------------------
// ProbeConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level probe configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use audio_probe::config::ProbeConfig;
///
/// // Load (returns Default when file is missing)
/// let config = ProbeConfig::load().unwrap();
///
/// // Modify and save
/// // config.save().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeConfig {
    pub capture: CaptureSettings,
    /// Tried first.
    pub preferred: ProfileConfig,
    /// Tried once if the preferred profile fails.
    pub alternate: ProfileConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            capture: CaptureSettings::default(),
            preferred: ProfileConfig::preferred(),
            alternate: ProfileConfig::alternate(),
        }
    }
}

impl ProbeConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(ProbeConfig::default())` when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// How long to capture once `profile` has opened.
    pub fn run_duration_for(&self, profile: &ProfileConfig) -> Duration {
        profile
            .run_secs
            .map_or_else(|| self.capture.run_duration(), secs_to_duration)
    }

    /// Check the settings the capture core cannot validate itself.
    ///
    /// Profile values (channels, rate, block size) are left to
    /// `CaptureConfig::validate` so a bad preferred profile still falls back.
    pub fn validate(&self) -> Result<()> {
        if self.capture.queue_capacity == 0 {
            bail!("capture.queue_capacity must be > 0");
        }
        check_secs("capture.run_secs", self.capture.run_secs)?;
        if let Some(secs) = self.preferred.run_secs {
            check_secs("preferred.run_secs", secs)?;
        }
        if let Some(secs) = self.alternate.run_secs {
            check_secs("alternate.run_secs", secs)?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `ProbeConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = ProbeConfig::default();
        original.save_to(&path).expect("save");

        let loaded = ProbeConfig::load_from(&path).expect("load");

        assert_eq!(original.capture.queue_capacity, loaded.capture.queue_capacity);
        assert_eq!(original.capture.run_secs, loaded.capture.run_secs);
        assert_eq!(original.preferred, loaded.preferred);
        assert_eq!(original.alternate, loaded.alternate);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = ProbeConfig::load_from(&path).expect("should not error");
        assert_eq!(config.preferred, ProfileConfig::preferred());
        assert_eq!(config.alternate, ProfileConfig::alternate());
        assert_eq!(config.capture.queue_capacity, 256);
    }

    #[test]
    fn default_profiles() {
        let cfg = ProbeConfig::default();

        assert_eq!(cfg.preferred.device, DeviceChoice::FirstInput);
        assert_eq!(cfg.preferred.channels, 1);
        assert_eq!(cfg.preferred.sample_rate, 44_100);
        assert_eq!(cfg.preferred.sample_format, SampleFormat::I16);
        assert_eq!(cfg.preferred.block_size, 2048);

        assert_eq!(cfg.alternate.device, DeviceChoice::Default);
        assert_eq!(cfg.alternate.channels, 1);
        assert_eq!(cfg.alternate.sample_rate, 22_050);
        assert_eq!(cfg.alternate.sample_format, SampleFormat::F32);
        assert_eq!(cfg.alternate.block_size, 1024);

        assert_eq!(cfg.capture.run_duration(), Duration::from_secs(3));
        assert_eq!(cfg.preferred.run_secs, None);
        assert_eq!(cfg.alternate.run_secs, Some(2.0));
    }

    #[test]
    fn run_duration_follows_the_opened_profile() {
        let cfg = ProbeConfig::default();
        assert_eq!(cfg.run_duration_for(&cfg.preferred), Duration::from_secs(3));
        assert_eq!(cfg.run_duration_for(&cfg.alternate), Duration::from_secs(2));
    }

    #[test]
    fn validate_rejects_bad_profile_run_secs() {
        let mut cfg = ProbeConfig::default();
        cfg.alternate.run_secs = Some(-0.5);
        assert!(cfg.validate().is_err());
    }

    /// Hand-written settings, including a device chosen by name.
    #[test]
    fn parses_hand_written_settings() {
        let content = r#"
            [capture]
            queue_capacity = 32
            run_secs = 0.5

            [preferred]
            device = { name = "USB Microphone" }
            channels = 2
            sample_rate = 48000
            sample_format = "f32"
            block_size = 512

            [alternate]
            device = "default"
            channels = 1
            sample_rate = 16000
            sample_format = "i16"
            block_size = 256
        "#;

        let cfg: ProbeConfig = toml::from_str(content).expect("parse");
        assert_eq!(cfg.capture.queue_capacity, 32);
        assert_eq!(cfg.capture.run_duration(), Duration::from_millis(500));
        assert_eq!(cfg.preferred.device, DeviceChoice::Name("USB Microphone".into()));
        assert_eq!(cfg.preferred.sample_format, SampleFormat::F32);
        assert_eq!(cfg.alternate.sample_rate, 16_000);
        assert_eq!(cfg.alternate.run_secs, None);
        assert_eq!(cfg.run_duration_for(&cfg.alternate), Duration::from_millis(500));
    }

    #[test]
    fn to_capture_config_binds_device() {
        let capture = ProfileConfig::preferred().to_capture_config(Some(3));
        assert_eq!(capture, CaptureConfig::preferred(3));

        let capture = ProfileConfig::alternate().to_capture_config(None);
        assert_eq!(capture, CaptureConfig::alternate());
    }

    #[test]
    fn validate_rejects_bad_capture_settings() {
        let mut cfg = ProbeConfig::default();
        assert!(cfg.validate().is_ok());

        cfg.capture.queue_capacity = 0;
        assert!(cfg.validate().is_err());

        cfg.capture.queue_capacity = 8;
        cfg.capture.run_secs = -1.0;
        assert!(cfg.validate().is_err());

        cfg.capture.run_secs = f32::NAN;
        assert!(cfg.validate().is_err());
    }

    /// Profile values are not checked here; the fallback policy handles them.
    #[test]
    fn validate_ignores_profile_values() {
        let mut cfg = ProbeConfig::default();
        cfg.preferred.channels = 0;
        assert!(cfg.validate().is_ok());
    }
}
