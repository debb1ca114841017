//! Configuration module for the audio probe.
//!
//! Provides `ProbeConfig` (top-level settings), the capture profiles the
//! fallback policy tries, `AppPaths` for the platform config directory, and
//! TOML persistence via `ProbeConfig::load` / `ProbeConfig::save`.

pub mod paths;
pub mod settings;

pub use paths::AppPaths;
pub use settings::{CaptureSettings, DeviceChoice, ProbeConfig, ProfileConfig};
