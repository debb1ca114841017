//! Probe orchestration: fallback open policy and the timed run driver.
//!
//! # Architecture
//!
//! ```text
//! ProbeConfig ──▶ open_with_fallback()
//!                   ├─ preferred profile  (first input, 44.1 kHz, i16, 2048)
//!                   └─ alternate profile  (default device, 22.05 kHz, f32, 1024)
//!                          │
//!                          ▼
//!                   CaptureSession (Running)
//!                          │
//!                          ▼
//!                   run_for(duration) ──▶ CaptureSummary
//! ```
//!
//! # Quick start
//!
//! ```rust,no_run
//! use audio_probe::audio::CpalHost;
//! use audio_probe::config::ProbeConfig;
//! use audio_probe::pipeline::{run_probe, ProbeOutcome};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let host = CpalHost::new();
//!     let (outcome, _session) = run_probe(&host, &ProbeConfig::default()).await;
//!     match outcome {
//!         ProbeOutcome::Captured { summary, .. } => {
//!             println!("{} blocks", summary.blocks_received)
//!         }
//!         ProbeOutcome::NoAudio { reason } => println!("no audio: {reason}"),
//!     }
//! }
//! ```

pub mod fallback;
pub mod runner;

// ---------------------------------------------------------------------------
// Public re-exports
// ---------------------------------------------------------------------------

pub use fallback::{open_with_fallback, resolve_profile};
pub use runner::{run_for, run_probe, ProbeOutcome};
