//! Timed run driver and the end-to-end probe.
//!
//! [`run_for`] lets an open session deliver for a fixed duration, stops it
//! and reports the queue's totals.  [`run_probe`] chains
//! `open_with_fallback → run_for` and folds the no-audio errors into a
//! [`ProbeOutcome`] so the caller can carry on without audio.

use std::time::Duration;

use serde::Serialize;

use crate::audio::{AudioHost, CaptureConfig, CaptureError, CaptureSession, CaptureSummary};
use crate::config::ProbeConfig;

use super::fallback::open_profiles;

/// Wait `duration` while the session delivers, then stop it.
///
/// The wait is a `tokio` sleep, not a poll.  Queued blocks are left in the
/// session for the caller to drain.  A session that is not running is
/// stopped (a no-op) and its current totals returned immediately.
pub async fn run_for(session: &mut CaptureSession, duration: Duration) -> CaptureSummary {
    if !session.is_running() {
        log::warn!(
            "runner: session is {}, nothing to capture",
            session.state().label()
        );
        session.stop();
        return session.summary();
    }

    log::info!("runner: capturing for {:.2}s", duration.as_secs_f32());
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
    session.stop();

    let summary = session.summary();
    log::info!(
        "runner: {} blocks ({} bytes) received, {} dropped, {} queued",
        summary.blocks_received,
        summary.bytes_received,
        summary.blocks_dropped,
        session.queued()
    );
    summary
}

/// Result of a full probe run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    /// A profile opened and ran for the configured duration.
    Captured {
        config: CaptureConfig,
        summary: CaptureSummary,
    },
    /// Enumeration found no input-capable device; nothing was opened.
    NoInputDevice,
    /// Neither profile could be opened; proceed without audio.
    NoAudio { reason: String },
}

impl ProbeOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, ProbeOutcome::Captured { .. })
    }
}

/// Open with fallback, capture for the opened profile's run length, report.
///
/// The stopped session is returned alongside the outcome so queued blocks
/// stay available.
pub async fn run_probe<H: AudioHost + ?Sized>(
    host: &H,
    config: &ProbeConfig,
) -> (ProbeOutcome, Option<CaptureSession>) {
    let (mut session, profile) = match open_profiles(host, config) {
        Ok(opened) => opened,
        Err(CaptureError::NoInputDevice) => {
            log::warn!("runner: no input devices found; proceeding without audio");
            return (ProbeOutcome::NoInputDevice, None);
        }
        Err(err) => {
            log::warn!("runner: {err}; proceeding without audio");
            return (
                ProbeOutcome::NoAudio {
                    reason: err.to_string(),
                },
                None,
            );
        }
    };

    let summary = run_for(&mut session, config.run_duration_for(profile)).await;
    let outcome = match session.config() {
        Some(capture) => ProbeOutcome::Captured {
            config: capture.clone(),
            summary,
        },
        None => ProbeOutcome::NoAudio {
            reason: "session closed without a configuration".into(),
        },
    };
    (outcome, Some(session))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{MockHost, RawDevice, SessionState};

    fn quick_config() -> ProbeConfig {
        let mut config = ProbeConfig::default();
        config.capture.run_secs = 0.0;
        config.alternate.run_secs = None;
        config
    }

    #[tokio::test]
    async fn zero_duration_is_an_immediate_round_trip() {
        let host = MockHost::with_microphone();
        let mut session =
            CaptureSession::open_new(&host, CaptureConfig::preferred(1), 8).unwrap();

        let summary = run_for(&mut session, Duration::ZERO).await;

        assert_eq!(summary.blocks_received, 0);
        assert_eq!(summary.bytes_received, 0);
        assert_eq!(session.state(), SessionState::Stopped);
        assert_eq!(host.live_streams(), 0);
    }

    #[tokio::test]
    async fn totals_come_from_counters_and_queue_is_left_intact() {
        let host = MockHost::with_microphone();
        let mut session =
            CaptureSession::open_new(&host, CaptureConfig::preferred(1), 8).unwrap();
        for _ in 0..3 {
            host.deliver(&[0; 4096]);
        }

        let summary = run_for(&mut session, Duration::from_millis(10)).await;

        assert_eq!(summary.blocks_received, 3);
        assert_eq!(summary.bytes_received, 3 * 4096);
        assert_eq!(session.queued(), 3);
        assert_eq!(session.drain().len(), 3);
    }

    #[tokio::test]
    async fn idle_session_reports_zero_without_waiting() {
        let mut session = CaptureSession::new(8);
        let summary = run_for(&mut session, Duration::from_secs(60)).await;
        assert_eq!(summary, CaptureSummary::default());
        assert_eq!(session.state(), SessionState::Idle);
    }

    #[tokio::test]
    async fn stopped_session_can_be_run_again_harmlessly() {
        let host = MockHost::with_microphone();
        let mut session =
            CaptureSession::open_new(&host, CaptureConfig::preferred(1), 8).unwrap();
        host.deliver(&[1, 2]);

        let first = run_for(&mut session, Duration::ZERO).await;
        let second = run_for(&mut session, Duration::ZERO).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn probe_reports_captured_profile() {
        let host = MockHost::with_microphone().failing_rate(44_100);
        let (outcome, session) = run_probe(&host, &quick_config()).await;

        match outcome {
            ProbeOutcome::Captured { config, summary } => {
                assert_eq!(config, CaptureConfig::alternate());
                assert_eq!(summary.blocks_received, 0);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(session.map(|s| s.state()), Some(SessionState::Stopped));
        assert_eq!(host.live_streams(), 0);
    }

    #[tokio::test]
    async fn probe_without_audio_is_not_an_error() {
        let host = MockHost::with_microphone()
            .failing_rate(44_100)
            .failing_rate(22_050);
        let (outcome, session) = run_probe(&host, &quick_config()).await;

        assert!(!outcome.is_captured());
        assert!(session.is_none());
        assert_eq!(host.live_streams(), 0);
    }

    #[tokio::test]
    async fn probe_without_input_devices_opens_nothing() {
        let host = MockHost::new(vec![RawDevice::new("Speakers", 0)]);
        let (outcome, session) = run_probe(&host, &quick_config()).await;

        assert_eq!(outcome, ProbeOutcome::NoInputDevice);
        assert!(session.is_none());
        assert_eq!(host.open_attempts(), 0);
    }

    #[tokio::test]
    async fn probe_with_zero_queue_capacity_is_no_audio() {
        let host = MockHost::with_microphone();
        let mut config = quick_config();
        config.capture.queue_capacity = 0;

        let (outcome, session) = run_probe(&host, &config).await;
        assert!(matches!(outcome, ProbeOutcome::NoAudio { .. }));
        assert!(session.is_none());
        assert_eq!(host.open_attempts(), 0);
    }

    #[tokio::test]
    async fn alternate_profile_runs_for_its_own_duration() {
        let host = MockHost::with_microphone().failing_rate(44_100);
        let mut config = ProbeConfig::default();
        config.capture.run_secs = 30.0;
        config.alternate.run_secs = Some(0.05);

        let started = std::time::Instant::now();
        let (outcome, _session) = run_probe(&host, &config).await;

        assert!(outcome.is_captured());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_secs(30));
    }

    #[test]
    fn outcome_serialises_with_a_tag() {
        let json = serde_json::to_value(ProbeOutcome::NoInputDevice).unwrap();
        assert_eq!(json["outcome"], "no_input_device");

        let outcome = ProbeOutcome::NoAudio {
            reason: "no device".into(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "no_audio");
        assert_eq!(json["reason"], "no device");

        let outcome = ProbeOutcome::Captured {
            config: CaptureConfig::alternate(),
            summary: CaptureSummary::default(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "captured");
        assert_eq!(json["config"]["sample_format"], "f32");
        assert_eq!(json["summary"]["blocks_received"], 0);
    }
}
