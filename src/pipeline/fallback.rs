//! Two-tier open policy: preferred profile, then exactly one alternate.
//!
//! ```text
//! no input-capable device ──▶ NoInputDevice  (nothing opened)
//!
//! resolve(preferred) → open ──ok──▶ Running
//!          │ ConfigInvalid / DeviceUnavailable
//!          ▼
//! resolve(alternate) → open ──ok──▶ Running
//!          │ any failure
//!          ▼
//!   CaptureUnavailable  (terminal, never retried)
//! ```
//!
//! Each profile is attempted at most once.  Device enumeration is a
//! point-in-time snapshot, so repeating an identical attempt within the same
//! run is not expected to change the result.

use crate::audio::{
    find_input_device_by_name, first_input_device, AudioHost, CaptureConfig, CaptureError,
    CaptureSession,
};
use crate::config::{DeviceChoice, ProbeConfig, ProfileConfig};

/// Turn a profile into a concrete [`CaptureConfig`] against the current
/// enumeration.
///
/// A device that cannot be resolved is reported as
/// [`CaptureError::DeviceUnavailable`] without calling the host's open.
pub fn resolve_profile<H: AudioHost + ?Sized>(
    host: &H,
    profile: &ProfileConfig,
) -> Result<CaptureConfig, CaptureError> {
    let device = match &profile.device {
        DeviceChoice::Default => None,
        DeviceChoice::FirstInput => {
            let device = first_input_device(host)?.ok_or_else(|| {
                CaptureError::DeviceUnavailable {
                    reason: "no input-capable device found".into(),
                }
            })?;
            log::debug!(
                "fallback: first input device is #{} {:?}",
                device.index,
                device.name
            );
            Some(device.index)
        }
        DeviceChoice::Name(name) => {
            let device = find_input_device_by_name(host, name)?.ok_or_else(|| {
                CaptureError::DeviceUnavailable {
                    reason: format!("input device {name:?} not found"),
                }
            })?;
            Some(device.index)
        }
    };
    Ok(profile.to_capture_config(device))
}

/// Open a session with the preferred profile, falling back once to the
/// alternate profile.
///
/// # Errors
///
/// - [`CaptureError::ConfigInvalid`] if `capture.queue_capacity` is zero.
/// - [`CaptureError::NoInputDevice`] if enumeration lists no input-capable
///   device.  Neither profile is attempted.
/// - [`CaptureError::CaptureUnavailable`], carrying both failure reasons.
///
/// Callers should treat the last two as "proceed without audio".
pub fn open_with_fallback<H: AudioHost + ?Sized>(
    host: &H,
    config: &ProbeConfig,
) -> Result<CaptureSession, CaptureError> {
    open_profiles(host, config).map(|(session, _)| session)
}

/// [`open_with_fallback`], also returning the profile that opened.
pub(crate) fn open_profiles<'a, H: AudioHost + ?Sized>(
    host: &H,
    config: &'a ProbeConfig,
) -> Result<(CaptureSession, &'a ProfileConfig), CaptureError> {
    let mut session = CaptureSession::try_new(config.capture.queue_capacity)?;
    ensure_input_device(host)?;

    let preferred = match attempt(host, &mut session, &config.preferred) {
        Ok(()) => return Ok((session, &config.preferred)),
        Err(err) => err,
    };

    if !preferred.is_fallback_eligible() {
        return Err(CaptureError::CaptureUnavailable {
            preferred: preferred.to_string(),
            alternate: "not attempted".into(),
        });
    }
    log::warn!("fallback: preferred configuration failed ({preferred}); trying alternate");

    match attempt(host, &mut session, &config.alternate) {
        Ok(()) => {
            log::info!("fallback: alternate configuration in use");
            Ok((session, &config.alternate))
        }
        Err(alternate) => {
            log::error!("fallback: alternate configuration failed too ({alternate})");
            Err(CaptureError::CaptureUnavailable {
                preferred: preferred.to_string(),
                alternate: alternate.to_string(),
            })
        }
    }
}

/// Fail fast when the inventory has no input-capable device.
///
/// An enumeration error is not treated as "no device": the profiles are
/// still attempted and report their own failures.
fn ensure_input_device<H: AudioHost + ?Sized>(host: &H) -> Result<(), CaptureError> {
    match first_input_device(host) {
        Ok(Some(_)) => Ok(()),
        Ok(None) => {
            log::warn!("fallback: no input-capable device found; not opening a stream");
            Err(CaptureError::NoInputDevice)
        }
        Err(err) => {
            log::warn!("fallback: device enumeration failed ({err}); trying profiles anyway");
            Ok(())
        }
    }
}

fn attempt<H: AudioHost + ?Sized>(
    host: &H,
    session: &mut CaptureSession,
    profile: &ProfileConfig,
) -> Result<(), CaptureError> {
    let capture = resolve_profile(host, profile)?;
    session.open(host, capture)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
