//! The host audio subsystem seam.
//!
//! [`AudioHost`] is everything the inventory and the capture session need
//! from the platform: enumerate devices and open an input stream bound to a
//! [`CaptureConfig`] with a block callback.  [`crate::audio::CpalHost`] is
//! the production implementation; `MockHost` (tests only) simulates a host
//! whose delivery callback is driven by the test itself.

use thiserror::Error;

use super::session::CaptureConfig;

// ---------------------------------------------------------------------------
// Raw descriptors
// ---------------------------------------------------------------------------

/// A device as reported by the host, before inventory indexing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDevice {
    /// Display name.
    pub name: String,
    /// Largest channel count any supported input configuration offers.
    /// `0` for output-only devices.
    pub max_input_channels: u16,
}

impl RawDevice {
    pub fn new(name: impl Into<String>, max_input_channels: u16) -> Self {
        Self {
            name: name.into(),
            max_input_channels,
        }
    }
}

/// Delivery callback handed to [`AudioHost::open_input_stream`].
///
/// Invoked on the host's audio thread once per captured block with the
/// block's interleaved samples in native byte order.
pub type BlockCallback = Box<dyn FnMut(&[u8]) + Send + 'static>;

// ---------------------------------------------------------------------------
// HostError
// ---------------------------------------------------------------------------

/// Failures reported by the host audio subsystem.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to enumerate audio devices: {0}")]
    Devices(#[from] cpal::DevicesError),

    #[error("no default input device on the audio host")]
    NoDefaultDevice,

    #[error("device index {0} is not present on the audio host")]
    DeviceNotFound(usize),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to start audio stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("failed to pause audio stream: {0}")]
    PauseStream(#[from] cpal::PauseStreamError),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// An open input stream owned by a capture session.
pub trait InputStream {
    /// Begin (or resume) invoking the delivery callback.
    fn start(&mut self) -> Result<(), HostError>;

    /// Pause delivery.  The stream stays acquired until [`close`](Self::close).
    fn stop(&mut self) -> Result<(), HostError>;

    /// Release the OS stream and drop the delivery callback.
    fn close(self: Box<Self>);
}

/// The host audio subsystem.
pub trait AudioHost {
    /// All currently visible devices, in host order.
    fn enumerate(&self) -> Result<Vec<RawDevice>, HostError>;

    /// Acquire an input stream for `config`.  `config.device == None` lets
    /// the host pick its default input device.
    fn open_input_stream(
        &self,
        config: &CaptureConfig,
        callback: BlockCallback,
    ) -> Result<Box<dyn InputStream>, HostError>;
}

// Compile-time assertion: Box<dyn InputStream> must be constructible.
const _: fn() = || {
    fn _assert_object_safe(_: Box<dyn InputStream>, _: &dyn AudioHost) {}
};

#[cfg(test)]
pub use mock::MockHost;

// ---------------------------------------------------------------------------
// MockHost (tests only)
// ---------------------------------------------------------------------------


// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SampleFormat;

    fn mono_config(rate: u32) -> CaptureConfig {
        CaptureConfig {
            device: None,
            channels: 1,
            sample_rate: rate,
            sample_format: SampleFormat::I16,
            block_size: 256,
        }
    }

    #[test]
    fn host_error_messages_are_descriptive() {
        let err = HostError::DeviceNotFound(7);
        assert_eq!(err.to_string(), "device index 7 is not present on the audio host");

        let err: HostError = cpal::BuildStreamError::StreamConfigNotSupported.into();
        assert!(err.to_string().starts_with("failed to build input stream"));
    }

    #[test]
    fn mock_rejects_configured_rate() {
        let host = MockHost::with_microphone().failing_rate(48_000);
        let result = host.open_input_stream(&mono_config(48_000), Box::new(|_| {}));
        assert!(matches!(result, Err(HostError::BuildStream(_))));
        assert_eq!(host.open_attempts(), 1);
        assert_eq!(host.live_streams(), 0);
    }

    #[test]
    fn mock_delivers_only_while_started() {
        let host = MockHost::with_microphone();
        let mut stream = host
            .open_input_stream(&mono_config(16_000), Box::new(|_| {}))
            .unwrap();

        assert!(!host.deliver(&[0, 0]));
        stream.start().unwrap();
        assert!(host.deliver(&[0, 0]));
        stream.stop().unwrap();
        assert!(!host.deliver(&[0, 0]));

        stream.close();
        assert_eq!(host.live_streams(), 0);
    }
}
