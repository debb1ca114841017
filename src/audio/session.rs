//! Capture session lifecycle.
//!
//! ```text
//! Idle ──open──▶ Opening ──acquired + started──▶ Running ──stop──▶ Stopped
//!                   │
//!                   └──validation / host failure──▶ Idle (last_error set)
//! ```
//!
//! A session owns at most one [`InputStream`] and the consumer half of its
//! block queue.  Sessions are not reentrant: once `Stopped`, construct a new
//! one.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::buffer::{block_queue, AudioBlock, BlockConsumer, CaptureSummary};
use super::host::{AudioHost, BlockCallback, HostError, InputStream};

// ---------------------------------------------------------------------------
// SampleFormat
// ---------------------------------------------------------------------------

/// Sample encoding requested from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleFormat {
    /// Signed 16-bit integer.
    I16,
    /// 32-bit float.
    F32,
}

impl SampleFormat {
    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::I16 => 2,
            SampleFormat::F32 => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SampleFormat::I16 => "i16",
            SampleFormat::F32 => "f32",
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureConfig
// ---------------------------------------------------------------------------

/// Parameters a stream is opened with.  Immutable once the session is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Device index from the current enumeration; `None` = host default.
    pub device: Option<usize>,
    pub channels: u16,
    /// Hz.
    pub sample_rate: u32,
    pub sample_format: SampleFormat,
    /// Frames per delivered block.
    pub block_size: u32,
}

impl CaptureConfig {
    /// Mono, 44.1 kHz, 16-bit, 2048-frame blocks on an explicit device.
    pub fn preferred(device: usize) -> Self {
        Self {
            device: Some(device),
            channels: 1,
            sample_rate: 44_100,
            sample_format: SampleFormat::I16,
            block_size: 2048,
        }
    }

    /// Mono, 22.05 kHz, float, 1024-frame blocks on the host default device.
    pub fn alternate() -> Self {
        Self {
            device: None,
            channels: 1,
            sample_rate: 22_050,
            sample_format: SampleFormat::F32,
            block_size: 1024,
        }
    }

    /// Reject values that can be ruled out without touching hardware.
    pub fn validate(&self) -> Result<(), CaptureError> {
        if self.channels == 0 {
            return Err(CaptureError::ConfigInvalid("channels must be >= 1".into()));
        }
        if self.sample_rate == 0 {
            return Err(CaptureError::ConfigInvalid("sample_rate must be > 0".into()));
        }
        if self.block_size == 0 {
            return Err(CaptureError::ConfigInvalid("block_size must be > 0".into()));
        }
        Ok(())
    }

    pub fn bytes_per_frame(&self) -> usize {
        self.channels as usize * self.sample_format.bytes_per_sample()
    }
}

impl std::fmt::Display for CaptureConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.device {
            Some(index) => write!(f, "device #{index}")?,
            None => write!(f, "default device")?,
        }
        write!(
            f,
            ", {} ch, {} Hz, {}, {} frames/block",
            self.channels,
            self.sample_rate,
            self.sample_format.label(),
            self.block_size
        )
    }
}

// ---------------------------------------------------------------------------
// CaptureError
// ---------------------------------------------------------------------------

/// Errors surfaced by the capture core.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    /// Caller-supplied parameters out of range.  Never reaches the host.
    #[error("invalid capture configuration: {0}")]
    ConfigInvalid(String),

    /// The host could not acquire or start the stream.
    #[error("audio device unavailable: {reason}")]
    DeviceUnavailable { reason: String },

    /// `open` was called while a stream is already open.
    #[error("capture session already has an open stream")]
    SessionBusy,

    /// `open` was called on a session that has been stopped.
    #[error("capture session has been stopped")]
    SessionStopped,

    /// Enumeration found no input-capable device; nothing was opened.
    #[error("no input-capable device found")]
    NoInputDevice,

    /// Both the preferred and the alternate configuration failed.
    #[error("audio capture unavailable (preferred: {preferred}; alternate: {alternate})")]
    CaptureUnavailable { preferred: String, alternate: String },
}

impl CaptureError {
    /// Whether the fallback policy may try the alternate configuration.
    pub fn is_fallback_eligible(&self) -> bool {
        matches!(
            self,
            CaptureError::ConfigInvalid(_) | CaptureError::DeviceUnavailable { .. }
        )
    }
}

impl From<HostError> for CaptureError {
    fn from(err: HostError) -> Self {
        CaptureError::DeviceUnavailable {
            reason: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// No OS resources held.
    #[default]
    Idle,
    /// Acquiring a stream.
    Opening,
    /// Stream open and delivering blocks.
    Running,
    /// Stream closed; queued blocks remain readable.
    Stopped,
}

impl SessionState {
    pub fn label(&self) -> &'static str {
        match self {
            SessionState::Idle => "Idle",
            SessionState::Opening => "Opening",
            SessionState::Running => "Running",
            SessionState::Stopped => "Stopped",
        }
    }
}

// ---------------------------------------------------------------------------
// CaptureSession
// ---------------------------------------------------------------------------

/// Owns one input stream and the consumer side of its block queue.
///
/// Not `Send`: the underlying `cpal::Stream` is not `Send` on every platform.
///
/// # Example
///
/// ```rust,no_run
/// use audio_probe::audio::{list_input_devices, CaptureConfig, CaptureSession, CpalHost};
///
/// let host = CpalHost::new();
/// let inputs = list_input_devices(&host).unwrap();
/// let Some((index, _name)) = inputs.first() else {
///     println!("no input device");
///     return;
/// };
///
/// let mut session = CaptureSession::new(64);
/// session.open(&host, CaptureConfig::preferred(*index)).unwrap();
/// std::thread::sleep(std::time::Duration::from_secs(1));
/// session.stop();
/// println!("{} blocks queued", session.queued());
/// ```
pub struct CaptureSession {
    state: SessionState,
    config: Option<CaptureConfig>,
    stream: Option<Box<dyn InputStream>>,
    queue: Option<BlockConsumer>,
    queue_capacity: usize,
    last_error: Option<CaptureError>,
}

impl CaptureSession {
    /// Create an idle session whose queue will hold `queue_capacity` blocks.
    ///
    /// # Panics
    ///
    /// Panics if `queue_capacity == 0`.  Use [`CaptureSession::try_new`] for
    /// capacities that come from user input.
    pub fn new(queue_capacity: usize) -> Self {
        assert!(queue_capacity > 0, "queue capacity must be > 0");
        Self {
            state: SessionState::Idle,
            config: None,
            stream: None,
            queue: None,
            queue_capacity,
            last_error: None,
        }
    }

    /// Fallible [`CaptureSession::new`].
    pub fn try_new(queue_capacity: usize) -> Result<Self, CaptureError> {
        if queue_capacity == 0 {
            return Err(CaptureError::ConfigInvalid(
                "queue_capacity must be > 0".into(),
            ));
        }
        Ok(Self::new(queue_capacity))
    }

    /// Construct a session and open it in one step.
    pub fn open_new<H: AudioHost + ?Sized>(
        host: &H,
        config: CaptureConfig,
        queue_capacity: usize,
    ) -> Result<Self, CaptureError> {
        let mut session = Self::try_new(queue_capacity)?;
        session.open(host, config)?;
        Ok(session)
    }

    /// Acquire and start an input stream bound to `config`.
    ///
    /// # Errors
    ///
    /// - [`CaptureError::SessionBusy`] if a stream is already open.
    /// - [`CaptureError::SessionStopped`] if the session was stopped.
    /// - [`CaptureError::ConfigInvalid`] for out-of-range parameters; the
    ///   host is not contacted.
    /// - [`CaptureError::DeviceUnavailable`] when the host fails to build or
    ///   start the stream.  The session reverts to `Idle`.
    pub fn open<H: AudioHost + ?Sized>(
        &mut self,
        host: &H,
        config: CaptureConfig,
    ) -> Result<(), CaptureError> {
        match self.state {
            SessionState::Idle => {}
            SessionState::Opening | SessionState::Running => {
                return Err(CaptureError::SessionBusy)
            }
            SessionState::Stopped => return Err(CaptureError::SessionStopped),
        }

        if let Err(err) = config.validate() {
            log::warn!("capture: rejected configuration ({config}): {err}");
            self.last_error = Some(err.clone());
            return Err(err);
        }

        self.state = SessionState::Opening;
        log::debug!("capture: opening {config}");

        match self.acquire(host, &config) {
            Ok((stream, queue)) => {
                log::info!("capture: running on {config}");
                self.stream = Some(stream);
                self.queue = Some(queue);
                self.config = Some(config);
                self.last_error = None;
                self.state = SessionState::Running;
                Ok(())
            }
            Err(err) => {
                log::warn!("capture: failed to open {config}: {err}");
                self.last_error = Some(err.clone());
                self.state = SessionState::Idle;
                Err(err)
            }
        }
    }

    fn acquire<H: AudioHost + ?Sized>(
        &self,
        host: &H,
        config: &CaptureConfig,
    ) -> Result<(Box<dyn InputStream>, BlockConsumer), CaptureError> {
        let (mut producer, queue) = block_queue(self.queue_capacity);
        let callback: BlockCallback = Box::new(move |data: &[u8]| {
            producer.deliver(data);
        });

        let mut stream = host.open_input_stream(config, callback)?;
        if let Err(err) = stream.start() {
            stream.close();
            return Err(err.into());
        }
        Ok((stream, queue))
    }

    /// Close the stream.  Idempotent; a no-op unless `Running`.
    ///
    /// Once this returns, no further block reaches the queue.
    pub fn stop(&mut self) {
        if self.state != SessionState::Running {
            return;
        }

        if let Some(queue) = &self.queue {
            queue.close();
        }
        if let Some(mut stream) = self.stream.take() {
            if let Err(err) = stream.stop() {
                log::warn!("capture: stream did not pause cleanly: {err}");
            }
            stream.close();
        }

        self.state = SessionState::Stopped;
        let summary = self.summary();
        log::info!(
            "capture: stopped ({} blocks, {} bytes, {} dropped)",
            summary.blocks_received,
            summary.bytes_received,
            summary.blocks_dropped
        );
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    /// Configuration of the open (or last open) stream.
    pub fn config(&self) -> Option<&CaptureConfig> {
        self.config.as_ref()
    }

    /// The error from the most recent failed `open`, if any.
    pub fn last_error(&self) -> Option<&CaptureError> {
        self.last_error.as_ref()
    }

    /// Pop the oldest queued block.
    pub fn try_recv(&mut self) -> Option<AudioBlock> {
        self.queue.as_mut().and_then(BlockConsumer::try_recv)
    }

    /// Pop every queued block, oldest first.
    pub fn drain(&mut self) -> Vec<AudioBlock> {
        self.queue
            .as_mut()
            .map(BlockConsumer::drain)
            .unwrap_or_default()
    }

    /// Return a consumed block's buffer so the callback can refill it.
    pub fn recycle(&mut self, block: AudioBlock) {
        if let Some(queue) = self.queue.as_mut() {
            queue.recycle(block);
        }
    }

    /// Blocks waiting to be read.
    pub fn queued(&self) -> usize {
        self.queue.as_ref().map_or(0, BlockConsumer::len)
    }

    /// Delivery totals so far.  All zero before the first successful open.
    pub fn summary(&self) -> CaptureSummary {
        self.queue
            .as_ref()
            .map(BlockConsumer::summary)
            .unwrap_or_default()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.stop();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
