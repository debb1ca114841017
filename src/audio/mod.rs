//! Audio capture core — device inventory → capture session → block queue.
//!
//! # Pipeline
//!
//! ```text
//! AudioHost::enumerate → list_input_devices → CaptureConfig
//!   → CaptureSession::open → host audio thread → BlockProducer::deliver
//!   → ring (drop-newest) → CaptureSession::drain / summary
//! ```
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use audio_probe::audio::{first_input_device, CaptureConfig, CaptureSession, CpalHost};
//!
//! let host = CpalHost::new();
//! let Some(device) = first_input_device(&host).unwrap() else {
//!     println!("no input device");
//!     return;
//! };
//!
//! let mut session = CaptureSession::open_new(&host, CaptureConfig::preferred(device.index), 64)
//!     .unwrap();
//! std::thread::sleep(std::time::Duration::from_secs(1));
//! session.stop();
//!
//! for block in session.drain() {
//!     println!("{} bytes", block.len());
//! }
//! ```

pub mod buffer;
pub mod capture;
pub mod device;
pub mod host;
pub mod session;

pub use buffer::{block_queue, AudioBlock, BlockConsumer, BlockProducer, CaptureSummary};
pub use capture::CpalHost;
pub use device::{
    find_input_device_by_name, first_input_device, list_devices, list_input_devices, AudioDevice,
};
pub use host::{AudioHost, BlockCallback, HostError, InputStream, RawDevice};
pub use session::{CaptureConfig, CaptureError, CaptureSession, SampleFormat, SessionState};

#[cfg(test)]
pub use host::MockHost;
