//! Host audio subsystem via `cpal`.
//!
//! [`CpalHost`] wraps the default cpal host.  Device indices are positions in
//! `cpal::Host::devices()`, so they are only meaningful within one
//! enumeration pass; [`AudioHost::open_input_stream`] re-enumerates to find
//! the device.  Each stream converts the cpal sample slice into native-endian
//! bytes in a scratch buffer reused across callbacks, then hands it to the
//! block callback.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::host::{AudioHost, BlockCallback, HostError, InputStream, RawDevice};
use super::session::{CaptureConfig, SampleFormat};

// ---------------------------------------------------------------------------
// CpalHost
// ---------------------------------------------------------------------------

/// The platform's default audio host.
pub struct CpalHost {
    host: cpal::Host,
}

impl CpalHost {
    pub fn new() -> Self {
        Self {
            host: cpal::default_host(),
        }
    }

    /// Backend name (e.g. "ALSA", "CoreAudio", "WASAPI").
    pub fn name(&self) -> &'static str {
        self.host.id().name()
    }

    fn resolve(&self, index: Option<usize>) -> Result<cpal::Device, HostError> {
        match index {
            Some(index) => self
                .host
                .devices()?
                .nth(index)
                .ok_or(HostError::DeviceNotFound(index)),
            None => self
                .host
                .default_input_device()
                .ok_or(HostError::NoDefaultDevice),
        }
    }
}

impl Default for CpalHost {
    fn default() -> Self {
        Self::new()
    }
}

/// Largest channel count across the device's input configurations.
fn max_input_channels(device: &cpal::Device) -> u16 {
    device
        .supported_input_configs()
        .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

impl AudioHost for CpalHost {
    fn enumerate(&self) -> Result<Vec<RawDevice>, HostError> {
        let devices = self
            .host
            .devices()?
            .map(|device| RawDevice {
                name: device.name().unwrap_or_else(|_| "unknown".into()),
                max_input_channels: max_input_channels(&device),
            })
            .collect();
        Ok(devices)
    }

    fn open_input_stream(
        &self,
        config: &CaptureConfig,
        callback: BlockCallback,
    ) -> Result<Box<dyn InputStream>, HostError> {
        let device = self.resolve(config.device)?;
        let dev_name = device.name().unwrap_or_else(|_| "unknown".into());
        log::debug!("cpal: building input stream on {dev_name:?} ({config})");

        let stream_config = cpal::StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(config.block_size),
        };

        let stream = match config.sample_format {
            SampleFormat::I16 => build_stream::<i16>(&device, &stream_config, callback)?,
            SampleFormat::F32 => build_stream::<f32>(&device, &stream_config, callback)?,
        };

        Ok(Box::new(CpalStream { stream }))
    }
}

// ---------------------------------------------------------------------------
// Stream construction
// ---------------------------------------------------------------------------

/// Samples that can be laid out as native-endian bytes.
trait NativeBytes: Copy {
    type Bytes: AsRef<[u8]>;

    fn native_bytes(self) -> Self::Bytes;
}

impl NativeBytes for i16 {
    type Bytes = [u8; 2];

    fn native_bytes(self) -> [u8; 2] {
        self.to_ne_bytes()
    }
}

impl NativeBytes for f32 {
    type Bytes = [u8; 4];

    fn native_bytes(self) -> [u8; 4] {
        self.to_ne_bytes()
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut callback: BlockCallback,
) -> Result<cpal::Stream, HostError>
where
    T: cpal::SizedSample + NativeBytes + Send + 'static,
{
    let mut scratch: Vec<u8> = Vec::new();

    let stream = device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            scratch.clear();
            for &sample in data {
                scratch.extend_from_slice(sample.native_bytes().as_ref());
            }
            callback(&scratch);
        },
        |err: cpal::StreamError| {
            log::error!("cpal stream error: {err}");
        },
        None, // no timeout
    )?;

    Ok(stream)
}

// ---------------------------------------------------------------------------
// CpalStream
// ---------------------------------------------------------------------------

/// Owns the `cpal::Stream`; dropping it releases the hardware stream.
struct CpalStream {
    stream: cpal::Stream,
}

impl InputStream for CpalStream {
    fn start(&mut self) -> Result<(), HostError> {
        self.stream.play()?;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), HostError> {
        self.stream.pause()?;
        Ok(())
    }

    fn close(self: Box<Self>) {
        drop(self.stream);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
