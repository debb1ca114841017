//! Device inventory.
//!
//! Indices are positions in a single enumeration pass and are only valid
//! until the next call.  Anything persisted should refer to a device by name
//! and re-resolve it with [`find_input_device_by_name`].

use serde::Serialize;

use super::host::{AudioHost, HostError};

/// Snapshot of one host device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioDevice {
    pub index: usize,
    pub name: String,
    pub max_input_channels: u16,
}

impl AudioDevice {
    /// Only devices with at least one input channel are capture candidates.
    pub fn is_input(&self) -> bool {
        self.max_input_channels > 0
    }
}

/// Every visible device, in host order.
pub fn list_devices<H: AudioHost + ?Sized>(host: &H) -> Result<Vec<AudioDevice>, HostError> {
    let devices = host
        .enumerate()?
        .into_iter()
        .enumerate()
        .map(|(index, raw)| AudioDevice {
            index,
            name: raw.name,
            max_input_channels: raw.max_input_channels,
        })
        .collect();
    Ok(devices)
}

/// `(index, name)` of every input-capable device, order preserved.
///
/// An empty result is not an error; callers must handle "no candidate".
pub fn list_input_devices<H: AudioHost + ?Sized>(
    host: &H,
) -> Result<Vec<(usize, String)>, HostError> {
    Ok(list_devices(host)?
        .into_iter()
        .filter(AudioDevice::is_input)
        .map(|d| (d.index, d.name))
        .collect())
}

/// The first input-capable device, or `None` if there is none.
pub fn first_input_device<H: AudioHost + ?Sized>(
    host: &H,
) -> Result<Option<AudioDevice>, HostError> {
    Ok(list_devices(host)?.into_iter().find(AudioDevice::is_input))
}

/// Re-resolve an input device by its display name.
pub fn find_input_device_by_name<H: AudioHost + ?Sized>(
    host: &H,
    name: &str,
) -> Result<Option<AudioDevice>, HostError> {
    Ok(list_devices(host)?
        .into_iter()
        .find(|d| d.is_input() && d.name == name))
}
