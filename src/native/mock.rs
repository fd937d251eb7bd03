//! Deterministic in-memory driver for testing without a real multimedia
//! stack.
//!
//! [`MockDriver`] answers capability and interface queries from a fixed
//! device table, making the full interception path testable in CI. Query
//! counters expose how often the wrapper touched the driver.

use std::sync::atomic::{AtomicUsize, Ordering};

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::caps::{DeviceCaps, Direction, OutputCaps};
use crate::encoding::encode_wide;

use super::shapes::{MidiInCapsA, MidiInCapsW, MidiOutCapsA, MidiOutCapsW, NativeCaps};
use super::{DeviceId, MmResult, NativeDriver};

/// One simulated device: the capabilities its driver reports plus its
/// device interface name.
#[derive(Debug, Clone)]
pub struct MockDevice {
    /// Capabilities returned by the four capability queries.
    pub caps: DeviceCaps,
    /// Interface name returned by the two-phase interface query.
    pub interface_name: String,
}

impl MockDevice {
    /// Creates a device from a canonical record with a derived interface
    /// name.
    pub fn new(caps: DeviceCaps) -> Self {
        let interface_name = format!("\\\\?\\mock#{}", caps.name);
        Self {
            caps,
            interface_name,
        }
    }

    /// Input device with the given product name.
    pub fn input(name: &str) -> Self {
        Self::new(DeviceCaps::input(name))
    }

    /// Output device with the given product name and a default output
    /// capability block.
    pub fn output(name: &str) -> Self {
        Self::new(DeviceCaps::output(name, OutputCaps::default()))
    }

    /// Sets the manufacturer and product identifiers.
    #[must_use]
    pub fn with_ids(mut self, manufacturer_id: u16, product_id: u16) -> Self {
        self.caps.manufacturer_id = manufacturer_id;
        self.caps.product_id = product_id;
        self
    }

    /// Sets the driver version.
    #[must_use]
    pub fn with_driver_version(mut self, version: u32) -> Self {
        self.caps.driver_version = version;
        self
    }

    /// Sets the output capability block (output devices).
    #[must_use]
    pub fn with_output_caps(mut self, output: OutputCaps) -> Self {
        if self.caps.direction == Direction::Output {
            self.caps.output = Some(output);
        }
        self
    }

    /// Sets the native interface name.
    #[must_use]
    pub fn with_interface_name(mut self, name: impl Into<String>) -> Self {
        self.interface_name = name.into();
        self
    }
}

/// An in-memory [`NativeDriver`] backed by a fixed device table.
///
/// Device ids index into the input and output tables separately, matching
/// how the native API numbers each direction from zero.
///
/// # Example
///
/// ```
/// use midi_rename::{DeviceId, MidiInCapsW, MockDevice, MockDriver, NativeDriver};
///
/// let driver = MockDriver::new().with_input(MockDevice::input("USB MIDI"));
///
/// let mut caps = MidiInCapsW::default();
/// assert!(driver.in_caps_wide(DeviceId(0), &mut caps).is_ok());
/// assert_eq!(driver.caps_queries(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MockDriver {
    inputs: Vec<MockDevice>,
    outputs: Vec<MockDevice>,
    forced_result: Option<MmResult>,
    caps_queries: AtomicUsize,
    interface_queries: AtomicUsize,
}

impl MockDriver {
    /// Creates an empty driver; every query reports `BAD_DEVICE_ID`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an input device; its id is the current input count.
    #[must_use]
    pub fn with_input(mut self, device: MockDevice) -> Self {
        self.inputs.push(device);
        self
    }

    /// Adds an output device; its id is the current output count.
    #[must_use]
    pub fn with_output(mut self, device: MockDevice) -> Self {
        self.outputs.push(device);
        self
    }

    /// Makes every native call fail with `result`, simulating a broken
    /// driver. Buffers are never written while forced.
    #[must_use]
    pub fn failing_with(mut self, result: MmResult) -> Self {
        self.forced_result = Some(result);
        self
    }

    /// Number of capability queries the driver has served.
    pub fn caps_queries(&self) -> usize {
        self.caps_queries.load(Ordering::SeqCst)
    }

    /// Number of interface size/data queries the driver has served.
    pub fn interface_queries(&self) -> usize {
        self.interface_queries.load(Ordering::SeqCst)
    }

    fn device(&self, direction: Direction, device: DeviceId) -> Option<&MockDevice> {
        let table = match direction {
            Direction::Input => &self.inputs,
            Direction::Output => &self.outputs,
        };
        table.get(device.index())
    }

    fn caps_query<S: NativeCaps>(
        &self,
        direction: Direction,
        device: DeviceId,
        raw: &mut S,
        ansi: &'static Encoding,
    ) -> MmResult {
        self.caps_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(forced) = self.forced_result {
            return forced;
        }
        let Some(entry) = self.device(direction, device) else {
            return MmResult::BAD_DEVICE_ID;
        };
        match raw.write_back(&entry.caps, ansi) {
            Ok(()) => MmResult::NO_ERROR,
            Err(_) => MmResult::ERROR,
        }
    }
}

impl NativeDriver for MockDriver {
    fn in_caps_ansi(&self, device: DeviceId, caps: &mut MidiInCapsA) -> MmResult {
        self.caps_query(Direction::Input, device, caps, WINDOWS_1252)
    }

    fn in_caps_wide(&self, device: DeviceId, caps: &mut MidiInCapsW) -> MmResult {
        self.caps_query(Direction::Input, device, caps, WINDOWS_1252)
    }

    fn out_caps_ansi(&self, device: DeviceId, caps: &mut MidiOutCapsA) -> MmResult {
        self.caps_query(Direction::Output, device, caps, WINDOWS_1252)
    }

    fn out_caps_wide(&self, device: DeviceId, caps: &mut MidiOutCapsW) -> MmResult {
        self.caps_query(Direction::Output, device, caps, WINDOWS_1252)
    }

    fn interface_size(&self, direction: Direction, device: DeviceId, size: &mut u32) -> MmResult {
        self.interface_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(forced) = self.forced_result {
            return forced;
        }
        let Some(entry) = self.device(direction, device) else {
            return MmResult::BAD_DEVICE_ID;
        };
        let units = entry.interface_name.encode_utf16().count() + 1;
        *size = (units * std::mem::size_of::<u16>()) as u32;
        MmResult::NO_ERROR
    }

    fn interface_name(
        &self,
        direction: Direction,
        device: DeviceId,
        buffer: &mut [u16],
    ) -> MmResult {
        self.interface_queries.fetch_add(1, Ordering::SeqCst);
        if let Some(forced) = self.forced_result {
            return forced;
        }
        let Some(entry) = self.device(direction, device) else {
            return MmResult::BAD_DEVICE_ID;
        };
        encode_wide(&entry.interface_name, buffer);
        MmResult::NO_ERROR
    }

    fn message(
        &self,
        _direction: Direction,
        _device: DeviceId,
        _msg: u32,
        _param1: usize,
        _param2: usize,
    ) -> MmResult {
        MmResult::NOT_SUPPORTED
    }
}
