//! Native driver boundary: ABI shapes, result codes, and the forwarding
//! trait.
//!
//! The mechanism by which calls reach the wrapper (export interposition)
//! and the forwarding to the stock entry points live in the host; the
//! wrapper only sees them through [`NativeDriver`]. Tests use the
//! in-crate [`MockDriver`].

mod mock;
mod shapes;

pub use mock::{MockDevice, MockDriver};
pub use shapes::{
    MidiInCapsA, MidiInCapsW, MidiOutCapsA, MidiOutCapsW, NativeCaps, MAX_PNAME_LEN,
};

use std::fmt;

use crate::caps::Direction;

/// Identifies a device to the native driver: a zero-based device index
/// for capability queries, or the value of an open device handle for
/// interface queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(pub usize);

impl DeviceId {
    /// The identifier as a table index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl From<usize> for DeviceId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Native multimedia result code (`MMRESULT`).
///
/// The wrapper never invents result semantics of its own: codes pass
/// through from the driver, except where an interface-name override
/// deliberately reports success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MmResult(pub u32);

impl MmResult {
    /// The call succeeded (`MMSYSERR_NOERROR`).
    pub const NO_ERROR: Self = Self(0);
    /// Unspecified failure (`MMSYSERR_ERROR`).
    pub const ERROR: Self = Self(1);
    /// The device identifier is out of range (`MMSYSERR_BADDEVICEID`).
    pub const BAD_DEVICE_ID: Self = Self(2);
    /// The function is not supported (`MMSYSERR_NOTSUPPORTED`).
    pub const NOT_SUPPORTED: Self = Self(8);
    /// An invalid parameter was passed (`MMSYSERR_INVALPARAM`).
    pub const INVAL_PARAM: Self = Self(11);

    /// Whether the code signals success.
    pub fn is_ok(self) -> bool {
        self == Self::NO_ERROR
    }

    /// Whether the code signals an error.
    pub fn is_error(self) -> bool {
        !self.is_ok()
    }
}

impl fmt::Display for MmResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Message code asking for the byte count of the device interface name
/// (`DRV_QUERYDEVICEINTERFACESIZE`).
pub const DRV_QUERY_DEVICE_INTERFACE_SIZE: u32 = 0x080C;

/// Message code asking for the device interface name itself
/// (`DRV_QUERYDEVICEINTERFACE`).
pub const DRV_QUERY_DEVICE_INTERFACE: u32 = 0x080D;

/// The real driver stack behind the wrapper.
///
/// The host's interposition layer implements this by forwarding each call
/// to the stock entry point it replaced. Implementations must be callable
/// from any thread; capability queries can arrive concurrently.
pub trait NativeDriver: Send + Sync {
    /// Narrow-text input capability query (`midiInGetDevCapsA`).
    fn in_caps_ansi(&self, device: DeviceId, caps: &mut MidiInCapsA) -> MmResult;

    /// Wide-text input capability query (`midiInGetDevCapsW`).
    fn in_caps_wide(&self, device: DeviceId, caps: &mut MidiInCapsW) -> MmResult;

    /// Narrow-text output capability query (`midiOutGetDevCapsA`).
    fn out_caps_ansi(&self, device: DeviceId, caps: &mut MidiOutCapsA) -> MmResult;

    /// Wide-text output capability query (`midiOutGetDevCapsW`).
    fn out_caps_wide(&self, device: DeviceId, caps: &mut MidiOutCapsW) -> MmResult;

    /// Native size phase of the interface query; writes the required
    /// byte count into `size`.
    fn interface_size(&self, direction: Direction, device: DeviceId, size: &mut u32) -> MmResult;

    /// Native data phase of the interface query; fills `buffer` (UTF-16
    /// code units) with the interface name.
    fn interface_name(&self, direction: Direction, device: DeviceId, buffer: &mut [u16])
        -> MmResult;

    /// Any other device message, forwarded verbatim.
    fn message(
        &self,
        direction: Direction,
        device: DeviceId,
        msg: u32,
        param1: usize,
        param2: usize,
    ) -> MmResult;
}
