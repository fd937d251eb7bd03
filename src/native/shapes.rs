//! ABI-faithful capability record shapes and canonical conversion.
//!
//! Four fixed-layout shapes are exchanged with the driver stack: narrow
//! and wide text variants for each direction. Direction and text encoding
//! are properties of the shape's identity, not runtime data, so each
//! shape fixes them statically through its [`NativeCaps`] impl and all
//! behavioral logic runs on the canonical [`DeviceCaps`].

use encoding_rs::Encoding;

use crate::caps::{DeviceCaps, Direction, OutputCaps};
use crate::encoding::{decode_narrow, decode_wide, encode_narrow, encode_wide};
use crate::error::ShapeError;

/// Fixed capacity of the embedded product-name buffer (`MAXPNAMELEN`).
pub const MAX_PNAME_LEN: usize = 32;

/// Narrow-text input capability record (`MIDIINCAPSA`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiInCapsA {
    /// Manufacturer identifier (`wMid`).
    pub manufacturer_id: u16,
    /// Product identifier (`wPid`).
    pub product_id: u16,
    /// Driver version (`vDriverVersion`).
    pub driver_version: u32,
    /// Null-terminated product name in the narrow encoding (`szPname`).
    pub name: [u8; MAX_PNAME_LEN],
    /// Reserved by the ABI (`dwSupport`); not part of the canonical record.
    pub support: u32,
}

/// Wide-text input capability record (`MIDIINCAPSW`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiInCapsW {
    /// Manufacturer identifier (`wMid`).
    pub manufacturer_id: u16,
    /// Product identifier (`wPid`).
    pub product_id: u16,
    /// Driver version (`vDriverVersion`).
    pub driver_version: u32,
    /// Null-terminated product name in UTF-16 (`szPname`).
    pub name: [u16; MAX_PNAME_LEN],
    /// Reserved by the ABI (`dwSupport`); not part of the canonical record.
    pub support: u32,
}

/// Narrow-text output capability record (`MIDIOUTCAPSA`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiOutCapsA {
    /// Manufacturer identifier (`wMid`).
    pub manufacturer_id: u16,
    /// Product identifier (`wPid`).
    pub product_id: u16,
    /// Driver version (`vDriverVersion`).
    pub driver_version: u32,
    /// Null-terminated product name in the narrow encoding (`szPname`).
    pub name: [u8; MAX_PNAME_LEN],
    /// Device technology class (`wTechnology`).
    pub technology: u16,
    /// Voice count (`wVoices`).
    pub voices: u16,
    /// Maximum simultaneous notes (`wNotes`).
    pub notes: u16,
    /// Responding channel bitmask (`wChannelMask`).
    pub channel_mask: u16,
    /// Optional functionality flags (`dwSupport`).
    pub support: u32,
}

/// Wide-text output capability record (`MIDIOUTCAPSW`).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MidiOutCapsW {
    /// Manufacturer identifier (`wMid`).
    pub manufacturer_id: u16,
    /// Product identifier (`wPid`).
    pub product_id: u16,
    /// Driver version (`vDriverVersion`).
    pub driver_version: u32,
    /// Null-terminated product name in UTF-16 (`szPname`).
    pub name: [u16; MAX_PNAME_LEN],
    /// Device technology class (`wTechnology`).
    pub technology: u16,
    /// Voice count (`wVoices`).
    pub voices: u16,
    /// Maximum simultaneous notes (`wNotes`).
    pub notes: u16,
    /// Responding channel bitmask (`wChannelMask`).
    pub channel_mask: u16,
    /// Optional functionality flags (`dwSupport`).
    pub support: u32,
}

/// Conversion between one native shape and the canonical record.
pub trait NativeCaps {
    /// Direction implied by the shape's ABI identity.
    const DIRECTION: Direction;

    /// Reads the native record into the canonical model.
    ///
    /// `ansi` is the narrow-text encoding; wide shapes ignore it. Numeric
    /// values are copied exactly.
    fn normalize(&self, ansi: &'static Encoding) -> DeviceCaps;

    /// Writes the canonical record back into the native buffer in place.
    ///
    /// The name is re-encoded into the shape's native text encoding,
    /// truncated to the fixed buffer with a terminating null, and the
    /// buffer tail is zero-filled. No heap allocation beyond transient
    /// encoding buffers.
    ///
    /// # Errors
    ///
    /// [`ShapeError::MissingOutputCaps`] when writing an output shape
    /// from a record without an output block; the buffer is left
    /// untouched in that case.
    fn write_back(&mut self, caps: &DeviceCaps, ansi: &'static Encoding) -> Result<(), ShapeError>;
}

impl NativeCaps for MidiInCapsA {
    const DIRECTION: Direction = Direction::Input;

    fn normalize(&self, ansi: &'static Encoding) -> DeviceCaps {
        DeviceCaps {
            direction: Self::DIRECTION,
            manufacturer_id: self.manufacturer_id,
            product_id: self.product_id,
            driver_version: self.driver_version,
            name: decode_narrow(&self.name, ansi),
            output: None,
        }
    }

    fn write_back(&mut self, caps: &DeviceCaps, ansi: &'static Encoding) -> Result<(), ShapeError> {
        self.manufacturer_id = caps.manufacturer_id;
        self.product_id = caps.product_id;
        self.driver_version = caps.driver_version;
        encode_narrow(&caps.name, &mut self.name, ansi);
        Ok(())
    }
}

impl NativeCaps for MidiInCapsW {
    const DIRECTION: Direction = Direction::Input;

    fn normalize(&self, _ansi: &'static Encoding) -> DeviceCaps {
        DeviceCaps {
            direction: Self::DIRECTION,
            manufacturer_id: self.manufacturer_id,
            product_id: self.product_id,
            driver_version: self.driver_version,
            name: decode_wide(&self.name),
            output: None,
        }
    }

    fn write_back(&mut self, caps: &DeviceCaps, _ansi: &'static Encoding) -> Result<(), ShapeError> {
        self.manufacturer_id = caps.manufacturer_id;
        self.product_id = caps.product_id;
        self.driver_version = caps.driver_version;
        encode_wide(&caps.name, &mut self.name);
        Ok(())
    }
}

impl NativeCaps for MidiOutCapsA {
    const DIRECTION: Direction = Direction::Output;

    fn normalize(&self, ansi: &'static Encoding) -> DeviceCaps {
        DeviceCaps {
            direction: Self::DIRECTION,
            manufacturer_id: self.manufacturer_id,
            product_id: self.product_id,
            driver_version: self.driver_version,
            name: decode_narrow(&self.name, ansi),
            output: Some(OutputCaps {
                technology: self.technology,
                voices: self.voices,
                notes: self.notes,
                channel_mask: self.channel_mask,
                support: self.support,
            }),
        }
    }

    fn write_back(&mut self, caps: &DeviceCaps, ansi: &'static Encoding) -> Result<(), ShapeError> {
        // Contract check before any mutation so a violation leaves the
        // native buffer untouched.
        let out = caps.output.ok_or(ShapeError::MissingOutputCaps)?;
        self.manufacturer_id = caps.manufacturer_id;
        self.product_id = caps.product_id;
        self.driver_version = caps.driver_version;
        encode_narrow(&caps.name, &mut self.name, ansi);
        self.technology = out.technology;
        self.voices = out.voices;
        self.notes = out.notes;
        self.channel_mask = out.channel_mask;
        self.support = out.support;
        Ok(())
    }
}

impl NativeCaps for MidiOutCapsW {
    const DIRECTION: Direction = Direction::Output;

    fn normalize(&self, _ansi: &'static Encoding) -> DeviceCaps {
        DeviceCaps {
            direction: Self::DIRECTION,
            manufacturer_id: self.manufacturer_id,
            product_id: self.product_id,
            driver_version: self.driver_version,
            name: decode_wide(&self.name),
            output: Some(OutputCaps {
                technology: self.technology,
                voices: self.voices,
                notes: self.notes,
                channel_mask: self.channel_mask,
                support: self.support,
            }),
        }
    }

    fn write_back(&mut self, caps: &DeviceCaps, _ansi: &'static Encoding) -> Result<(), ShapeError> {
        let out = caps.output.ok_or(ShapeError::MissingOutputCaps)?;
        self.manufacturer_id = caps.manufacturer_id;
        self.product_id = caps.product_id;
        self.driver_version = caps.driver_version;
        encode_wide(&caps.name, &mut self.name);
        self.technology = out.technology;
        self.voices = out.voices;
        self.notes = out.notes;
        self.channel_mask = out.channel_mask;
        self.support = out.support;
        Ok(())
    }
}
