//! Canonical device capability model.
//!
//! The four native capability shapes all normalize into [`DeviceCaps`];
//! every behavioral decision (rule matching, rewriting, logging) is made
//! against this one record type.

use std::fmt;

use serde::Deserialize;

/// Whether a device record or query concerns an input or output device.
///
/// Direction determines which optional fields are valid: only output
/// devices carry the synthesizer capability block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum Direction {
    /// A MIDI input (capture) device.
    #[serde(rename = "in")]
    Input,
    /// A MIDI output (playback) device.
    #[serde(rename = "out")]
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Input => f.write_str("input"),
            Direction::Output => f.write_str("output"),
        }
    }
}

/// Capability fields reported only by output devices.
///
/// Grouping these in one struct keeps a partially-populated output field
/// set unrepresentable: a record either has the whole block or none of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OutputCaps {
    /// Device technology class (`wTechnology`).
    pub technology: u16,
    /// Number of voices the internal synthesizer supports (`wVoices`).
    pub voices: u16,
    /// Maximum simultaneous notes (`wNotes`).
    pub notes: u16,
    /// Bitmask of responding MIDI channels (`wChannelMask`).
    pub channel_mask: u16,
    /// Optional functionality flags (`dwSupport`).
    pub support: u32,
}

/// Canonical, encoding-independent representation of one device's
/// reported identity and capabilities.
///
/// `output` is `Some` exactly when `direction` is [`Direction::Output`];
/// the constructors maintain this invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceCaps {
    /// Which side of the MIDI stack the device sits on.
    pub direction: Direction,
    /// Manufacturer identifier (`wMid`).
    pub manufacturer_id: u16,
    /// Product identifier (`wPid`).
    pub product_id: u16,
    /// Driver version (`vDriverVersion`).
    pub driver_version: u32,
    /// Product name, decoded from the shape's native text encoding.
    pub name: String,
    /// Output-only capability block; present iff the device is an output.
    pub output: Option<OutputCaps>,
}

impl DeviceCaps {
    /// Creates an input-device record with the given product name.
    pub fn input(name: impl Into<String>) -> Self {
        Self {
            direction: Direction::Input,
            manufacturer_id: 0,
            product_id: 0,
            driver_version: 0,
            name: name.into(),
            output: None,
        }
    }

    /// Creates an output-device record with the given product name and
    /// output capability block.
    pub fn output(name: impl Into<String>, output: OutputCaps) -> Self {
        Self {
            direction: Direction::Output,
            manufacturer_id: 0,
            product_id: 0,
            driver_version: 0,
            name: name.into(),
            output: Some(output),
        }
    }

    /// Sets the manufacturer and product identifiers.
    #[must_use]
    pub fn with_ids(mut self, manufacturer_id: u16, product_id: u16) -> Self {
        self.manufacturer_id = manufacturer_id;
        self.product_id = product_id;
        self
    }

    /// Sets the driver version.
    #[must_use]
    pub fn with_driver_version(mut self, version: u32) -> Self {
        self.driver_version = version;
        self
    }
}

impl fmt::Display for DeviceCaps {
    /// One indented line per field, matching the trace-log layout.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  name: {}\n  man id: {}\n  prod id: {}\n  driver version: {}",
            self.name, self.manufacturer_id, self.product_id, self.driver_version
        )?;
        if let Some(out) = &self.output {
            write!(
                f,
                "\n  technology: {}\n  voices: {}\n  notes: {}\n  channel mask: {}\n  support: {}",
                out.technology, out.voices, out.notes, out.channel_mask, out.support
            )?;
        }
        Ok(())
    }
}
