//! # midi-rename
//!
//! Rule-driven rewriting of MIDI device capability and interface-name
//! queries.
//!
//! `midi-rename` sits between an application and the real multimedia
//! driver stack and rewrites what device queries report: product names,
//! manufacturer/product ids, driver versions, output synthesizer fields,
//! and the separately-queried device interface name. The caller sees the
//! same buffer shapes, sizes and return codes it would get from the real
//! stack; only the values change, and only where a configured rule says
//! so.
//!
//! The export-forwarding shim that routes calls here is the host's
//! concern — this crate sees the real driver only through the
//! [`NativeDriver`] trait, which also makes the whole path testable
//! against the in-crate [`MockDriver`].
//!
//! ## Quick Start
//!
//! ```
//! use encoding_rs::WINDOWS_1252;
//! use midi_rename::{
//!     DeviceId, Interceptor, MidiInCapsW, MockDevice, MockDriver, NativeCaps, RuleSet, RuleSpec,
//! };
//!
//! let rule = RuleSpec {
//!     match_name: Some("USB MIDI.*".into()),
//!     replace_name: Some("Virtual Piano".into()),
//!     ..RuleSpec::default()
//! }
//! .compile()
//! .expect("valid rule");
//!
//! let driver = MockDriver::new().with_input(MockDevice::input("USB MIDI Interface"));
//! let wrapper = Interceptor::new(driver, RuleSet::new(vec![rule]));
//!
//! let mut caps = MidiInCapsW::default();
//! let rc = wrapper.in_caps_wide(DeviceId(0), &mut caps);
//! assert!(rc.is_ok());
//! assert_eq!(caps.normalize(WINDOWS_1252).name, "Virtual Piano");
//! ```
//!
//! ## Architecture
//!
//! - Four ABI shapes (narrow/wide text × input/output) normalize into one
//!   canonical record; all rule logic runs on the canonical form.
//! - The ordered rule list is built once at startup, immutable after, and
//!   shared lock-free by concurrent queries.
//! - The two-phase interface-name protocol (size query, then data query)
//!   resolves its override independently in each phase; nothing is cached
//!   between the calls.

#![warn(missing_docs)]

mod caps;
mod config;
mod diag;
mod encoding;
mod engine;
mod error;
mod intercept;
pub mod native;
mod rule;

pub use caps::{DeviceCaps, Direction, OutputCaps};
pub use config::{Config, CONFIG_FILE_ENV, DEFAULT_CONFIG_FILE, LOG_FILE_ENV};
pub use diag::TraceLog;
pub use engine::RuleSet;
pub use error::{ConfigError, RuleError, ShapeError};
pub use intercept::{DeviceMessage, Interceptor};
pub use native::{
    DeviceId, MidiInCapsA, MidiInCapsW, MidiOutCapsA, MidiOutCapsW, MmResult, MockDevice,
    MockDriver, NativeCaps, NativeDriver,
};
pub use rule::{Rule, RuleSpec};
