//! Query interception: the read-normalize-rewrite-write-back cycle for
//! capability queries and the two-phase interface-identifier protocol.
//!
//! One [`Interceptor`] is built at process configuration time and shared
//! by every hooked entry point. The rule snapshot it carries is immutable,
//! so queries from any number of threads proceed without locking.

use std::sync::Arc;

use encoding_rs::{Encoding, WINDOWS_1252};

use crate::caps::Direction;
use crate::diag::TraceLog;
use crate::encoding::{decode_wide, encode_wide};
use crate::engine::RuleSet;
use crate::native::{
    DeviceId, MidiInCapsA, MidiInCapsW, MidiOutCapsA, MidiOutCapsW, MmResult, NativeCaps,
    NativeDriver,
};

/// A device message dispatched through the generic message entry points.
///
/// The two interface-identifier codes are handled by the wrapper; any
/// other message forwards verbatim to the driver. The host's FFI layer is
/// responsible for turning raw message parameters into this type (and for
/// the pointer handling that implies).
#[derive(Debug)]
pub enum DeviceMessage<'a> {
    /// `DRV_QUERYDEVICEINTERFACESIZE`: report the byte count the caller
    /// must allocate for the interface name.
    QueryInterfaceSize(&'a mut u32),
    /// `DRV_QUERYDEVICEINTERFACE`: fill the caller's UTF-16 buffer with
    /// the interface name.
    QueryInterface(&'a mut [u16]),
    /// Any other message, forwarded unmodified.
    Other {
        /// The native message code.
        msg: u32,
        /// First message parameter.
        param1: usize,
        /// Second message parameter.
        param2: usize,
    },
}

/// Intercepts capability and interface-identifier queries, rewriting
/// results according to the configured rules.
///
/// Capability queries call through to the real driver first, so native
/// error codes and untouched fields are the baseline; the buffer is
/// rewritten only when at least one rule matched. Interface queries
/// resolve an override per phase (see [`Self::interface_size_query`]).
pub struct Interceptor<D> {
    driver: D,
    rules: Arc<RuleSet>,
    ansi: &'static Encoding,
    trace: TraceLog,
}

impl<D: NativeDriver> Interceptor<D> {
    /// Wraps `driver` with the given rule snapshot.
    ///
    /// The narrow-text encoding defaults to Windows-1252; see
    /// [`Self::with_ansi_encoding`].
    pub fn new(driver: D, rules: impl Into<Arc<RuleSet>>) -> Self {
        Self {
            driver,
            rules: rules.into(),
            ansi: WINDOWS_1252,
            trace: TraceLog::disabled(),
        }
    }

    /// Sets the encoding used for the narrow-text (`*_ansi`) entry
    /// points. Explicit rather than read from the process locale, so
    /// conversion is deterministic.
    #[must_use]
    pub fn with_ansi_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.ansi = encoding;
        self
    }

    /// Attaches the human-readable trace sink.
    #[must_use]
    pub fn with_trace(mut self, trace: TraceLog) -> Self {
        self.trace = trace;
        self
    }

    /// The active rule snapshot.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The wrapped driver.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Intercepted `midiInGetDevCapsA`.
    pub fn in_caps_ansi(&self, device: DeviceId, caps: &mut MidiInCapsA) -> MmResult {
        let rc = self.driver.in_caps_ansi(device, caps);
        self.rewrite_caps(device, caps, rc)
    }

    /// Intercepted `midiInGetDevCapsW`.
    pub fn in_caps_wide(&self, device: DeviceId, caps: &mut MidiInCapsW) -> MmResult {
        let rc = self.driver.in_caps_wide(device, caps);
        self.rewrite_caps(device, caps, rc)
    }

    /// Intercepted `midiOutGetDevCapsA`.
    pub fn out_caps_ansi(&self, device: DeviceId, caps: &mut MidiOutCapsA) -> MmResult {
        let rc = self.driver.out_caps_ansi(device, caps);
        self.rewrite_caps(device, caps, rc)
    }

    /// Intercepted `midiOutGetDevCapsW`.
    pub fn out_caps_wide(&self, device: DeviceId, caps: &mut MidiOutCapsW) -> MmResult {
        let rc = self.driver.out_caps_wide(device, caps);
        self.rewrite_caps(device, caps, rc)
    }

    /// Shared read-normalize-rewrite-write-back cycle.
    ///
    /// The native return code always passes through unchanged; rewriting
    /// runs only when the native call succeeded, and a write-back
    /// contract violation leaves the native buffer untouched.
    fn rewrite_caps<S: NativeCaps>(&self, device: DeviceId, raw: &mut S, rc: MmResult) -> MmResult {
        if !rc.is_ok() {
            self.trace.emit(format_args!(
                "request for {} device #{device} capabilities failed natively (rc {rc}), leaving untouched",
                S::DIRECTION
            ));
            return rc;
        }
        let mut caps = raw.normalize(self.ansi);
        self.trace.emit(format_args!(
            "request for {} device #{device} capabilities:\n{caps}",
            S::DIRECTION
        ));
        if self.rules.apply_all(&mut caps) {
            match raw.write_back(&caps, self.ansi) {
                Ok(()) => self.trace.emit(format_args!(
                    "--> matched a replace rule, returning:\n{caps}"
                )),
                Err(error) => {
                    tracing::error!(%error, device = %device, "capability write-back skipped");
                }
            }
        }
        rc
    }

    /// Intercepted `midiInMessage`.
    pub fn in_message(&self, device: DeviceId, message: DeviceMessage<'_>) -> MmResult {
        self.device_message(Direction::Input, device, message)
    }

    /// Intercepted `midiOutMessage`.
    pub fn out_message(&self, device: DeviceId, message: DeviceMessage<'_>) -> MmResult {
        self.device_message(Direction::Output, device, message)
    }

    fn device_message(
        &self,
        direction: Direction,
        device: DeviceId,
        message: DeviceMessage<'_>,
    ) -> MmResult {
        match message {
            DeviceMessage::QueryInterfaceSize(size) => {
                self.interface_size_query(direction, device, size)
            }
            DeviceMessage::QueryInterface(buffer) => {
                self.interface_data_query(direction, device, buffer)
            }
            DeviceMessage::Other { msg, param1, param2 } => {
                self.driver.message(direction, device, msg, param1, param2)
            }
        }
    }

    /// Size phase of the interface-identifier query.
    ///
    /// Issues the native size query (kept as the fallback), resolves an
    /// override independently, and reports `(units(override) + 1) * 2`
    /// bytes when an override exists, or the native size unchanged when
    /// none does. No state is carried to the data phase: both phases
    /// resolve independently, which keeps long-lived device handles free
    /// of staleness but means the two phases could disagree if the rule
    /// set were ever mutated between them.
    pub fn interface_size_query(
        &self,
        direction: Direction,
        device: DeviceId,
        size: &mut u32,
    ) -> MmResult {
        let mut native_size = 0u32;
        let rc = self.driver.interface_size(direction, device, &mut native_size);
        self.trace.emit(format_args!(
            "interface size query for {direction} device #{device}: rc {rc} (is error: {}), native size {native_size}",
            u32::from(rc.is_error())
        ));
        match self.resolve_interface_override(direction, device) {
            Some(name) => {
                let new_size = utf16_byte_len(&name);
                self.trace.emit(format_args!(
                    "--> matched a replace rule, reporting size {new_size} of: {name}"
                ));
                *size = new_size;
                MmResult::NO_ERROR
            }
            None => {
                self.trace.emit(format_args!("--> no match, returning native result"));
                *size = native_size;
                rc
            }
        }
    }

    /// Data phase of the interface-identifier query.
    ///
    /// Issues the native data query (kept as the fallback), resolves an
    /// override independently with the same device and direction, and on
    /// a match writes the override truncated to `buffer`'s capacity in
    /// UTF-16 code units with a terminating null always inside the
    /// capacity. Without a match the natively-populated buffer and return
    /// code pass through untouched.
    pub fn interface_data_query(
        &self,
        direction: Direction,
        device: DeviceId,
        buffer: &mut [u16],
    ) -> MmResult {
        let rc = self.driver.interface_name(direction, device, buffer);
        self.trace.emit(format_args!(
            "interface name query for {direction} device #{device}: rc {rc} (is error: {}), native result: {}",
            u32::from(rc.is_error()),
            decode_wide(buffer)
        ));
        match self.resolve_interface_override(direction, device) {
            Some(name) => {
                if buffer.is_empty() {
                    return MmResult::INVAL_PARAM;
                }
                encode_wide(&name, buffer);
                self.trace.emit(format_args!(
                    "--> matched a replace rule, returning: {}",
                    decode_wide(buffer)
                ));
                MmResult::NO_ERROR
            }
            None => {
                self.trace.emit(format_args!("--> no match, returning native result"));
                rc
            }
        }
    }

    /// Resolves the interface-name override for one device: issues the
    /// unmodified wide capability query and runs first-match resolution
    /// against the normalized record.
    ///
    /// Intentionally independent of capability rewriting; capability
    /// fields and interface identifiers are separate native queries. A
    /// failed capability query offers no trustworthy record, so it
    /// resolves to no override.
    fn resolve_interface_override(
        &self,
        direction: Direction,
        device: DeviceId,
    ) -> Option<String> {
        let caps = match direction {
            Direction::Input => {
                let mut raw = MidiInCapsW::default();
                let rc = self.driver.in_caps_wide(device, &mut raw);
                if !rc.is_ok() {
                    self.trace.emit(format_args!(
                        "--> transparent capability query for device #{device} failed (rc {rc}), no match"
                    ));
                    return None;
                }
                raw.normalize(self.ansi)
            }
            Direction::Output => {
                let mut raw = MidiOutCapsW::default();
                let rc = self.driver.out_caps_wide(device, &mut raw);
                if !rc.is_ok() {
                    self.trace.emit(format_args!(
                        "--> transparent capability query for device #{device} failed (rc {rc}), no match"
                    ));
                    return None;
                }
                raw.normalize(self.ansi)
            }
        };
        self.trace.emit(format_args!(
            "--> transparently queried the {direction} device #{device} for interface resolution, found:\n{caps}"
        ));
        self.rules.interface_override(&caps).map(str::to_owned)
    }
}

fn utf16_byte_len(name: &str) -> u32 {
    ((name.encode_utf16().count() + 1) * std::mem::size_of::<u16>()) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::native::{MockDevice, MockDriver};
    use crate::rule::RuleSpec;

    fn rules(specs: Vec<RuleSpec>) -> RuleSet {
        RuleSet::new(
            specs
                .into_iter()
                .map(|s| s.compile().expect("rule should compile"))
                .collect(),
        )
    }

    #[test]
    fn test_rewrite_runs_only_on_native_success() {
        let driver = MockDriver::new().failing_with(MmResult::BAD_DEVICE_ID);
        let wrapper = Interceptor::new(
            driver,
            rules(vec![RuleSpec {
                replace_name: Some("Renamed".into()),
                ..RuleSpec::default()
            }]),
        );
        let mut caps = MidiInCapsW::default();
        assert_eq!(
            wrapper.in_caps_wide(DeviceId(0), &mut caps),
            MmResult::BAD_DEVICE_ID
        );
        assert_eq!(caps, MidiInCapsW::default());
    }

    #[test]
    fn test_unmatched_query_passes_buffer_through() {
        let driver = MockDriver::new().with_input(MockDevice::input("Real Device"));
        let wrapper = Interceptor::new(
            driver,
            rules(vec![RuleSpec {
                match_name: Some("Something Else".into()),
                replace_name: Some("Renamed".into()),
                ..RuleSpec::default()
            }]),
        );

        let mut seen = MidiInCapsW::default();
        assert!(wrapper.in_caps_wide(DeviceId(0), &mut seen).is_ok());

        let mut native = MidiInCapsW::default();
        wrapper.driver().in_caps_wide(DeviceId(0), &mut native);
        assert_eq!(seen, native);
    }

    #[test]
    fn test_utf16_byte_len() {
        assert_eq!(utf16_byte_len(""), 2);
        assert_eq!(utf16_byte_len("abc"), 8);
    }

    #[test]
    fn test_other_messages_forward_to_driver() {
        let driver = MockDriver::new().with_input(MockDevice::input("dev"));
        let wrapper = Interceptor::new(driver, RuleSet::default());
        let rc = wrapper.in_message(
            DeviceId(0),
            DeviceMessage::Other {
                msg: 0x3B0,
                param1: 0,
                param2: 0,
            },
        );
        assert_eq!(rc, MmResult::NOT_SUPPORTED);
    }
}
