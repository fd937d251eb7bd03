//! Human-readable trace sink.
//!
//! The wrapper emits one line per significant event — incoming query with
//! its normalized contents, which rules matched, the resulting values —
//! so that why a field was or was not rewritten can be reconstructed
//! after the fact. Lines always go to `tracing`; when a trace file is
//! configured they are also appended there. Queries run on whatever
//! thread the application used, so file writes happen whole-line under a
//! lock and never interleave.

use std::fmt;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

/// Cloneable handle to the diagnostic trace sink.
///
/// Cloning is cheap; all clones share the same file and lock.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    file: Option<Arc<Mutex<BufWriter<File>>>>,
}

impl TraceLog {
    /// A sink that only emits `tracing` events.
    pub fn disabled() -> Self {
        Self { file: None }
    }

    /// A sink that additionally appends one line per event to `path`.
    ///
    /// The file is created (or truncated) immediately; each run starts a
    /// fresh log.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be created.
    pub fn to_file(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            file: Some(Arc::new(Mutex::new(BufWriter::new(file)))),
        })
    }

    /// Whether a trace file is attached.
    pub fn has_file(&self) -> bool {
        self.file.is_some()
    }

    /// Emits one trace line.
    ///
    /// File errors are swallowed: diagnostics must never affect the
    /// intercepted call.
    pub(crate) fn emit(&self, line: fmt::Arguments<'_>) {
        tracing::debug!(target: "midi_rename::trace", "{}", line);
        if let Some(file) = &self.file {
            let mut writer = file.lock();
            let _ = writeln!(writer, "{line}");
            let _ = writer.flush();
        }
    }
}
