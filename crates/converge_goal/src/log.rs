//! Trace sinks for the evaluation engine.
//!
//! The engine emits one line per evaluation event through the injected
//! [`SeekLogger`]. The default sink is [`NopLogger`], so the library stays
//! silent unless the host opts in; [`RecordingLogger`] captures the trace
//! for assertions, and `TracingLogger` (behind the `tracing` feature)
//! forwards to the `tracing` ecosystem.

use std::sync::Arc;

use parking_lot::Mutex;

/// A sink for the engine's trace output.
pub trait SeekLogger: Send + Sync {
    /// Receives one formatted trace line per evaluation event.
    fn info(&self, message: &str);
}

/// The default sink: discards every line.
#[derive(Debug, Default, Clone, Copy)]
pub struct NopLogger;

impl SeekLogger for NopLogger {
    fn info(&self, _message: &str) {}
}

/// A sink that records every line for later inspection.
///
/// Clones share the same buffer, so a host can keep one handle and hand
/// another to the [`Seeker`](crate::seeker::Seeker).
#[derive(Debug, Default, Clone)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    /// Creates an empty recording sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded lines, in emission order.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Drains and returns the recorded lines.
    pub fn take(&self) -> Vec<String> {
        core::mem::take(&mut self.lines.lock())
    }
}

impl SeekLogger for RecordingLogger {
    fn info(&self, message: &str) {
        self.lines.lock().push(message.to_owned());
    }
}

/// A sink that forwards every line to [`tracing::info!`].
#[cfg(feature = "tracing")]
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

#[cfg(feature = "tracing")]
impl SeekLogger for TracingLogger {
    fn info(&self, message: &str) {
        tracing::info!(target: "converge", "{message}");
    }
}
