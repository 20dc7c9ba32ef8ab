//! Injected logging capability for the locking subsystem.
//!
//! The lock manager emits diagnostics at acquisition attempts, successes,
//! failures, and cleanup, but owns neither formatting nor destinations.
//! Callers pass a `Logger` explicitly; the binary wires in `TracingLogger`,
//! tests typically use `NullLogger`.

/// Leveled diagnostic sink.
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn error(&self, message: &str);
}

/// Forwards messages to the `tracing` macros.
///
/// The subscriber (destination, filtering, format) is configured once in
/// `main`; this type carries no state of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!("{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!("{message}");
    }

    fn error(&self, message: &str) {
        tracing::error!("{message}");
    }
}

/// Discards all messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn debug(&self, _message: &str) {}

    fn info(&self, _message: &str) {}

    fn error(&self, _message: &str) {}
}
