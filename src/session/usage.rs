//! Usage accounting hook.
//!
//! Quota tracking lives outside the learning core.  The session only calls
//! [`UsageRecorder::record`] once per entry into the reading phase; the
//! implementation must return immediately and swallow its own failures so a
//! slow or broken accounting backend never blocks a phase transition.

/// Fire-and-forget "one unit of usage" sink.
pub trait UsageRecorder: Send + Sync {
    fn record(&self);
}

/// Recorder used when accounting is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopUsage;

impl UsageRecorder for NoopUsage {
    fn record(&self) {
        log::trace!("usage: accounting disabled, nothing recorded");
    }
}
