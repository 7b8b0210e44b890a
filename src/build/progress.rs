use tracing::info;

/// Receives progress updates from a running build.
pub trait ProgressSink {
    /// Overall completion, `0..=100`.
    fn set_percent(&mut self, percent: u8);

    /// A status line for the user.
    fn status(&mut self, message: &str);
}

/// Forwards progress to `tracing` at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn set_percent(&mut self, percent: u8) {
        info!(percent, "mesh build progress");
    }

    fn status(&mut self, message: &str) {
        info!("{message}");
    }
}

/// Discards all progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {
    fn set_percent(&mut self, _percent: u8) {}

    fn status(&mut self, _message: &str) {}
}
