//! User-facing error channel
//!
//! Cache and lookup operations never propagate recoverable failures to the
//! caller. Instead they report them through a [`Reporter`] and return a safe
//! default. The application decides where those messages end up.

use tracing::{error, warn};

/// Sink for warnings and errors the caller should surface to a user
pub trait Reporter: Send + Sync {
    /// Reports a recoverable problem (stale data, fallback in use)
    fn warning(&self, message: &str);

    /// Reports a failed operation
    fn error(&self, message: &str);
}

/// Reporter that forwards everything to `tracing`
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

impl Reporter for LogReporter {
    fn warning(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        error!("{}", message);
    }
}

#[cfg(test)]
pub(crate) use recording::RecordingReporter;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_reporter_keeps_channels_separate() {
        let reporter = RecordingReporter::default();
        reporter.warning("stale");
        reporter.error("broken");
        reporter.warning("again");

        assert_eq!(reporter.warnings(), vec!["stale", "again"]);
        assert_eq!(reporter.errors(), vec!["broken"]);
    }

    #[test]
    fn test_log_reporter_is_usable_as_trait_object() {
        let reporter: Box<dyn Reporter> = Box::new(LogReporter);
        // No subscriber installed; must not panic
        reporter.warning("warning");
        reporter.error("error");
    }
}
