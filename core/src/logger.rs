//! Pluggable logging for the client.
//!
//! The client only logs its own failures on the multipart path and the
//! names of the methods it calls; parameter values and file contents are
//! never logged.

use std::fmt;

/// Leveled logging sink injected into a `Client`.
pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
    /// Unleveled output, for hosts that want everything in one stream.
    fn print(&self, args: fmt::Arguments<'_>);
    fn warn(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
}

/// Discards every record. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NopLogger;

impl Logger for NopLogger {
    fn debug(&self, _args: fmt::Arguments<'_>) {}
    fn info(&self, _args: fmt::Arguments<'_>) {}
    fn print(&self, _args: fmt::Arguments<'_>) {}
    fn warn(&self, _args: fmt::Arguments<'_>) {}
    fn error(&self, _args: fmt::Arguments<'_>) {}
}

/// Forwards to the `log` facade under the `tgbot` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicLogger;

impl Logger for BasicLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        log::debug!(target: "tgbot", "{args}");
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        log::info!(target: "tgbot", "{args}");
    }

    fn print(&self, args: fmt::Arguments<'_>) {
        log::info!(target: "tgbot", "{args}");
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        log::warn!(target: "tgbot", "{args}");
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        log::error!(target: "tgbot", "{args}");
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Keeps every record as `"level: message"`.
    #[derive(Default)]
    pub(crate) struct RecordingLogger {
        pub(crate) records: Mutex<Vec<String>>,
    }

    impl RecordingLogger {
        fn push(&self, level: &str, args: fmt::Arguments<'_>) {
            self.records.lock().unwrap().push(format!("{level}: {args}"));
        }

        pub(crate) fn lines(&self) -> Vec<String> {
            self.records.lock().unwrap().clone()
        }
    }

    impl Logger for RecordingLogger {
        fn debug(&self, args: fmt::Arguments<'_>) {
            self.push("debug", args);
        }
        fn info(&self, args: fmt::Arguments<'_>) {
            self.push("info", args);
        }
        fn print(&self, args: fmt::Arguments<'_>) {
            self.push("print", args);
        }
        fn warn(&self, args: fmt::Arguments<'_>) {
            self.push("warn", args);
        }
        fn error(&self, args: fmt::Arguments<'_>) {
            self.push("error", args);
        }
    }

    #[test]
    fn nop_and_basic_loggers_accept_records() {
        let loggers: [&dyn Logger; 2] = [&NopLogger, &BasicLogger];
        for logger in loggers {
            logger.debug(format_args!("debug {}", 1));
            logger.info(format_args!("info"));
            logger.print(format_args!("print"));
            logger.warn(format_args!("warn"));
            logger.error(format_args!("error {}", "x"));
        }
    }

    #[test]
    fn recording_logger_keeps_levels() {
        let logger = RecordingLogger::default();
        logger.warn(format_args!("slow {}", "call"));
        logger.error(format_args!("failed"));
        assert_eq!(logger.lines(), ["warn: slow call", "error: failed"]);
    }
}
