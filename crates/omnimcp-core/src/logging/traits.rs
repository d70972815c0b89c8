//! Logger trait definition

use std::sync::Arc;

/// Logger abstraction used by every long-lived component
///
/// Implementations:
/// - `NoOpLogger`: silent, for tests
/// - `TracingLogger`: forwards to the `tracing` facade
pub trait Logger: Send + Sync {
    fn debug(&self, message: &str);

    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);
}

/// Type alias for an Arc-wrapped logger
pub type SharedLogger = Arc<dyn Logger>;

/// Convenience macros for logging with format arguments
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(&format!($($arg)*))
    };
}
