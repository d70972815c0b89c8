//! `tracing`-backed logger

use super::traits::Logger;

/// Forwards [`Logger`] calls to the `tracing` macros
///
/// The `component` is recorded as a structured field so subscribers can filter
/// on it alongside the module target.
#[derive(Debug, Clone)]
pub struct TracingLogger {
    component: String,
}

impl Default for TracingLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl TracingLogger {
    pub fn new() -> Self {
        Self::with_component("omnimcp")
    }

    pub fn with_component(component: impl Into<String>) -> Self {
        Self {
            component: component.into(),
        }
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(component = %self.component, "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(component = %self.component, "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(component = %self.component, "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(component = %self.component, "{}", message);
    }
}
