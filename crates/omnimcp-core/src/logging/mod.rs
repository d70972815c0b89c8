//! Logging abstractions
//!
//! Library components take an `Arc<dyn Logger>`; the binary wires in
//! [`TracingLogger`] so everything ends up in the installed `tracing` subscriber.

mod traits;
mod noop;
mod tracing_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use tracing_logger::TracingLogger;
