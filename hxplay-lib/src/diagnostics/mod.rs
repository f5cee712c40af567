//! Event log and status reporting.

pub mod events;
pub mod reporter;

pub use events::{LogBuffer, LogEntry, LogKind, LogSink};
pub use reporter::Reporter;
