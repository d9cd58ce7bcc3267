// Application Layer - Use Cases and Background Tasks

pub mod audit;
pub mod constants;
pub mod flush;
pub mod registry;
mod shutdown;
pub mod validation;

// Re-exports
pub use audit::{AuditSink, AuditStats, AuditWriter};
pub use flush::{FlushFailure, FlushReport, FlushScheduler};
pub use registry::{DeleteOutcome, DequeueOutcome, QueueDetails, QueueRegistry, QueueSummary};
pub use shutdown::{shutdown_channel, ShutdownSender, ShutdownToken};
