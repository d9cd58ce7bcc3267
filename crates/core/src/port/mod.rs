// Port Layer - Interfaces for external dependencies

pub mod queue_store;
pub mod time_provider;

// Re-exports
pub use queue_store::QueueStore;
pub use time_provider::TimeProvider;
