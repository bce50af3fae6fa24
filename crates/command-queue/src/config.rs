//! Queue configuration.

/// Name used when none is configured.
pub const DEFAULT_QUEUE_NAME: &str = "command-queue";

/// Configuration for a [`SerialCommandQueue`](crate::SerialCommandQueue).
///
/// The name labels every tracing span and metric the queue emits, so several
/// queues can run side by side in one process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueConfig {
    pub name: String,
}

impl QueueConfig {
    /// Creates a configuration with the given queue name.
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_QUEUE_NAME.to_string(),
        }
    }
}
