//! Queue error types.

use common::CommandId;
use thiserror::Error;

/// Errors reported by a [`SerialCommandQueue`](crate::SerialCommandQueue).
///
/// Command failures are published on the error channel and never stop the
/// queue. [`QueueError::OwnerReleased`] is only ever returned to callers
/// submitting through a [`QueueHandle`](crate::QueueHandle); it is never
/// published.
#[derive(Debug, Error)]
pub enum QueueError<E> {
    /// The command's own logic returned an error.
    #[error("Command '{command}' ({command_id}) failed: {source}")]
    CommandExecution {
        command_id: CommandId,
        command: String,
        #[source]
        source: E,
    },

    /// The command panicked while executing.
    #[error("Command '{command}' ({command_id}) panicked: {message}")]
    CommandPanicked {
        command_id: CommandId,
        command: String,
        message: String,
    },

    /// The queue that owned the submission path has been dropped.
    #[error("Command queue has been released")]
    OwnerReleased,
}

impl<E> QueueError<E> {
    /// Returns the ID of the failed submission, if this error belongs to one.
    pub fn command_id(&self) -> Option<CommandId> {
        match self {
            QueueError::CommandExecution { command_id, .. }
            | QueueError::CommandPanicked { command_id, .. } => Some(*command_id),
            QueueError::OwnerReleased => None,
        }
    }

    /// Returns the name of the failed command, if this error belongs to one.
    pub fn command(&self) -> Option<&str> {
        match self {
            QueueError::CommandExecution { command, .. }
            | QueueError::CommandPanicked { command, .. } => Some(command),
            QueueError::OwnerReleased => None,
        }
    }

    /// Returns the error produced by the command itself, untouched.
    pub fn command_error(&self) -> Option<&E> {
        match self {
            QueueError::CommandExecution { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Returns true if the queue owner was released.
    pub fn is_owner_released(&self) -> bool {
        matches!(self, QueueError::OwnerReleased)
    }
}
