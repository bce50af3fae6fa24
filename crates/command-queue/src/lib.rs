//! Strict FIFO serial execution of asynchronous commands.
//!
//! This crate provides:
//! - [`Command`] trait for asynchronous units of work over a state value
//! - [`SerialCommandQueue`] which runs commands one at a time, in submission
//!   order, and publishes results
//! - [`Subscription`] for observing the state and error channels
//! - [`QueueHandle`] for submitting without owning the queue
//!
//! ```text
//! submit(A) submit(B) submit(C)
//!     │         │         │
//!     ▼         ▼         ▼
//!   ┌─────────────────────────┐      Ok(state)  ──► state channel
//!   │  FIFO ─► worker (1 slot)│ ──►
//!   └─────────────────────────┘      Err(error) ──► error channel
//! ```

pub mod channel;
pub mod command;
pub mod config;
pub mod error;
pub mod queue;

pub use async_trait::async_trait;
pub use channel::Subscription;
pub use command::{Command, FnCommand, command_fn};
pub use common::CommandId;
pub use config::{DEFAULT_QUEUE_NAME, QueueConfig};
pub use error::QueueError;
pub use queue::{QueueHandle, SerialCommandQueue};
