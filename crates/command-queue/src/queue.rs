//! Serial command execution.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Instant;

use common::CommandId;
use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::Instrument;

use crate::channel::{ErrorChannel, StateChannel, Subscription};
use crate::command::Command;
use crate::config::QueueConfig;
use crate::error::QueueError;

/// A command accepted by the queue, waiting for its turn.
struct Submission<S, E> {
    id: CommandId,
    command: Box<dyn Command<S, E>>,
    accepted_at: Instant,
}

/// State owned by the queue. The worker task only ever holds a weak
/// reference, so dropping the queue tears everything down.
struct Shared<S, E> {
    name: String,
    states: StateChannel<S>,
    errors: ErrorChannel<Arc<QueueError<E>>>,
    sender: mpsc::UnboundedSender<Submission<S, E>>,
    /// Submissions accepted but not yet finished (queued + in flight).
    pending: watch::Sender<usize>,
}

impl<S, E> Shared<S, E> {
    fn enqueue(&self, command: Box<dyn Command<S, E>>) -> CommandId {
        let id = CommandId::new();
        let command_name = command.name().to_string();

        self.pending.send_modify(|count| *count += 1);
        let submission = Submission {
            id,
            command,
            accepted_at: Instant::now(),
        };

        if self.sender.send(submission).is_err() {
            // Only happens when the runtime shut the worker down.
            self.finish();
            tracing::warn!(
                queue = %self.name,
                command = %command_name,
                command_id = %id,
                "worker stopped, command dropped"
            );
            return id;
        }

        metrics::counter!("command_queue_submitted_total", "queue" => self.name.clone())
            .increment(1);
        self.record_pending();
        tracing::debug!(
            queue = %self.name,
            command = %command_name,
            command_id = %id,
            "command queued"
        );

        id
    }

    fn finish(&self) {
        self.pending
            .send_modify(|count| *count = count.saturating_sub(1));
        self.record_pending();
    }

    fn pending(&self) -> usize {
        *self.pending.borrow()
    }

    fn record_pending(&self) {
        metrics::gauge!("command_queue_pending", "queue" => self.name.clone())
            .set(self.pending() as f64);
    }
}

/// Executes commands strictly one at a time, in submission order, against a
/// shared state value.
///
/// Every successful command replaces the state and publishes it on the state
/// channel; every failure is published on the error channel and the queue
/// moves on to the next command. The state is never touched by commands
/// directly: each one gets a snapshot and the queue writes back the result.
///
/// Dropping the queue tears it down. A command that is still in flight runs
/// to completion, but its result is discarded and nothing is published;
/// queued commands that have not started are never executed.
pub struct SerialCommandQueue<S, E> {
    shared: Arc<Shared<S, E>>,
}

impl<S, E> SerialCommandQueue<S, E>
where
    S: Clone + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    /// Creates a queue starting from `initial` with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new(initial: S) -> Self {
        Self::with_config(initial, QueueConfig::default())
    }

    /// Creates a queue starting from `initial`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_config(initial: S, config: QueueConfig) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let (pending, _) = watch::channel(0);

        let shared = Arc::new(Shared {
            name: config.name,
            states: StateChannel::new(initial),
            errors: ErrorChannel::new(),
            sender,
            pending,
        });

        tokio::spawn(run_worker(
            Arc::downgrade(&shared),
            receiver,
            shared.name.clone(),
        ));
        tracing::debug!(queue = %shared.name, "command queue started");

        Self { shared }
    }

    /// Appends a command to the queue and returns immediately.
    ///
    /// The command starts as soon as every command submitted before it has
    /// finished. Its outcome is only observable through the channels.
    pub fn submit<C>(&self, command: C) -> CommandId
    where
        C: Command<S, E> + 'static,
    {
        self.shared.enqueue(Box::new(command))
    }

    /// Appends an already boxed command to the queue.
    pub fn submit_boxed(&self, command: Box<dyn Command<S, E>>) -> CommandId {
        self.shared.enqueue(command)
    }

    /// Subscribes to state updates.
    ///
    /// The subscription yields the current state immediately, then the new
    /// state after every successful command.
    pub fn observe_state(&self) -> Subscription<S> {
        self.shared.states.subscribe()
    }

    /// Subscribes to command failures, one item per failed command.
    pub fn observe_errors(&self) -> Subscription<Arc<QueueError<E>>> {
        self.shared.errors.subscribe()
    }

    /// Returns a snapshot of the latest published state.
    pub fn current_state(&self) -> S {
        self.shared.states.current()
    }

    /// Returns a non-owning handle that can submit commands from elsewhere.
    pub fn handle(&self) -> QueueHandle<S, E> {
        QueueHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Waits until every submitted command has finished.
    ///
    /// A command that never completes stalls this forever, just as it stalls
    /// the queue.
    pub async fn until_idle(&self) {
        let mut pending = self.shared.pending.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = pending.wait_for(|count| *count == 0).await;
    }
}

impl<S, E> SerialCommandQueue<S, E> {
    /// Returns the configured queue name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Returns the number of submitted commands that have not finished yet,
    /// including the one in flight.
    pub fn pending(&self) -> usize {
        self.shared.pending()
    }

    /// Returns true if no command is queued or running.
    pub fn is_idle(&self) -> bool {
        self.pending() == 0
    }
}

impl<S: Clone, E> std::fmt::Debug for SerialCommandQueue<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialCommandQueue")
            .field("name", &self.shared.name)
            .field("pending", &self.pending())
            .field("state_subscribers", &self.shared.states.subscriber_count())
            .field("error_subscribers", &self.shared.errors.subscriber_count())
            .finish()
    }
}

impl<S, E> Drop for SerialCommandQueue<S, E> {
    fn drop(&mut self) {
        // The worker may still hold a strong reference while it publishes.
        // Releasing the channels waits for that publish and blocks any later one.
        self.shared.states.release();
        self.shared.errors.release();
        tracing::debug!(
            queue = %self.shared.name,
            pending = self.shared.pending(),
            "command queue released"
        );
    }
}

/// A cloneable, non-owning submitter for a [`SerialCommandQueue`].
///
/// Handles do not keep the queue alive. Once the owning queue is dropped,
/// [`QueueHandle::submit`] fails with [`QueueError::OwnerReleased`].
pub struct QueueHandle<S, E> {
    shared: Weak<Shared<S, E>>,
}

impl<S, E> QueueHandle<S, E> {
    /// Appends a command to the owning queue.
    pub fn submit<C>(&self, command: C) -> Result<CommandId, QueueError<E>>
    where
        C: Command<S, E> + 'static,
    {
        self.submit_boxed(Box::new(command))
    }

    /// Appends an already boxed command to the owning queue.
    pub fn submit_boxed(
        &self,
        command: Box<dyn Command<S, E>>,
    ) -> Result<CommandId, QueueError<E>> {
        let shared = self.shared.upgrade().ok_or(QueueError::OwnerReleased)?;
        Ok(shared.enqueue(command))
    }

    /// Returns true once the owning queue has been dropped.
    pub fn is_released(&self) -> bool {
        self.shared.strong_count() == 0
    }
}

impl<S, E> Clone for QueueHandle<S, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Weak::clone(&self.shared),
        }
    }
}

impl<S, E> std::fmt::Debug for QueueHandle<S, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueHandle")
            .field("released", &self.is_released())
            .finish()
    }
}

/// Drains the submission FIFO one command at a time.
///
/// Liveness of the owner is checked before a command starts and again after
/// it finishes; if the owner is gone the result is dropped and the worker
/// exits.
async fn run_worker<S, E>(
    shared: Weak<Shared<S, E>>,
    mut receiver: mpsc::UnboundedReceiver<Submission<S, E>>,
    name: String,
) where
    S: Clone + Send + Sync + 'static,
    E: std::error::Error + Send + Sync + 'static,
{
    while let Some(submission) = receiver.recv().await {
        let Submission {
            id,
            command,
            accepted_at,
        } = submission;
        let command_name = command.name().to_string();
        let span = tracing::debug_span!(
            "command",
            queue = %name,
            command = %command_name,
            command_id = %id,
        );

        let Some(queue) = shared.upgrade() else {
            span.in_scope(|| tracing::debug!("queue released, command not started"));
            break;
        };
        let state = queue.states.current();
        drop(queue);

        span.in_scope(|| {
            tracing::debug!(
                waited_ms = accepted_at.elapsed().as_millis() as u64,
                "command started"
            );
        });
        let started = Instant::now();
        let outcome = AssertUnwindSafe(command.execute(state))
            .catch_unwind()
            .instrument(span.clone())
            .await;
        let elapsed = started.elapsed();
        drop(command);

        let Some(queue) = shared.upgrade() else {
            discard(&span, &name);
            break;
        };

        metrics::histogram!("command_queue_command_duration_seconds", "queue" => name.clone())
            .record(elapsed.as_secs_f64());

        let published = match outcome {
            Ok(Ok(new_state)) => {
                let published = queue.states.publish(new_state);
                if published {
                    metrics::counter!("command_queue_succeeded_total", "queue" => name.clone())
                        .increment(1);
                    tracing::debug!(
                        parent: &span,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "command completed"
                    );
                }
                published
            }
            Ok(Err(source)) => {
                tracing::warn!(parent: &span, error = %source, "command failed");
                let error = QueueError::CommandExecution {
                    command_id: id,
                    command: command_name,
                    source,
                };
                let published = queue.errors.publish(Arc::new(error));
                if published {
                    metrics::counter!("command_queue_failed_total", "queue" => name.clone())
                        .increment(1);
                }
                published
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::error!(parent: &span, panic = %message, "command panicked");
                let error = QueueError::CommandPanicked {
                    command_id: id,
                    command: command_name,
                    message,
                };
                let published = queue.errors.publish(Arc::new(error));
                if published {
                    metrics::counter!("command_queue_failed_total", "queue" => name.clone())
                        .increment(1);
                }
                published
            }
        };

        queue.finish();
        if !published {
            discard(&span, &name);
            break;
        }
    }

    tracing::debug!(queue = %name, "command queue worker stopped");
}

fn discard(span: &tracing::Span, name: &str) {
    tracing::debug!(
        parent: span,
        "queue released while command was in flight, result discarded"
    );
    metrics::counter!("command_queue_discarded_total", "queue" => name.to_string()).increment(1);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
