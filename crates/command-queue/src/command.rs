//! The unit of work executed by the queue.

use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

/// An asynchronous unit of work that turns one state snapshot into the next.
///
/// The queue hands each command a snapshot of the current state by value and
/// expects either the replacement state or an error back. Commands never see
/// or write the shared state directly; the queue publishes whatever they
/// return.
///
/// A command may suspend for as long as it likes (network calls, timers).
/// The queue invokes `execute` at most once per submission and never retries.
#[async_trait]
pub trait Command<S, E>: Send + Sync {
    /// Returns a human-readable name used in logs, metrics and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Produces the next state from the current one.
    async fn execute(&self, state: S) -> Result<S, E>;
}

/// A [`Command`] built from a closure. See [`command_fn`].
pub struct FnCommand<F, Fut> {
    name: String,
    f: F,
    _future: PhantomData<fn() -> Fut>,
}

/// Wraps an async closure as a named command.
///
/// ```ignore
/// queue.submit(command_fn("increment", |n: u32| async move { Ok::<_, MyError>(n + 1) }));
/// ```
pub fn command_fn<S, E, F, Fut>(name: impl Into<String>, f: F) -> FnCommand<F, Fut>
where
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S, E>> + Send,
{
    FnCommand {
        name: name.into(),
        f,
        _future: PhantomData,
    }
}

#[async_trait]
impl<S, E, F, Fut> Command<S, E> for FnCommand<F, Fut>
where
    S: Send + 'static,
    E: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = Result<S, E>> + Send,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, state: S) -> Result<S, E> {
        (self.f)(state).await
    }
}

impl<F, Fut> std::fmt::Debug for FnCommand<F, Fut> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCommand")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("negative")]
    struct Negative;

    struct Double;

    #[async_trait]
    impl Command<i64, Negative> for Double {
        async fn execute(&self, state: i64) -> Result<i64, Negative> {
            if state < 0 {
                return Err(Negative);
            }
            Ok(state * 2)
        }
    }

    #[tokio::test]
    async fn test_default_name_is_type_name() {
        assert!(Double.name().ends_with("Double"));
        assert_eq!(Double.execute(21).await.unwrap(), 42);
        assert!(Double.execute(-1).await.is_err());
    }

    #[tokio::test]
    async fn test_fn_command_runs_closure() {
        let cmd = command_fn("add-one", |n: i64| async move { Ok::<_, Negative>(n + 1) });
        let cmd: &dyn Command<i64, Negative> = &cmd;

        assert_eq!(cmd.name(), "add-one");
        assert_eq!(cmd.execute(1).await.unwrap(), 2);
        assert_eq!(cmd.execute(1).await.unwrap(), 2);
    }

    #[test]
    fn test_fn_command_debug_shows_name() {
        let cmd = command_fn("noop", |n: i64| async move { Ok::<_, Negative>(n) });
        assert!(format!("{cmd:?}").contains("noop"));
    }
}
