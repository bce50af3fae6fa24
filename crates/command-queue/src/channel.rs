//! State and error channels.
//!
//! Both channels fan out to per-subscriber unbounded buffers, so a slow
//! subscriber never loses or skips a value and never slows the queue down.

use std::pin::Pin;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::mpsc;

/// A revocable subscription to one of the queue's channels.
///
/// Dropping the subscription (or calling [`Subscription::close`]) detaches
/// it; the queue prunes it on the next publish. Once the owning queue is
/// released the subscription yields whatever was already delivered and then
/// ends.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Waits for the next value. Returns `None` once the channel has ended.
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Returns the next already-delivered value without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Takes every value delivered so far.
    pub fn drain(&mut self) -> Vec<T> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }

    /// Stops receiving new values. Values already delivered can still be read.
    pub fn close(&mut self) {
        self.receiver.close();
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.get_mut().receiver.poll_recv(cx)
    }
}

/// Subscriber senders plus the released flag. Both are only touched under
/// the owning channel's mutex, so a release and a broadcast never interleave.
struct Subscribers<T> {
    senders: Vec<mpsc::UnboundedSender<T>>,
    released: bool,
}

impl<T: Clone> Subscribers<T> {
    fn new() -> Self {
        Self {
            senders: Vec::new(),
            released: false,
        }
    }

    fn add(&mut self, initial: Option<T>) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        if let Some(value) = initial {
            // The receiver is alive right here, so this cannot fail.
            let _ = sender.send(value);
        }
        if !self.released {
            self.senders.push(sender);
        }
        Subscription { receiver }
    }

    /// Returns false, sending nothing, once the channel has been released.
    fn broadcast(&mut self, value: &T) -> bool {
        if self.released {
            return false;
        }
        self.senders.retain(|sender| sender.send(value.clone()).is_ok());
        true
    }

    fn live(&mut self) -> usize {
        self.senders.retain(|sender| !sender.is_closed());
        self.senders.len()
    }
}

impl<T> Subscribers<T> {
    fn release(&mut self) {
        self.released = true;
        self.senders.clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Current-value channel: always holds the latest state and replays it to
/// every new subscriber before any later update.
pub(crate) struct StateChannel<S> {
    inner: Mutex<StateInner<S>>,
}

struct StateInner<S> {
    current: S,
    subscribers: Subscribers<S>,
}

impl<S: Clone> StateChannel<S> {
    pub(crate) fn new(initial: S) -> Self {
        Self {
            inner: Mutex::new(StateInner {
                current: initial,
                subscribers: Subscribers::new(),
            }),
        }
    }

    pub(crate) fn subscribe(&self) -> Subscription<S> {
        let mut inner = lock(&self.inner);
        let current = inner.current.clone();
        inner.subscribers.add(Some(current))
    }

    /// Publishes a new state. Returns false if the channel was released, in
    /// which case neither subscribers nor the current value change.
    pub(crate) fn publish(&self, state: S) -> bool {
        let mut inner = lock(&self.inner);
        if !inner.subscribers.broadcast(&state) {
            return false;
        }
        inner.current = state;
        true
    }

    pub(crate) fn current(&self) -> S {
        lock(&self.inner).current.clone()
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.live()
    }
}

impl<S> StateChannel<S> {
    /// Ends every subscription and refuses all later publishes. Blocks until
    /// a publish in progress has finished.
    pub(crate) fn release(&self) {
        lock(&self.inner).subscribers.release();
    }
}

/// Pass-through channel: subscribers see only values published after they
/// subscribed.
pub(crate) struct ErrorChannel<T> {
    subscribers: Mutex<Subscribers<T>>,
}

impl<T: Clone> ErrorChannel<T> {
    pub(crate) fn new() -> Self {
        Self {
            subscribers: Mutex::new(Subscribers::new()),
        }
    }

    pub(crate) fn subscribe(&self) -> Subscription<T> {
        lock(&self.subscribers).add(None)
    }

    /// Returns false if the channel was released.
    pub(crate) fn publish(&self, value: T) -> bool {
        lock(&self.subscribers).broadcast(&value)
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        lock(&self.subscribers).live()
    }
}

impl<T> ErrorChannel<T> {
    pub(crate) fn release(&self) {
        lock(&self.subscribers).release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;

    #[test]
    fn test_state_subscriber_gets_current_value_first() {
        let channel = StateChannel::new(1u32);
        channel.publish(2);

        let mut sub = channel.subscribe();
        channel.publish(3);

        assert_eq!(sub.drain(), vec![2, 3]);
        assert_eq!(channel.current(), 3);
    }

    #[test]
    fn test_state_subscribers_each_see_every_update() {
        let channel = StateChannel::new(0u32);
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        for value in 1..=3 {
            channel.publish(value);
        }

        assert_eq!(first.drain(), vec![0, 1, 2, 3]);
        assert_eq!(second.drain(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_error_subscriber_sees_only_later_values() {
        let channel = ErrorChannel::new();
        channel.publish("early");

        let mut sub = channel.subscribe();
        channel.publish("late");

        assert_eq!(sub.drain(), vec!["late"]);
    }

    #[test]
    fn test_dropped_subscription_is_pruned() {
        let channel = ErrorChannel::new();
        let kept = channel.subscribe();
        let dropped = channel.subscribe();
        assert_eq!(channel.subscriber_count(), 2);

        drop(dropped);
        channel.publish(1u8);

        assert_eq!(channel.subscriber_count(), 1);
        drop(kept);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[test]
    fn test_closed_subscription_keeps_delivered_values() {
        let channel = StateChannel::new("a");
        let mut sub = channel.subscribe();
        channel.publish("b");

        sub.close();
        channel.publish("c");

        assert_eq!(sub.drain(), vec!["a", "b"]);
        assert_eq!(channel.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_release_ends_subscriptions_and_refuses_publish() {
        let states = StateChannel::new(1u32);
        let errors = ErrorChannel::new();
        let state_sub = states.subscribe();
        let mut error_sub = errors.subscribe();
        assert!(states.publish(2));
        assert!(errors.publish("before"));

        states.release();
        errors.release();

        assert!(!states.publish(3));
        assert!(!errors.publish("after"));
        assert_eq!(states.current(), 2);
        assert_eq!(states.subscriber_count(), 0);

        let values: Vec<u32> = state_sub.collect().await;
        assert_eq!(values, vec![1, 2]);
        assert_eq!(error_sub.recv().await, Some("before"));
        assert_eq!(error_sub.recv().await, None);
    }

    #[tokio::test]
    async fn test_subscription_ends_when_channel_dropped() {
        let channel = StateChannel::new(7u32);
        let sub = channel.subscribe();
        channel.publish(8);
        drop(channel);

        let values: Vec<u32> = sub.collect().await;
        assert_eq!(values, vec![7, 8]);
    }
}
