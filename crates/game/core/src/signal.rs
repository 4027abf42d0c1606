//! Per-entity observer lists.
//!
//! A [`Signal`] is owned by the entity that raises it (an inventory, an equipment
//! map, a character). Emitting with no subscribers does nothing.

use core::fmt;

/// Handle returned by [`Signal::subscribe`], used to unsubscribe later.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u32);

type Subscriber<E> = Box<dyn FnMut(&E) + Send>;

pub struct Signal<E> {
    subscribers: Vec<(SubscriptionId, Subscriber<E>)>,
    next_id: u32,
}

impl<E> Signal<E> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
            next_id: 0,
        }
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&E) + Send + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.push((id, Box::new(subscriber)));
        id
    }

    /// Returns false if the subscription was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sub, _)| *sub != id);
        self.subscribers.len() != before
    }

    pub fn emit(&mut self, event: &E) {
        for (_, subscriber) in &mut self.subscribers {
            subscriber(event);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<E> Default for Signal<E> {
    fn default() -> Self {
        Self::new()
    }
}

// Subscribers are bound to the entity that registered them, so a cloned entity
// (e.g. a replica snapshot) starts with none.
impl<E> Clone for Signal<E> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Signal<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn emit_without_subscribers_is_a_no_op() {
        let mut signal = Signal::<u32>::new();
        signal.emit(&7);
        assert_eq!(signal.subscriber_count(), 0);
    }

    #[test]
    fn unsubscribed_observers_stop_receiving() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut signal = Signal::<u32>::new();

        let sink = Arc::clone(&seen);
        let id = signal.subscribe(move |value| sink.lock().unwrap().push(*value));
        signal.emit(&1);
        assert!(signal.unsubscribe(id));
        assert!(!signal.unsubscribe(id));
        signal.emit(&2);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn clones_start_without_subscribers() {
        let mut signal = Signal::<u32>::new();
        signal.subscribe(|_| {});
        assert_eq!(signal.clone().subscriber_count(), 0);
    }
}
