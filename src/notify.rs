//! Listener sets — multi-subscriber broadcast for engine and MIDI events.
//!
//! The same event (a voice hit, a position change) legitimately has several
//! independent consumers, so notifications go through a subscriber list
//! rather than a single reassignable callback slot.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Handle returned by [`Listeners::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<E> = Box<dyn Fn(&E) + Send>;

/// A set of subscribers for events of type `E`.
///
/// Subscribing and emitting may happen from different threads; callbacks run
/// on the emitting thread, in subscription order.
pub struct Listeners<E> {
    entries: Mutex<Vec<(ListenerId, Callback<E>)>>,
    next_id: AtomicU64,
}

impl<E> Listeners<E> {
    /// Create an empty listener set.
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register a callback. Returns an id for [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe(&self, callback: impl Fn(&E) + Send + 'static) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut entries = self.entries.lock().expect("listener set poisoned");
        entries.push((id, Box::new(callback)));
        id
    }

    /// Remove a previously registered callback. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        let mut entries = self.entries.lock().expect("listener set poisoned");
        entries.retain(|(entry_id, _)| *entry_id != id);
    }

    /// Deliver `event` to every current subscriber.
    pub fn emit(&self, event: &E) {
        let entries = self.entries.lock().expect("listener set poisoned");
        for (_, callback) in entries.iter() {
            callback(event);
        }
    }

    /// Number of active subscribers.
    pub fn len(&self) -> usize {
        self.entries.lock().expect("listener set poisoned").len()
    }

    /// Whether no subscribers are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[test]
    fn new_set_is_empty() {
        let listeners: Listeners<u32> = Listeners::new();
        assert!(listeners.is_empty());
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn subscribe_and_emit() {
        let listeners: Listeners<u32> = Listeners::new();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen2 = Arc::clone(&seen);
        listeners.subscribe(move |v| {
            seen2.fetch_add(*v as usize, Ordering::SeqCst);
        });

        listeners.emit(&3);
        listeners.emit(&4);
        assert_eq!(seen.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn multiple_subscribers_all_notified() {
        let listeners: Listeners<()> = Listeners::new();
        let count = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let count = Arc::clone(&count);
            listeners.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        listeners.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn unsubscribe_removes_only_that_listener() {
        let listeners: Listeners<()> = Listeners::new();
        let count = Arc::new(AtomicUsize::new(0));

        let count_a = Arc::clone(&count);
        let a = listeners.subscribe(move |_| {
            count_a.fetch_add(1, Ordering::SeqCst);
        });
        let count_b = Arc::clone(&count);
        let _b = listeners.subscribe(move |_| {
            count_b.fetch_add(10, Ordering::SeqCst);
        });

        listeners.unsubscribe(a);
        listeners.emit(&());
        assert_eq!(count.load(Ordering::SeqCst), 10);
        assert_eq!(listeners.len(), 1);
    }

    #[test]
    fn unsubscribe_unknown_id_is_ignored() {
        let listeners: Listeners<()> = Listeners::new();
        let id = listeners.subscribe(|_| {});
        listeners.unsubscribe(id);
        listeners.unsubscribe(id); // second removal is a no-op
        assert!(listeners.is_empty());
    }

    #[test]
    fn emit_with_no_subscribers_is_fine() {
        let listeners: Listeners<String> = Listeners::new();
        listeners.emit(&"nobody home".to_string());
    }
}
